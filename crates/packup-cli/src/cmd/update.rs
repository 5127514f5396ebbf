//! Update command - install the latest release of selected packages.

use anyhow::Result;
use crossterm::style::Stylize;
use std::path::PathBuf;
use std::sync::Arc;

use packup_core::{Mode, PackageRow, Source};

use crate::Cli;
use crate::ui::Output;

pub async fn update(
    cli: &Cli,
    cwd: PathBuf,
    mode: Mode,
    packages: &[String],
    all: bool,
    skip_confirm: bool,
) -> Result<()> {
    let output = Output::new();

    if cli.read_only {
        output.error("Read-only mode: refusing to update packages.");
        return Ok(());
    }
    if packages.is_empty() && !all {
        output.error("Specify package names, or --all for every eligible package.");
        return Ok(());
    }

    let (mut engine, _registry) = super::build_engine(cli, cwd, Arc::new(output))?;
    engine.refresh_all().await;

    for error in engine.errors(mode) {
        output.warning(error);
    }

    let targets = select_targets(engine.rows(mode), packages, all, &output);
    if targets.is_empty() {
        output.success("All packages are up to date.");
        return Ok(());
    }

    println!();
    for (_, name, current, latest) in &targets {
        let name_col = format!("{:<28}", name);
        println!(
            "  {} {}  ->  {}",
            name_col.cyan(),
            current.as_str().dark_grey(),
            latest.as_str().green()
        );
    }
    println!();

    if !skip_confirm && !cli.dry_run && !confirm("Proceed with update? (Y/n): ")? {
        output.info("Update cancelled.");
        return Ok(());
    }

    let batch: Vec<(Source, String)> = targets
        .iter()
        .map(|(source, name, _, _)| (*source, name.clone()))
        .collect();
    engine.perform_updates(&batch).await;

    Ok(())
}

/// Resolve the plan: `(source, name, current, latest)` per row to update.
fn select_targets(
    rows: Vec<&PackageRow>,
    packages: &[String],
    all: bool,
    output: &Output,
) -> Vec<(Source, String, String, String)> {
    let plan_entry = |row: &PackageRow| {
        (
            row.source,
            row.name.clone(),
            row.version.clone(),
            row.latest.clone().unwrap_or_else(|| "latest".to_string()),
        )
    };

    if all {
        return rows
            .iter()
            .filter(|row| row.actionable)
            .map(|row| plan_entry(row))
            .collect();
    }

    let mut targets = Vec::new();
    for name in packages {
        match rows.iter().find(|row| &row.name == name) {
            Some(row) if row.actionable => targets.push(plan_entry(row)),
            Some(row) => output.info(&format!("{} is already up to date.", row.name)),
            None => output.warning(&format!("{name} is not listed in this view.")),
        }
    }
    targets
}

fn confirm(prompt: &str) -> Result<bool> {
    use std::io::{self, Write};

    print!("{prompt}");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let response = input.trim().to_lowercase();
    Ok(response.is_empty() || response == "y" || response == "yes")
}
