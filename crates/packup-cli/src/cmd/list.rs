//! List command - packages next to their latest registry versions.

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;

use packup_core::table::count_updatable;
use packup_core::versions::get_versions;
use packup_core::{Mode, NullSink};

use crate::Cli;
use crate::ui::{Output, table};

pub async fn list(cli: &Cli, cwd: PathBuf, mode: Mode) -> Result<()> {
    let output = Output::new();
    let (mut engine, registry) = super::build_engine(cli, cwd, Arc::new(NullSink))?;

    let versions = get_versions(&registry).await;
    let node_lts = versions.node_lts.as_deref().unwrap_or("?");
    let npm_lts = versions.npm_lts.as_deref().unwrap_or("?");
    output.info(&format!(
        "node {} (LTS {node_lts})   npm {} (latest {npm_lts})",
        versions.node_current, versions.npm_current
    ));

    engine.refresh_all().await;

    for error in engine.errors(mode) {
        output.warning(error);
    }

    let rows = engine.rows(mode);
    if rows.is_empty() {
        println!();
        output.info("No packages found.");
        return Ok(());
    }

    let show_source = mode == Mode::All;
    table::print_header(show_source);
    for row in &rows {
        table::print_row(row, show_source);
    }

    table::print_counts(&count_updatable(rows.iter().copied()));

    Ok(())
}
