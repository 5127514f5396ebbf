//! Column-aligned package listing.

use crossterm::style::Stylize;
use packup_core::PackageRow;
use packup_core::table::UpdateCounts;

const NAME_WIDTH: usize = 28;
const VERSION_WIDTH: usize = 12;

/// Print column headers for `packup list`.
pub fn print_header(show_source: bool) {
    println!();
    let source_col = if show_source {
        format!("{:<8} ", "source")
    } else {
        String::new()
    };
    let header = format!(
        "  {:<nw$} {source_col}{:<vw$} {:<vw$} {}",
        "name",
        "current",
        "latest",
        "status",
        nw = NAME_WIDTH,
        vw = VERSION_WIDTH,
    );
    println!("{}", header.dark_grey());
}

/// Print one package row.
pub fn print_row(row: &PackageRow, show_source: bool) {
    let name = if row.dev {
        format!("{} (dev)", row.name)
    } else {
        row.name.clone()
    };
    let name_part = format!("{:<width$}", name, width = NAME_WIDTH);

    let source_part = if show_source {
        format!("{:<8} ", row.source.to_string()).dark_grey().to_string()
    } else {
        String::new()
    };

    let current = format!("{:<width$}", row.version, width = VERSION_WIDTH);
    let current_part = if row.missing {
        current.red().to_string()
    } else {
        current.dark_grey().to_string()
    };

    let latest = row.latest.as_deref().unwrap_or("");
    let latest_col = format!("{:<width$}", latest, width = VERSION_WIDTH);
    let latest_part = if latest == "?" {
        latest_col.yellow().to_string()
    } else if row.actionable {
        latest_col.green().to_string()
    } else {
        latest_col.dark_grey().to_string()
    };

    println!(
        "  {} {source_part}{current_part} {latest_part} {}",
        name_part.cyan(),
        status_text(row).dark_grey()
    );
}

/// Print the summary line under the table.
pub fn print_counts(counts: &UpdateCounts) {
    println!();
    let summary = format!(
        "  {} package(s), {} with updates available",
        counts.total, counts.selectable
    );
    println!("{}", summary.dark_grey());
}

fn status_text(row: &PackageRow) -> String {
    if let Some(message) = &row.status_message {
        return message.clone();
    }
    if row.missing {
        return "not installed".to_string();
    }
    match row.latest.as_deref() {
        Some("?") => "lookup failed".to_string(),
        Some(_) if row.actionable => "update available".to_string(),
        Some(_) => "up to date".to_string(),
        None => String::new(),
    }
}
