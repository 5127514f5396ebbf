//! Npm command - update npm itself.
//!
//! npm is excluded from the bulk listing and updated by name through this
//! dedicated path.

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;

use crate::Cli;
use crate::ui::Output;

pub async fn npm(cli: &Cli, cwd: PathBuf) -> Result<()> {
    let output = Output::new();

    if cli.read_only {
        output.error("Read-only mode: refusing to update npm.");
        return Ok(());
    }

    let (mut engine, _registry) = super::build_engine(cli, cwd, Arc::new(output))?;
    engine.update_npm().await;

    Ok(())
}
