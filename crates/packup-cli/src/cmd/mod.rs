//! One module per subcommand, plus the shared engine wiring.

pub mod list;
pub mod npm;
pub mod update;

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

use packup_core::registry::NPM_REGISTRY_URL;
use packup_core::{Engine, ExecMode, LogSink, NpmManager, RegistryCache};

use crate::Cli;

/// Wire a registry cache, npm manager, and engine for one invocation.
pub(crate) fn build_engine(
    cli: &Cli,
    cwd: PathBuf,
    log: Arc<dyn LogSink>,
) -> Result<(Engine, Arc<RegistryCache>)> {
    let client = reqwest::Client::builder()
        .tcp_nodelay(true)
        .build()
        .context("Failed to build HTTP client")?;
    let registry = Arc::new(RegistryCache::new(client, NPM_REGISTRY_URL));
    let manager = Arc::new(NpmManager::new(Arc::clone(&registry)));

    let mode = if cli.dry_run {
        ExecMode::DryRun
    } else {
        ExecMode::Execute
    };

    Ok((Engine::new(manager, cwd, mode, log), registry))
}
