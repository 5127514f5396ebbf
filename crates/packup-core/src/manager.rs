//! The package-manager seam.
//!
//! [`PackageManager`] is the boundary between orchestration and the actual
//! npm CLI + registry. The orchestrator only ever talks through this trait,
//! which keeps batch semantics testable on machines without npm.

use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::exec::{ExecMode, LogSink};
use crate::registry::RegistryCache;
use crate::source::{global, local};
use crate::types::{PackageListResult, PackageRow, UpdateOutcome};

/// Options threaded through a single update command.
#[derive(Clone)]
pub struct UpdateOptions {
    pub cwd: PathBuf,
    pub mode: ExecMode,
    pub log: Arc<dyn LogSink>,
}

impl fmt::Debug for UpdateOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateOptions")
            .field("cwd", &self.cwd)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

/// Read and update packages for both sources.
#[async_trait]
pub trait PackageManager: Send + Sync {
    /// Enumerate globally installed packages, hydrated.
    async fn read_global(&self) -> PackageListResult;

    /// Enumerate a project's manifest-declared dependencies, hydrated.
    async fn read_local(&self, root: &std::path::Path) -> PackageListResult;

    /// Install the latest release of a global package.
    async fn update_global(&self, name: &str, opts: &UpdateOptions) -> UpdateOutcome;

    /// Install the latest release of a local dependency.
    async fn update_local(&self, row: &PackageRow, opts: &UpdateOptions) -> UpdateOutcome;
}

/// Production [`PackageManager`] over the npm CLI and registry cache.
#[derive(Debug)]
pub struct NpmManager {
    registry: Arc<RegistryCache>,
}

impl NpmManager {
    pub fn new(registry: Arc<RegistryCache>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &RegistryCache {
        &self.registry
    }
}

#[async_trait]
impl PackageManager for NpmManager {
    async fn read_global(&self) -> PackageListResult {
        global::read_global_packages(&self.registry).await
    }

    async fn read_local(&self, root: &std::path::Path) -> PackageListResult {
        local::read_local_packages(root, &self.registry).await
    }

    async fn update_global(&self, name: &str, opts: &UpdateOptions) -> UpdateOutcome {
        global::update_global_package(name, &self.registry, opts).await
    }

    async fn update_local(&self, row: &PackageRow, opts: &UpdateOptions) -> UpdateOutcome {
        local::update_local_package(row, &self.registry, opts).await
    }
}
