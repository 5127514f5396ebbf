//! Update orchestration over the per-source row sets.
//!
//! The [`Engine`] owns both row collections. Presentation reads snapshots
//! through shared references and issues commands; all row mutation happens
//! inside engine methods, so there is no shared mutable aliasing across the
//! component boundary.

use std::path::PathBuf;
use std::sync::Arc;

use crate::exec::{ExecMode, LogSink};
use crate::manager::{PackageManager, UpdateOptions};
use crate::source::local::has_package_manifest;
use crate::types::{Mode, PackageRow, Source, Status, UpdateOutcome};

/// One source's rows plus its loading/error flags.
#[derive(Debug, Clone)]
pub struct SourceState {
    pub rows: Vec<PackageRow>,
    pub loading: bool,
    pub errors: Vec<String>,
}

impl SourceState {
    fn new() -> Self {
        Self {
            rows: Vec::new(),
            loading: true,
            errors: Vec::new(),
        }
    }
}

/// Owns row state and drives reads and update batches.
pub struct Engine {
    manager: Arc<dyn PackageManager>,
    cwd: PathBuf,
    mode: ExecMode,
    log: Arc<dyn LogSink>,
    pub global: SourceState,
    pub local: SourceState,
    local_available: bool,
    busy: bool,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("cwd", &self.cwd)
            .field("local_available", &self.local_available)
            .field("busy", &self.busy)
            .finish_non_exhaustive()
    }
}

impl Engine {
    pub fn new(
        manager: Arc<dyn PackageManager>,
        cwd: PathBuf,
        mode: ExecMode,
        log: Arc<dyn LogSink>,
    ) -> Self {
        Self {
            manager,
            cwd,
            mode,
            log,
            global: SourceState::new(),
            local: SourceState::new(),
            local_available: false,
            busy: false,
        }
    }

    pub fn busy(&self) -> bool {
        self.busy
    }

    pub fn local_available(&self) -> bool {
        self.local_available
    }

    pub fn cwd(&self) -> &std::path::Path {
        &self.cwd
    }

    pub fn source_state(&self, source: Source) -> &SourceState {
        match source {
            Source::Global => &self.global,
            Source::Local => &self.local,
        }
    }

    /// Rows for a view mode. `All` is the ordered concatenation, global rows
    /// first; it is never stored as its own set.
    pub fn rows(&self, mode: Mode) -> Vec<&PackageRow> {
        match mode {
            Mode::Global => self.global.rows.iter().collect(),
            Mode::Local => self.local.rows.iter().collect(),
            Mode::All => self
                .global
                .rows
                .iter()
                .chain(self.local.rows.iter())
                .collect(),
        }
    }

    /// Accumulated advisory errors for a view mode, global first.
    pub fn errors(&self, mode: Mode) -> Vec<&str> {
        match mode {
            Mode::Global => self.global.errors.iter().map(String::as_str).collect(),
            Mode::Local => self.local.errors.iter().map(String::as_str).collect(),
            Mode::All => self
                .global
                .errors
                .iter()
                .chain(self.local.errors.iter())
                .map(String::as_str)
                .collect(),
        }
    }

    /// Initial read of both sources.
    ///
    /// When the working directory has no manifest, the local set stays empty
    /// with a single explanatory error and later local refreshes are skipped.
    pub async fn refresh_all(&mut self) {
        self.local_available = has_package_manifest(&self.cwd).await;
        if !self.local_available {
            self.local = SourceState {
                rows: Vec::new(),
                loading: false,
                errors: vec![format!("No package.json found in {}", self.cwd.display())],
            };
        }

        self.refresh_source(Source::Global).await;
        self.refresh_source(Source::Local).await;
    }

    /// Full re-read of one source; the prior row set is replaced wholesale.
    pub async fn refresh_source(&mut self, source: Source) {
        if source == Source::Local && !self.local_available {
            return;
        }

        {
            let state = self.source_state_mut(source);
            state.loading = true;
            state.errors.clear();
        }

        let result = match source {
            Source::Global => self.manager.read_global().await,
            Source::Local => self.manager.read_local(&self.cwd).await,
        };

        let state = self.source_state_mut(source);
        state.rows = result.packages;
        state.errors = result.errors;
        state.loading = false;
    }

    /// Execute updates for the given `(source, name)` targets, strictly in
    /// order.
    ///
    /// Updates mutate shared package-manager state and must not race, so rows
    /// are processed one at a time. A failing row never aborts the batch.
    /// Every distinct source touched is re-read exactly once afterwards;
    /// in-flight row mutations are a progress signal, not the source of
    /// truth.
    pub async fn perform_updates(&mut self, targets: &[(Source, String)]) {
        if targets.is_empty() {
            return;
        }

        self.busy = true;
        self.log
            .append(&format!("Updating {} package(s)...", targets.len()));

        // Mark the whole batch up front so every pending row shows as queued
        // while earlier rows run.
        for (source, name) in targets {
            if let Some(row) = self.find_row_mut(*source, name) {
                row.status = Status::Queued;
                row.status_message = Some("Queued for update".to_string());
            }
        }

        let mut touched: Vec<Source> = Vec::new();
        for (source, name) in targets {
            if !touched.contains(source) {
                touched.push(*source);
            }

            let Some(row) = self.find_row_mut(*source, name) else {
                continue;
            };
            row.status = Status::Updating;
            row.status_message = Some("Installing latest release...".to_string());
            let snapshot = row.clone();

            let opts = UpdateOptions {
                cwd: self.cwd.clone(),
                mode: self.mode,
                log: Arc::clone(&self.log),
            };
            let outcome = match source {
                Source::Global => self.manager.update_global(name, &opts).await,
                Source::Local => self.manager.update_local(&snapshot, &opts).await,
            };

            self.apply_outcome(*source, name, outcome);
        }

        for source in touched {
            self.refresh_source(source).await;
        }
        self.busy = false;
    }

    /// The package-manager self-update path: npm is excluded from the bulk
    /// list and updated by name here.
    pub async fn update_npm(&mut self) {
        self.busy = true;
        self.log.append("Updating npm globally...");

        let opts = UpdateOptions {
            cwd: self.cwd.clone(),
            mode: self.mode,
            log: Arc::clone(&self.log),
        };
        let outcome = self.manager.update_global("npm", &opts).await;

        if outcome.success {
            self.log.append(&format!(
                "✓ npm updated to {}",
                outcome.version.as_deref().unwrap_or("latest")
            ));
        } else {
            self.log.append(&format!(
                "✗ npm update failed: {}",
                outcome.error.as_deref().unwrap_or("Unknown error")
            ));
        }

        self.refresh_source(Source::Global).await;
        self.busy = false;
    }

    /// Shutdown contract: a hard interrupt during a batch may leave rows in
    /// `Updating`; mark them failed so no row silently keeps a
    /// work-in-progress status.
    pub fn mark_interrupted(&mut self) {
        for state in [&mut self.global, &mut self.local] {
            for row in &mut state.rows {
                if row.status == Status::Updating {
                    row.status = Status::Error;
                }
            }
        }
    }

    /// Apply one update outcome to its row: the optimistic progress signal
    /// shown until the post-batch re-read reconciles with ground truth.
    fn apply_outcome(&mut self, source: Source, name: &str, outcome: UpdateOutcome) {
        if outcome.success {
            self.log.append(&format!(
                "✓ {name} updated to {}",
                outcome.version.as_deref().unwrap_or("latest")
            ));
            if let Some(row) = self.find_row_mut(source, name) {
                row.status = Status::Success;
                row.status_message = Some(match &outcome.version {
                    Some(version) => format!("Now at {version}"),
                    None => "Up to date".to_string(),
                });
                if let Some(version) = &outcome.version {
                    row.version = version.clone();
                    row.installed_version = Some(version.clone());
                }
                row.actionable = false;
                row.selected = false;
            }
        } else {
            let message = outcome.error.unwrap_or_else(|| "Unknown error".to_string());
            self.log.append(&format!("✗ {name} failed: {message}"));
            if let Some(row) = self.find_row_mut(source, name) {
                row.status = Status::Error;
                row.status_message = Some(message);
            }
        }
    }

    fn source_state_mut(&mut self, source: Source) -> &mut SourceState {
        match source {
            Source::Global => &mut self.global,
            Source::Local => &mut self.local,
        }
    }

    fn find_row_mut(&mut self, source: Source, name: &str) -> Option<&mut PackageRow> {
        self.source_state_mut(source)
            .rows
            .iter_mut()
            .find(|row| row.name == name)
    }
}
