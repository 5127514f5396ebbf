//! Row data model shared by the readers, orchestrator, and presentation layer.

use crate::version::normalize;

/// Which install tree a row was observed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    /// System-wide installs (`npm ls -g`).
    Global,
    /// Project-manifest-declared dependencies.
    Local,
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Global => write!(f, "global"),
            Self::Local => write!(f, "local"),
        }
    }
}

/// View selector over the two row sets. `All` is the ordered concatenation
/// (global rows first) and is never stored as its own set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Global,
    Local,
    All,
}

/// Per-row lifecycle during an update batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Idle,
    Queued,
    Updating,
    Success,
    Error,
}

/// One observed package in one source.
///
/// Identity is the `(source, name)` pair, unique within a source's row set.
/// Rows are mutated field-by-field during hydration and orchestration, and
/// replaced wholesale on the next full re-read of their source.
#[derive(Debug, Clone)]
pub struct PackageRow {
    pub name: String,
    pub source: Source,
    /// Installed-or-lock-derived version, or the `"missing"` sentinel.
    pub version: String,
    /// Latest published version; `Some("?")` after a failed lookup.
    pub latest: Option<String>,
    /// Version actually found under the dependency tree, if any.
    pub installed_version: Option<String>,
    /// Manifest-declared range spec (local rows).
    pub requested_version: Option<String>,
    /// Dev dependency (local rows; AND across the groups the name appears in).
    pub dev: bool,
    /// Local-only: not found under `node_modules`.
    pub missing: bool,
    /// An update action is currently meaningful for this row.
    pub actionable: bool,
    pub selected: bool,
    pub status: Status,
    pub status_message: Option<String>,
}

impl PackageRow {
    /// A fresh row with derived/lifecycle fields at their defaults.
    pub fn new(name: impl Into<String>, source: Source, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source,
            version: version.into(),
            latest: None,
            installed_version: None,
            requested_version: None,
            dev: false,
            missing: false,
            actionable: false,
            selected: false,
            status: Status::Idle,
            status_message: None,
        }
    }

    /// Recompute `actionable` from the source-specific eligibility rule.
    ///
    /// Must be called after any mutation of `latest`, `installed_version`, or
    /// `missing` so the flag is never stale.
    pub fn recompute_actionable(&mut self) {
        self.actionable = match self.source {
            Source::Global => self
                .latest
                .as_deref()
                .is_some_and(|latest| normalize(latest) != normalize(&self.version)),
            Source::Local => {
                self.missing
                    || match (self.installed_version.as_deref(), self.latest.as_deref()) {
                        (Some(installed), Some(latest)) => {
                            normalize(installed) != normalize(latest)
                        }
                        _ => false,
                    }
            }
        };
    }
}

/// Result of one full source read: the replacement row set plus accumulated
/// non-fatal error lines.
#[derive(Debug, Clone, Default)]
pub struct PackageListResult {
    pub packages: Vec<PackageRow>,
    pub errors: Vec<String>,
}

impl PackageListResult {
    /// A fatal read: empty row set, one explanatory message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            packages: Vec::new(),
            errors: vec![message.into()],
        }
    }
}

/// Outcome of a single package update command.
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    pub name: String,
    pub success: bool,
    /// Version detected from command output or the registry, when known.
    pub version: Option<String>,
    pub error: Option<String>,
}

impl UpdateOutcome {
    pub fn success(name: impl Into<String>, version: Option<String>) -> Self {
        Self {
            name: name.into(),
            success: true,
            version,
            error: None,
        }
    }

    pub fn failure(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            success: false,
            version: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_actionable_follows_latest() {
        let mut row = PackageRow::new("eslint", Source::Global, "8.0.0");
        row.recompute_actionable();
        assert!(!row.actionable, "no latest known yet");

        row.latest = Some("9.1.0".to_string());
        row.recompute_actionable();
        assert!(row.actionable);

        row.latest = Some("v8.0.0".to_string());
        row.recompute_actionable();
        assert!(!row.actionable, "normalized equality is not actionable");
    }

    #[test]
    fn global_lookup_failure_sentinel_is_actionable() {
        let mut row = PackageRow::new("eslint", Source::Global, "8.0.0");
        row.latest = Some("?".to_string());
        row.recompute_actionable();
        assert!(row.actionable);
    }

    #[test]
    fn local_missing_row_is_always_actionable() {
        let mut row = PackageRow::new("left-pad", Source::Local, "missing");
        row.missing = true;
        row.recompute_actionable();
        assert!(row.actionable);
    }

    #[test]
    fn local_needs_both_installed_and_latest() {
        let mut row = PackageRow::new("react", Source::Local, "18.2.0");
        row.latest = Some("18.3.0".to_string());
        row.recompute_actionable();
        assert!(!row.actionable, "no installed version probed");

        row.installed_version = Some("18.2.0".to_string());
        row.recompute_actionable();
        assert!(row.actionable);

        row.installed_version = Some("18.3.0".to_string());
        row.recompute_actionable();
        assert!(!row.actionable);
    }
}
