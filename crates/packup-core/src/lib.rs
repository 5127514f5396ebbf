//! packup-core - package-state reconciliation and update orchestration
//!
//! Reconciles installed npm packages (global install tree and local
//! `package.json` projects) against the registry and drives serial update
//! batches with per-row status tracking.
//!
//! # Architecture
//!
//! - **Source Readers** (`source::global`, `source::local`) enumerate
//!   installed packages per source and hydrate `latest` fields through the
//!   deduplicating [`registry::RegistryCache`] at a bounded fan-out.
//! - **Update Orchestrator** ([`engine::Engine`]) owns the row sets, executes
//!   updates strictly in order, and re-reads touched sources after a batch.
//! - **Seams**: [`manager::PackageManager`] isolates the npm CLI/registry so
//!   orchestration is testable without a package manager on the machine;
//!   [`exec::LogSink`] isolates progress reporting from any rendering layer.

pub mod concurrency;
pub mod engine;
pub mod exec;
pub mod manager;
pub mod registry;
pub mod source;
pub mod table;
pub mod types;
pub mod version;
pub mod versions;

pub use engine::{Engine, SourceState};
pub use exec::{ExecMode, ExecResult, LogSink, NullSink};
pub use manager::{NpmManager, PackageManager, UpdateOptions};
pub use registry::RegistryCache;
pub use types::{Mode, PackageListResult, PackageRow, Source, Status, UpdateOutcome};

/// User Agent string for registry requests
pub const USER_AGENT: &str = concat!("packup-core/", env!("CARGO_PKG_VERSION"));
