//! packup - keep npm packages current
//!
//! Lists globally installed packages and project dependencies next to their
//! latest registry versions, and installs updates on request.
//!
//! The binary is a thin presentation layer: all reconciliation and update
//! orchestration lives in `packup-core`, reached through a shared
//! [`packup_core::Engine`].

pub mod cmd;
pub mod ui;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use packup_core::Mode;
use packup_core::source::local::has_package_manifest;

#[derive(Debug, Parser)]
#[command(name = "packup")]
#[command(author, version, about = "packup - keep npm packages current")]
pub struct Cli {
    /// Show global packages only
    #[arg(long, global = true, conflicts_with_all = ["local", "all"])]
    pub global: bool,

    /// Show project dependencies only
    #[arg(long, global = true, conflicts_with = "all")]
    pub local: bool,

    /// Show both sources
    #[arg(long, global = true)]
    pub all: bool,

    /// Project directory (defaults to the current directory)
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Refuse any command that would modify packages
    #[arg(long, global = true)]
    pub read_only: bool,

    /// Show what would happen without making changes
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List packages alongside their latest versions (default)
    List,
    /// Update packages to their latest versions
    Update {
        /// Specific packages to update (or every eligible one with --all)
        packages: Vec<String>,
        /// Update every eligible package
        #[arg(long, short = 'a', conflicts_with = "packages")]
        all: bool,
        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Update npm itself to the latest release
    Npm,
}

/// View mode from flags, defaulting to local when the project has a
/// manifest and global otherwise.
pub async fn resolve_mode(cli: &Cli, cwd: &std::path::Path) -> Mode {
    if cli.all {
        Mode::All
    } else if cli.global {
        Mode::Global
    } else if cli.local {
        Mode::Local
    } else if has_package_manifest(cwd).await {
        Mode::Local
    } else {
        Mode::Global
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("packup").chain(args.iter().copied()))
    }

    #[tokio::test]
    async fn mode_defaults_follow_the_manifest() {
        let project = tempfile::tempdir().unwrap();
        std::fs::write(project.path().join("package.json"), "{}").unwrap();
        let bare = tempfile::tempdir().unwrap();

        assert_eq!(resolve_mode(&cli(&[]), project.path()).await, Mode::Local);
        assert_eq!(resolve_mode(&cli(&[]), bare.path()).await, Mode::Global);
    }

    #[tokio::test]
    async fn explicit_flags_override_the_default() {
        let project = tempfile::tempdir().unwrap();
        std::fs::write(project.path().join("package.json"), "{}").unwrap();

        assert_eq!(
            resolve_mode(&cli(&["--global"]), project.path()).await,
            Mode::Global
        );
        assert_eq!(resolve_mode(&cli(&["--all"]), project.path()).await, Mode::All);
    }
}
