//! packup - keep npm packages current

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use packup_cli::{Cli, Commands, cmd, resolve_mode};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut cli = Cli::parse();

    let cwd = match &cli.cwd {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };
    let mode = resolve_mode(&cli, &cwd).await;

    match cli.command.take() {
        None | Some(Commands::List) => cmd::list::list(&cli, cwd, mode).await,
        Some(Commands::Update { packages, all, yes }) => {
            cmd::update::update(&cli, cwd, mode, &packages, all, yes).await
        }
        Some(Commands::Npm) => cmd::npm::npm(&cli, cwd).await,
    }
}
