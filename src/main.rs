//! diagram-build - render PlantUML diagrams
//!
//! Downloads the PlantUML jar into the project on first use, then renders
//! every diagram source in the input directory into the output directory,
//! one file at a time, stopping at the first failure.

mod cli;
mod config;
mod download;
mod error;
mod render;
mod runner;
mod sources;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = cli::project_root(cli.root.as_deref())?;
    let config_path = cli.config.as_deref();

    match cli.command.unwrap_or(Commands::Build) {
        Commands::Build => {
            cli::build(&root, config_path).await?;
        }
        Commands::Fetch { force } => {
            cli::fetch(&root, config_path, force).await?;
        }
        Commands::List => {
            cli::list(&root, config_path).await?;
        }
        Commands::Config { key, value } => {
            cli::manage_config(&root, config_path, key, value).await?;
        }
    }

    Ok(())
}
