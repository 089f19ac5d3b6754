//! CLI command definitions and handlers

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::{style, Emoji};

use crate::config::Config;
use crate::download::{Downloader, ToolStatus};
use crate::runner::Runner;
use crate::sources;

static CHECK: Emoji = Emoji("✓ ", "* ");
static INFO: Emoji = Emoji("ℹ ", "i ");

#[derive(Parser)]
#[command(name = "diagram-build")]
#[command(author, version, about = "Fetch PlantUML and render diagram sources")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Project root that relative paths resolve against (default: current directory)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Config file to use instead of the project/user lookup
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download PlantUML if needed and render every diagram (default)
    Build,

    /// Only make sure the PlantUML jar is present
    Fetch {
        /// Download again even if the jar already exists
        #[arg(short, long)]
        force: bool,
    },

    /// List the diagram sources that would be rendered
    List,

    /// Manage configuration
    Config {
        /// Configuration key
        key: Option<String>,

        /// Configuration value (omit to show current)
        value: Option<String>,
    },
}

/// Absolute project root, from `--root` or the working directory.
pub fn project_root(root: Option<&Path>) -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("Could not determine current directory")?;
    Ok(match root {
        Some(root) if root.is_absolute() => root.to_path_buf(),
        Some(root) => cwd.join(root),
        None => cwd,
    })
}

fn runner(root: &Path, config_path: Option<&Path>) -> Result<Runner> {
    let config = Config::load(root, config_path)?;
    let downloader = Downloader::new().context("Failed to create HTTP client")?;
    Ok(Runner::new(root, config, downloader))
}

/// Run the whole pipeline
pub async fn build(root: &Path, config_path: Option<&Path>) -> Result<()> {
    let runner = runner(root, config_path)?;
    let report = runner.run().await?;
    tracing::info!(
        "Build finished: tool {:?}, {} file(s) rendered",
        report.tool,
        report.rendered.len()
    );
    Ok(())
}

/// Ensure the jar is on disk
pub async fn fetch(root: &Path, config_path: Option<&Path>, force: bool) -> Result<()> {
    let runner = runner(root, config_path)?;
    runner.ensure_directories()?;

    match runner.ensure_tool(force).await? {
        ToolStatus::Present => println!("{} PlantUML is already present", CHECK),
        ToolStatus::Downloaded => println!("{} PlantUML downloaded", CHECK),
    }

    Ok(())
}

/// Print the source set
pub async fn list(root: &Path, config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(root, config_path)?;
    let input_dir = config.resolve(root, &config.input_dir);
    let output_dir = config.resolve(root, &config.output_dir);

    if !input_dir.exists() {
        println!(
            "{} Input directory {} does not exist yet",
            INFO,
            style(input_dir.display()).dim()
        );
        return Ok(());
    }

    let sources = sources::list_sources(&input_dir, &config.source_extension)?;
    if sources.is_empty() {
        println!("{} No diagram sources in {}", INFO, style(input_dir.display()).dim());
        return Ok(());
    }

    println!(
        "{}",
        style(format!("Diagram sources in {}:", input_dir.display())).bold()
    );
    for source in &sources {
        println!("  {}", style(source).cyan());
    }
    println!();
    println!("  Output: {}", style(output_dir.display()).dim());

    Ok(())
}

/// Manage configuration
pub async fn manage_config(
    root: &Path,
    config_path: Option<&Path>,
    key: Option<String>,
    value: Option<String>,
) -> Result<()> {
    let mut config = Config::load(root, config_path)?;

    match (key, value) {
        (None, _) => {
            // Show all config
            println!("{}", style("Configuration:").bold());
            println!();
            for key in Config::KEYS {
                println!("  {}: {}", key, style(config.get(key)?).cyan());
            }
        }
        (Some(key), None) => {
            // Show specific key
            let value = config.get(&key)?;
            println!("{}: {}", key, style(value).cyan());
        }
        (Some(key), Some(value)) => {
            // Set key
            config.set(&key, &value)?;
            let path = config_path
                .map(Path::to_path_buf)
                .unwrap_or_else(|| Config::project_path(root));
            config.save(&path)?;
            println!("{} Set {} = {}", CHECK, key, style(value).green());
        }
    }

    Ok(())
}
