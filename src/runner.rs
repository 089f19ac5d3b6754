//! The build pipeline: directories, tool, sources, render

use std::path::{Path, PathBuf};

use console::{style, Emoji};
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::Config;
use crate::download::{Downloader, ToolStatus};
use crate::error::{BuildError, Result};
use crate::render::Renderer;
use crate::sources;

static CHECK: Emoji = Emoji("✓ ", "* ");
static ARROW: Emoji = Emoji("→ ", "-> ");
static INFO: Emoji = Emoji("ℹ ", "i ");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub tool: ToolStatus,
    pub rendered: Vec<String>,
}

pub struct Runner {
    config: Config,
    downloader: Downloader,
    tools_dir: PathBuf,
    tool_path: PathBuf,
    input_dir: PathBuf,
    output_dir: PathBuf,
}

impl Runner {
    /// `root` must be absolute: the jar path is handed to a child running elsewhere.
    pub fn new(root: &Path, config: Config, downloader: Downloader) -> Self {
        Self {
            tools_dir: config.resolve(root, &config.tools_dir),
            tool_path: config.resolve(root, &config.tool_path),
            input_dir: config.resolve(root, &config.input_dir),
            output_dir: config.resolve(root, &config.output_dir),
            config,
            downloader,
        }
    }

    /// Tools, output and input directories, created if missing.
    pub fn ensure_directories(&self) -> Result<()> {
        let mut dirs = vec![self.tools_dir.as_path()];
        // A tool_path outside tools_dir still needs its parent
        if let Some(parent) = self.tool_path.parent() {
            if parent != self.tools_dir {
                dirs.push(parent);
            }
        }
        dirs.push(&self.output_dir);
        dirs.push(&self.input_dir);
        ensure_directories(&dirs)
    }

    pub async fn ensure_tool(&self, force: bool) -> Result<ToolStatus> {
        if self.tool_path.exists() && !force {
            return Ok(ToolStatus::Present);
        }

        println!(
            "{} Downloading PlantUML {}...",
            ARROW,
            style(&self.config.plantuml_version).cyan()
        );

        let mut pb: Option<ProgressBar> = None;
        let status = self
            .downloader
            .ensure(
                &self.config.resolved_url(),
                &self.tool_path,
                self.config.expected_sha256.as_deref(),
                force,
                |done, total| {
                    if let Some(total) = total {
                        pb.get_or_insert_with(|| {
                            ProgressBar::new(total).with_style(download_style())
                        })
                        .set_position(done);
                    }
                },
            )
            .await;
        if let Some(pb) = pb {
            pb.finish_and_clear();
        }

        let status = status?;
        println!("{} Saved {}", CHECK, style(self.tool_path.display()).dim());
        Ok(status)
    }

    pub fn list_sources(&self) -> Result<Vec<String>> {
        sources::list_sources(&self.input_dir, &self.config.source_extension)
    }

    pub fn render_all(&self, sources: &[String]) -> Result<Vec<String>> {
        let renderer = Renderer::new(
            &self.config.java,
            &self.tool_path,
            &self.config.output_format,
            &self.input_dir,
            &self.output_dir,
        );
        let format = self.config.output_format.to_uppercase();

        renderer.render_all(sources, |source| {
            println!("{} Generating {} for {}...", ARROW, format, style(source).cyan());
        })
    }

    /// Full pipeline. Aborts at the first error; an empty source set is success.
    pub async fn run(&self) -> Result<BuildReport> {
        self.ensure_directories()?;
        let tool = self.ensure_tool(false).await?;

        let sources = self.list_sources()?;
        if sources.is_empty() {
            println!(
                "{} No {} files found in {}",
                INFO,
                self.config.source_extension,
                style(self.input_dir.display()).dim()
            );
            return Ok(BuildReport {
                tool,
                rendered: Vec::new(),
            });
        }

        let rendered = self.render_all(&sources)?;

        println!(
            "{} Done. {}s are in {}",
            CHECK,
            self.config.output_format.to_uppercase(),
            style(self.output_dir.display()).green()
        );

        Ok(BuildReport { tool, rendered })
    }
}

/// Create each directory and its ancestors. Existing directories are fine.
pub fn ensure_directories<P: AsRef<Path>>(dirs: &[P]) -> Result<()> {
    for dir in dirs {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|e| BuildError::io(dir, e))?;
        tracing::debug!("Ensured directory {}", dir.display());
    }
    Ok(())
}

fn download_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template(concat!(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] ",
            "{bytes}/{total_bytes} ({eta})"
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓░")
}
