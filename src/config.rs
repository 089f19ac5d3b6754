//! Configuration management

use std::path::{Path, PathBuf};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

/// Name of the per-project config file, looked up in the project root.
pub const PROJECT_CONFIG_FILE: &str = "diagram-build.json";

pub const DEFAULT_PLANTUML_VERSION: &str = "1.2026.1";

const DEFAULT_DOWNLOAD_URL: &str =
    "https://github.com/plantuml/plantuml/releases/download/v{version}/plantuml-{version}.jar";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// PlantUML release to fetch
    pub plantuml_version: String,
    /// Download URL; `{version}` is replaced with `plantuml_version`
    pub download_url: String,
    pub tools_dir: PathBuf,
    /// Where the jar lives once downloaded
    pub tool_path: PathBuf,
    /// Directory scanned for diagram sources
    pub input_dir: PathBuf,
    /// Directory receiving rendered images
    pub output_dir: PathBuf,
    pub source_extension: String,
    /// Passed to PlantUML as `-t<format>`
    pub output_format: String,
    /// Java launcher used to run the jar
    pub java: String,
    /// Optional SHA-256 of the jar (hex or `sha256-<base64>`); unchecked when unset
    pub expected_sha256: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            plantuml_version: DEFAULT_PLANTUML_VERSION.to_string(),
            download_url: DEFAULT_DOWNLOAD_URL.to_string(),
            tools_dir: PathBuf::from("tools"),
            tool_path: PathBuf::from("tools").join("plantuml.jar"),
            input_dir: PathBuf::from("diagrams").join("src"),
            output_dir: PathBuf::from("src").join("assets"),
            source_extension: ".puml".to_string(),
            output_format: "svg".to_string(),
            java: "java".to_string(),
            expected_sha256: None,
        }
    }
}

impl Config {
    /// Load configuration for the project at `root`.
    ///
    /// An explicit path must exist. Otherwise the project file is tried, then
    /// the user-level file, then built-in defaults.
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        let project = Self::project_path(root);
        if project.exists() {
            return Self::load_from(&project);
        }

        if let Some(user) = Self::user_path() {
            if user.exists() {
                return Self::load_from(&user);
            }
        }

        tracing::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;

        Ok(())
    }

    pub const KEYS: &'static [&'static str] = &[
        "plantuml_version",
        "download_url",
        "tools_dir",
        "tool_path",
        "input_dir",
        "output_dir",
        "source_extension",
        "output_format",
        "java",
        "expected_sha256",
    ];

    pub fn get(&self, key: &str) -> Result<String> {
        match key {
            "plantuml_version" => Ok(self.plantuml_version.clone()),
            "download_url" => Ok(self.download_url.clone()),
            "tools_dir" => Ok(self.tools_dir.display().to_string()),
            "tool_path" => Ok(self.tool_path.display().to_string()),
            "input_dir" => Ok(self.input_dir.display().to_string()),
            "output_dir" => Ok(self.output_dir.display().to_string()),
            "source_extension" => Ok(self.source_extension.clone()),
            "output_format" => Ok(self.output_format.clone()),
            "java" => Ok(self.java.clone()),
            "expected_sha256" => Ok(self.expected_sha256.clone().unwrap_or_else(|| "none".into())),
            _ => bail!("Unknown config key: {}", key),
        }
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "plantuml_version" => self.plantuml_version = value.to_string(),
            "download_url" => self.download_url = value.to_string(),
            "tools_dir" => self.tools_dir = PathBuf::from(value),
            "tool_path" => self.tool_path = PathBuf::from(value),
            "input_dir" => self.input_dir = PathBuf::from(value),
            "output_dir" => self.output_dir = PathBuf::from(value),
            "source_extension" => self.source_extension = value.to_string(),
            "output_format" => self.output_format = value.to_string(),
            "java" => self.java = value.to_string(),
            "expected_sha256" => {
                self.expected_sha256 = match value {
                    "" | "none" => None,
                    v => Some(v.to_string()),
                }
            }
            _ => bail!("Unknown config key: {}", key),
        }
        Ok(())
    }

    /// The download URL with the version substituted in.
    pub fn resolved_url(&self) -> String {
        self.download_url.replace("{version}", &self.plantuml_version)
    }

    /// Resolve a configured path against the project root.
    pub fn resolve(&self, root: &Path, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            root.join(path)
        }
    }

    pub fn project_path(root: &Path) -> PathBuf {
        root.join(PROJECT_CONFIG_FILE)
    }

    fn user_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("diagram-build").join("config.json"))
    }
}
