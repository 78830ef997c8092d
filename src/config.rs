// Global configuration management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::engine::{
    BatchOptions, DEFAULT_AUDIO_EXTENSIONS, DEFAULT_OUTPUT_SUFFIX, DEFAULT_SUBTITLE_EXTENSIONS,
    DEFAULT_TOOL_NAME, DEFAULT_VIDEO_EXTENSION, ToolLocator, TrackResolver,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tool: ToolConfig,

    #[serde(default)]
    pub matching: MatchingConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Merging tool to look for on PATH and in install directories
    #[serde(default = "default_tool_name")]
    pub name: String,

    /// Explicit path to the merging tool, checked before anything else
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Extension of the source videos (a single extension)
    #[serde(default = "default_video_extension")]
    pub video_extension: String,

    /// Audio extensions in match priority order
    #[serde(default = "default_audio_extensions")]
    pub audio_extensions: Vec<String>,

    /// Subtitle extensions in match priority order
    #[serde(default = "default_subtitle_extensions")]
    pub subtitle_extensions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Appended to the base name: `<base><suffix>.mkv`
    #[serde(default = "default_output_suffix")]
    pub suffix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default tracing filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,
}

fn default_tool_name() -> String {
    DEFAULT_TOOL_NAME.to_string()
}

fn default_video_extension() -> String {
    DEFAULT_VIDEO_EXTENSION.to_string()
}

fn default_audio_extensions() -> Vec<String> {
    DEFAULT_AUDIO_EXTENSIONS.iter().map(|s| s.to_string()).collect()
}

fn default_subtitle_extensions() -> Vec<String> {
    DEFAULT_SUBTITLE_EXTENSIONS.iter().map(|s| s.to_string()).collect()
}

fn default_output_suffix() -> String {
    DEFAULT_OUTPUT_SUFFIX.to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            name: default_tool_name(),
            path: None,
        }
    }
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            video_extension: default_video_extension(),
            audio_extensions: default_audio_extensions(),
            subtitle_extensions: default_subtitle_extensions(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            suffix: default_output_suffix(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "macos") {
            dirs::home_dir()
                .context("Could not determine home directory")?
                .join(".config")
                .join("trackmux")
        } else {
            dirs::config_dir()
                .context("Could not determine config directory")?
                .join("trackmux")
        };

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from disk, falling back to defaults if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Config::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Save config to disk
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Check if config file exists
    pub fn exists() -> bool {
        Self::config_path().map(|p| p.exists()).unwrap_or(false)
    }

    /// Matching and naming rules for the batch runner
    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            video_extension: self.matching.video_extension.clone(),
            output_suffix: self.output.suffix.clone(),
            resolver: TrackResolver::new(
                self.matching.audio_extensions.clone(),
                self.matching.subtitle_extensions.clone(),
            ),
        }
    }

    pub fn tool_locator(&self) -> ToolLocator {
        ToolLocator::system(self.tool.name.clone(), self.tool.path.clone())
    }
}
