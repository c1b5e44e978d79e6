//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::chart::ChartConfig;
use crate::source::ClientConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub chart: ChartSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where pageload events are fetched from
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_path")]
    pub path: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_path() -> String {
    "/pageloads".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            path: default_path(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl SourceConfig {
    /// Settings for the HTTP client
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url.clone(),
            path: self.path.clone(),
            request_timeout_ms: self.request_timeout_secs.saturating_mul(1000),
        }
    }
}

/// Chart appearance
#[derive(Debug, Clone, Deserialize)]
pub struct ChartSettings {
    #[serde(default = "default_width")]
    pub width: usize,

    #[serde(default = "default_bar_char")]
    pub bar_char: char,
}

fn default_width() -> usize {
    50
}

fn default_bar_char() -> char {
    '#'
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            width: default_width(),
            bar_char: default_bar_char(),
        }
    }
}

impl ChartSettings {
    pub fn chart_config(&self) -> ChartConfig {
        ChartConfig {
            width: self.width,
            bar_char: self.bar_char,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        for path in default_config_paths() {
            if path.exists() {
                match Self::load_with_env(&path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::debug!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup (the environment in practice)
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("PAGELOADS_API_URL") {
            self.source.base_url = url;
        }
        if let Some(path) = lookup("PAGELOADS_PATH") {
            self.source.path = path;
        }
        if let Some(timeout) = lookup("PAGELOADS_TIMEOUT_SECS") {
            if let Ok(secs) = timeout.parse() {
                self.source.request_timeout_secs = secs;
            }
        }

        if let Some(level) = lookup("PAGELOADS_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("PAGELOADS_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Config files tried, in order, when none is given explicitly
pub fn default_config_paths() -> Vec<PathBuf> {
    [
        dirs::config_dir().map(|p| p.join("pageloads").join("config.toml")),
        Some(PathBuf::from("/etc/pageloads/config.toml")),
        Some(PathBuf::from("./config.toml")),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r##"# Pageloads Configuration
#
# Environment variables override these settings:
# - PAGELOADS_API_URL
# - PAGELOADS_PATH
# - PAGELOADS_TIMEOUT_SECS
# - PAGELOADS_LOG_LEVEL
# - PAGELOADS_LOG_FORMAT

[source]
# Backend serving visitor events
base_url = "http://localhost:3000"

# Endpoint path; start_date and end_date are appended as query parameters
path = "/pageloads"

# Request timeout in seconds
request_timeout_secs = 30

[chart]
# Width of the longest bar, in characters
width = 50

# Character bars are drawn with
bar_char = "#"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"##
    .to_string()
}
