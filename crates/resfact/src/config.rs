//! Configuration loading and types

use std::path::{Path, PathBuf};
use std::time::Duration;

use resfact_inventory::{DEFAULT_ALLOW_LIST_PATH, ProviderSettings};
use serde::{Deserialize, Serialize};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "RESFACT_CONFIG";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Collection settings
    #[serde(default)]
    pub collector: CollectorConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Built-in provider settings
    #[serde(default)]
    pub providers: ProvidersConfig,
}

/// Collection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Allow-list file written by the managing process
    #[serde(default = "default_allow_list")]
    pub allow_list: PathBuf,
    /// Name the inventory is published under
    #[serde(default = "default_fact_name")]
    pub fact_name: String,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            allow_list: default_allow_list(),
            fact_name: default_fact_name(),
        }
    }
}

fn default_allow_list() -> PathBuf {
    PathBuf::from(DEFAULT_ALLOW_LIST_PATH)
}

fn default_fact_name() -> String {
    "resources".to_string()
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` wins
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Built-in provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// Root directory system files are read from
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// Timeout for each external command, in seconds
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            command_timeout_secs: default_command_timeout(),
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from("/")
}

fn default_command_timeout() -> u64 {
    30
}

impl ProvidersConfig {
    /// Settings for [`resfact_inventory::system_catalog`]
    #[must_use]
    pub fn settings(&self) -> ProviderSettings {
        ProviderSettings {
            root: self.root.clone(),
            command_timeout: Duration::from_secs(self.command_timeout_secs),
        }
    }
}

impl Config {
    /// Load configuration from file
    ///
    /// # Errors
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> eyre::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| eyre::eyre!("reading {}: {e}", path.display()))?;
        Self::parse(&content).map_err(|e| eyre::eyre!("parsing {}: {e}", path.display()))
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    /// Returns error if the text is not valid configuration
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Find the config file to use, if any
    ///
    /// `RESFACT_CONFIG` first, then `resfact.toml`, `/etc/resfact/resfact.toml`
    /// and the user config directory.
    #[must_use]
    pub fn locate() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }

        let mut paths = vec![
            PathBuf::from("resfact.toml"),
            PathBuf::from("/etc/resfact/resfact.toml"),
        ];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("resfact/resfact.toml"));
        }

        paths.into_iter().find(|p| p.exists())
    }
}
