//! CLI configuration.

use anyhow::{Result, bail};
use serde::Deserialize;
use splitpaste_core::SessionManagerConfig;
use splitpaste_types::{DelimiterSpec, Placement};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    #[serde(default = "default_marker")]
    pub marker: String,
    #[serde(default)]
    pub placement: Placement,
    #[serde(default = "default_saved_markers")]
    pub saved_markers: Vec<String>,
    #[serde(default = "default_clipboard_interval_ms")]
    pub clipboard_interval_ms: u64,
    #[serde(default = "default_folder_check_interval_ms")]
    pub folder_check_interval_ms: u64,
    #[serde(default)]
    pub destination: Option<PathBuf>,
}

fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("splitpaste")
        .join("folders.db")
}

fn default_marker() -> String {
    "//".to_string()
}

fn default_saved_markers() -> Vec<String> {
    ["//", "###", "/*", "<!--"].map(String::from).to_vec()
}

fn default_clipboard_interval_ms() -> u64 {
    1000
}

fn default_folder_check_interval_ms() -> u64 {
    10_000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            marker: default_marker(),
            placement: Placement::default(),
            saved_markers: default_saved_markers(),
            clipboard_interval_ms: default_clipboard_interval_ms(),
            folder_check_interval_ms: default_folder_check_interval_ms(),
            destination: None,
        }
    }
}

impl Config {
    /// Load config from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load config from default location (config/default.toml) or fall back to defaults.
    pub fn load() -> Result<Self> {
        let config_path = PathBuf::from("config/default.toml");
        if config_path.exists() {
            return Self::load_from(&config_path);
        }

        Ok(Config::default())
    }

    /// The configured marker and placement, validated.
    pub fn delimiter(&self) -> Result<DelimiterSpec> {
        Ok(DelimiterSpec::new(&self.marker, self.placement)?)
    }

    pub fn session_config(&self) -> Result<SessionManagerConfig> {
        if self.clipboard_interval_ms == 0 {
            bail!("clipboard_interval_ms must be greater than zero");
        }
        if self.folder_check_interval_ms == 0 {
            bail!("folder_check_interval_ms must be greater than zero");
        }
        Ok(SessionManagerConfig {
            db_path: self.db_path.clone(),
            default_delimiter: Some(self.delimiter()?),
            default_destination: self.destination.clone(),
            saved_markers: self.saved_markers.clone(),
            clipboard_interval: Duration::from_millis(self.clipboard_interval_ms),
            folder_check_interval: Duration::from_millis(self.folder_check_interval_ms),
        })
    }
}
