//! Configuration loaded from `trailhead.toml`.

use crate::core::error::TrailheadError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "trailhead.toml";

pub fn default_store_dir() -> PathBuf {
    PathBuf::from(".trailhead").join("data")
}

fn default_log_filter() -> String {
    "trailhead=info".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the databases and audit log
    #[serde(default = "default_store_dir")]
    pub store_dir: PathBuf,

    /// Curriculum file (TOML or JSON) used to seed an empty catalog.
    /// The built-in curriculum is used when unset.
    #[serde(default)]
    pub curriculum_path: Option<PathBuf>,

    /// `tracing` filter directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_dir: default_store_dir(),
            curriculum_path: None,
            log_filter: default_log_filter(),
        }
    }
}

impl Config {
    pub fn from_toml(content: &str) -> Result<Self, TrailheadError> {
        Ok(toml::from_str(content)?)
    }

    /// Load `trailhead.toml` from `dir`. A missing file is not an error and yields the
    /// defaults unchanged.
    pub fn load_from_dir(dir: &Path) -> Result<Self, TrailheadError> {
        let config_path = dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(&config_path)?;
        let mut config = Self::from_toml(&content)?;
        // Relative paths are resolved against the config file's directory.
        if config.store_dir.is_relative() {
            config.store_dir = dir.join(&config.store_dir);
        }
        if let Some(path) = config.curriculum_path.take() {
            config.curriculum_path = Some(if path.is_relative() { dir.join(path) } else { path });
        }
        Ok(config)
    }
}
