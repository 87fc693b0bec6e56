use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::query::QueryProtocol;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub backend_url: String,
    pub query_protocol: QueryProtocol,
    pub auto_select_documents: bool,
    pub admin: bool,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            query_protocol: QueryProtocol::Streaming,
            auto_select_documents: true,
            admin: false,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from the user config dir, then apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path()?;
        let mut config = Self::load_from(&config_path)?;
        config.apply_env();
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    /// Persist the answer protocol into the file at `path`, keeping its
    /// other fields. Environment overrides are not written back.
    pub fn save_query_protocol(path: &Path, protocol: QueryProtocol) -> Result<(), ConfigError> {
        let mut config = Self::load_from(path).unwrap_or_else(|_| Self::new());
        config.query_protocol = protocol;
        config.save_to(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    /// `POLICYBOT_BACKEND_URL` and `POLICYBOT_LOG` win over the file.
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("POLICYBOT_BACKEND_URL") {
            if !url.trim().is_empty() {
                self.backend_url = url;
            }
        }
        if let Ok(level) = std::env::var("POLICYBOT_LOG") {
            if !level.trim().is_empty() {
                self.log_level = level;
            }
        }
    }

    pub fn get_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;

        Ok(config_dir.join("policybot").join("config.json"))
    }
}
