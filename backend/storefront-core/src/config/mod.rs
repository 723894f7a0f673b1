use crate::DEFAULT_API_BASE_URL;
use crate::error::config::ConfigError;
use crate::transport::http::DEFAULT_TIMEOUT_DURATION;

use std::env;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_VERSION: u32 = 1;
const DATA_DIR_NAME: &str = "storefront";
const DEFAULT_STORE_FILE_NAME: &str = "storefront-state.json";
const MAX_TIMEOUT_SECS: u64 = 300;

/// Environment variable overriding `api.base_url`, also read from `.env`.
pub const API_URL_ENV_VAR: &str = "STOREFRONT_API_URL";

// ============================================
// CONFIG STRUCTS
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_store_file_name")]
    pub file_name: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            file_name: default_store_file_name(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub keep_logged_in_default: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub session: SessionConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            api: ApiConfig::default(),
            storage: StorageConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

// ============================================
// DEFAULT FUNCTIONS
// ============================================

fn default_version() -> u32 {
    CONFIG_VERSION
}
fn default_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}
fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_DURATION.as_secs()
}
fn default_store_file_name() -> String {
    DEFAULT_STORE_FILE_NAME.to_string()
}

// ============================================
// IMPLEMENTATION
// ============================================

impl ClientConfig {
    /// Load config from {config_dir}/config.json.
    ///
    /// # Returns
    ///
    /// Returns defaults if the file is missing.
    /// Returns `Err(ConfigError)` if the file exists but is corrupted/invalid.
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            info!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path).map_err(|e| {
            warn!("Failed to read config file: {}", e);
            ConfigError::unreadable(&config_path, e)
        })?;

        let config: ClientConfig = serde_json::from_str(&contents).map_err(|e| {
            warn!("Failed to parse config JSON: {}", e);
            ConfigError::malformed(&config_path, e)
        })?;

        config.validate()?;

        info!("Config loaded from {}", config_path.display());
        Ok(config)
    }

    /// Save config to {config_dir}/config.json using atomic write.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if validation, directory creation,
    /// serialization, write or rename fails.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        self.validate()?;

        std::fs::create_dir_all(config_dir).map_err(|e| ConfigError::unwritable(config_dir, e))?;

        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let temp_path = config_dir.join(format!("{}.tmp", CONFIG_FILE_NAME));

        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::encode(e))?;

        std::fs::write(&temp_path, json).map_err(|e| ConfigError::unwritable(&temp_path, e))?;
        std::fs::rename(&temp_path, &config_path)
            .map_err(|e| ConfigError::unwritable(&config_path, e))?;

        info!("Config saved to {}", config_path.display());
        Ok(())
    }

    /// Validate config values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version == 0 || self.version > CONFIG_VERSION {
            return Err(ConfigError::invalid(
                "version",
                format!("{} is not a known layout (expected 1-{CONFIG_VERSION})", self.version),
            ));
        }

        let url = &self.api.base_url;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::invalid(
                "api.base_url",
                format!("storefront API URL must be http(s), got '{url}'"),
            ));
        }

        if self.api.timeout_secs == 0 || self.api.timeout_secs > MAX_TIMEOUT_SECS {
            return Err(ConfigError::invalid(
                "api.timeout_secs",
                format!(
                    "{}s is outside 1-{MAX_TIMEOUT_SECS}s",
                    self.api.timeout_secs
                ),
            ));
        }

        if self.storage.file_name.trim().is_empty() {
            return Err(ConfigError::invalid(
                "storage.file_name",
                "state file name cannot be empty",
            ));
        }

        Ok(())
    }

    /// Apply `STOREFRONT_API_URL` from the environment or a `.env` file.
    ///
    /// A missing `.env` is fine; the override is validated like the file.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => debug!("Loaded .env from: {:?}", path),
            Err(e) if e.not_found() => debug!("No .env file found"),
            Err(e) => warn!("Failed to parse .env: {}", e),
        }

        if let Ok(url) = env::var(API_URL_ENV_VAR) {
            info!("Using {} override: {}", API_URL_ENV_VAR, url);
            self.api.base_url = url;
        }

        self.validate()
    }

    /// Path of the durable key-value store inside `data_dir`.
    pub fn store_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.storage.file_name)
    }

    /// Platform data directory for persisted session and cart state.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoDataDirectory`] if the platform has none.
    pub fn default_data_dir() -> Result<PathBuf, ConfigError> {
        dirs::data_local_dir()
            .map(|dir| dir.join(DATA_DIR_NAME))
            .ok_or_else(|| ConfigError::no_data_directory())
    }
}
