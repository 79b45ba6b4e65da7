//! Application configuration management.
//!
//! Configuration is stored at `~/.config/flavorai/config.json` and holds the
//! API base URL, which storage backend keeps the session, and the last email
//! used to log in. `FLAVORAI_API_URL` overrides the configured base URL.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::client::DEFAULT_REQUEST_TIMEOUT_SECS;
use crate::storage::{DurableStorage, FileStorage, KeyringStorage, MemoryStorage};

/// Application name used for config/data directory paths
pub const APP_NAME: &str = "flavorai";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// API base URL when neither the environment nor the config file sets one
pub const DEFAULT_API_URL: &str = "http://localhost:3000";

/// Environment variable overriding the API base URL
pub const API_URL_ENV: &str = "FLAVORAI_API_URL";

/// Where the session is persisted between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// JSON file in the data directory
    #[default]
    File,
    /// OS keychain
    Keyring,
    /// Not persisted; every run starts logged out
    Memory,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub storage: StorageBackend,
    #[serde(default)]
    pub last_email: Option<String>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl Config {
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Load the config for a run that may write it back.
    ///
    /// The returned path is `None` when an existing file could not be read or
    /// parsed; saving defaults over it would lose the user's settings.
    pub fn load_for_update() -> (Self, Option<PathBuf>) {
        match Self::config_path() {
            Ok(path) => Self::load_for_update_from(path),
            Err(e) => {
                warn!(error = %e, "No config directory, using defaults");
                (Self::default(), None)
            }
        }
    }

    pub fn load_for_update_from(path: PathBuf) -> (Self, Option<PathBuf>) {
        match Self::load_from(&path) {
            Ok(config) => (config, Some(path)),
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults without saving");
                (Self::default(), None)
            }
        }
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Per-user data directory holding the session file and logs.
    pub fn data_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// Effective API base URL: environment, then config file, then default.
    pub fn api_url(&self) -> String {
        Self::resolve_api_url(std::env::var(API_URL_ENV).ok(), self.api_url.as_deref())
    }

    fn resolve_api_url(from_env: Option<String>, configured: Option<&str>) -> String {
        [from_env.as_deref(), configured]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|url| !url.is_empty())
            .unwrap_or(DEFAULT_API_URL)
            .trim_end_matches('/')
            .to_string()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    /// Open the durable storage for `backend`.
    pub fn open_storage(backend: StorageBackend) -> Result<Arc<dyn DurableStorage>> {
        let storage: Arc<dyn DurableStorage> = match backend {
            StorageBackend::File => Arc::new(FileStorage::in_dir(&Self::data_dir()?)),
            StorageBackend::Keyring => Arc::new(KeyringStorage::new()),
            StorageBackend::Memory => Arc::new(MemoryStorage::new()),
        };
        Ok(storage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_url_precedence() {
        assert_eq!(
            Config::resolve_api_url(Some("http://env:1".to_string()), Some("http://file:2")),
            "http://env:1"
        );
        assert_eq!(Config::resolve_api_url(None, Some("http://file:2/")), "http://file:2");
        assert_eq!(Config::resolve_api_url(None, None), DEFAULT_API_URL);
    }

    #[test]
    fn test_blank_api_url_falls_back_to_default() {
        assert_eq!(Config::resolve_api_url(Some("  ".to_string()), None), DEFAULT_API_URL);
        assert_eq!(Config::resolve_api_url(None, Some("")), DEFAULT_API_URL);
        assert_eq!(
            Config::resolve_api_url(Some(String::new()), Some("http://file:2")),
            "http://file:2"
        );
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.storage, StorageBackend::File);
        assert_eq!(config.api_url, None);
        assert_eq!(config.request_timeout(), Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS));
    }

    #[test]
    fn test_storage_backend_names() {
        let config: Config = serde_json::from_str(r#"{"storage":"keyring"}"#).unwrap();
        assert_eq!(config.storage, StorageBackend::Keyring);
        assert!(serde_json::from_str::<Config>(r#"{"storage":"cloud"}"#).is_err());
    }

    #[test]
    fn test_request_timeout_zero_uses_default() {
        let config = Config {
            request_timeout_secs: Some(0),
            ..Default::default()
        };
        assert_eq!(config.request_timeout(), Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS));

        let config = Config {
            request_timeout_secs: Some(5),
            ..Default::default()
        };
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);

        let config = Config {
            last_email: Some("a@b.com".to_string()),
            storage: StorageBackend::Memory,
            ..Default::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.last_email.as_deref(), Some("a@b.com"));
        assert_eq!(loaded.storage, StorageBackend::Memory);
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::load_from(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(loaded.storage, StorageBackend::File);
    }

    #[test]
    fn test_unreadable_config_is_not_offered_for_saving() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{"api_url": "http://mine:1", "storage": "#).unwrap();

        let (config, save_path) = Config::load_for_update_from(path.clone());
        assert_eq!(config.api_url, None);
        assert_eq!(save_path, None);
        // The user's file is left as it was.
        assert!(std::fs::read_to_string(&path).unwrap().contains("http://mine:1"));
    }

    #[test]
    fn test_missing_or_valid_config_can_be_saved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);

        let (_, save_path) = Config::load_for_update_from(path.clone());
        assert_eq!(save_path.as_deref(), Some(path.as_path()));

        std::fs::write(&path, r#"{"storage": "keyring"}"#).unwrap();
        let (config, save_path) = Config::load_for_update_from(path.clone());
        assert_eq!(config.storage, StorageBackend::Keyring);
        assert!(save_path.is_some());
    }

    #[test]
    fn test_memory_backend_opens_without_directories() {
        let storage = Config::open_storage(StorageBackend::Memory).unwrap();
        assert!(storage.describe().contains("memory"));
    }
}
