use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::bridge::{LoadPolicy, STORAGE_KEY};
use crate::store::DEFAULT_QUOTA_BYTES;

const CONFIG_DIR_NAME: &str = ".statebridge";
const CONFIG_FILE_NAME: &str = "config.json";
const STORAGE_DIR_NAME: &str = "storage";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config directory not found: could not determine home directory")]
    HomeDirNotFound,
    #[error("failed to read config file: {0}")]
    ReadFailed(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    ParseFailed(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Key of the slot the application state is saved under.
    #[serde(default = "default_storage_key")]
    pub storage_key: String,

    /// Directory holding stored values. Defaults to `<config dir>/storage`.
    #[serde(default)]
    pub storage_dir: Option<PathBuf>,

    /// How to start when the saved state is unreadable.
    #[serde(default)]
    pub load_policy: LoadPolicy,

    /// Largest value accepted by the store, in bytes.
    #[serde(default = "default_quota_bytes")]
    pub quota_bytes: usize,

    /// Register the background worker at start-up.
    #[serde(default = "default_register_worker")]
    pub register_worker: bool,
}

fn default_storage_key() -> String {
    STORAGE_KEY.to_string()
}

fn default_quota_bytes() -> usize {
    DEFAULT_QUOTA_BYTES
}

fn default_register_worker() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_key: default_storage_key(),
            storage_dir: None,
            load_policy: LoadPolicy::default(),
            quota_bytes: default_quota_bytes(),
            register_worker: default_register_worker(),
        }
    }
}

/// Return the config directory path: `~/.statebridge/`
pub fn get_config_dir() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::HomeDirNotFound)?;
    Ok(home.join(CONFIG_DIR_NAME))
}

impl Config {
    /// Load configuration from the given config directory.
    /// Returns defaults if the file does not exist.
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let path = config_dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(&path)?;
        let config: Config = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to the given config directory.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir)?;
        let path = config_dir.join(CONFIG_FILE_NAME);
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;
        Ok(())
    }

    /// Where stored values live, resolving the default against `config_dir`.
    pub fn storage_dir(&self, config_dir: &Path) -> PathBuf {
        self.storage_dir
            .clone()
            .unwrap_or_else(|| config_dir.join(STORAGE_DIR_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.storage_key, "elm-todo-save");
        assert_eq!(config.storage_dir, None);
        assert_eq!(config.load_policy, LoadPolicy::Strict);
        assert_eq!(config.quota_bytes, 5 * 1024 * 1024);
        assert!(config.register_worker);
    }

    #[test]
    fn test_get_config_dir() {
        let dir = get_config_dir().expect("should return config dir");
        assert!(
            dir.ends_with(CONFIG_DIR_NAME),
            "should end with {}",
            CONFIG_DIR_NAME
        );
        assert!(dir.is_absolute(), "should be an absolute path");
    }

    #[test]
    fn test_load_config_missing_file_returns_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = Config::load(tmp.path()).expect("should return defaults");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_config_partial_json_fills_defaults() {
        let tmp = TempDir::new().unwrap();
        let json = r#"{ "load_policy": "permissive", "register_worker": false }"#;
        std::fs::write(tmp.path().join(CONFIG_FILE_NAME), json).unwrap();

        let config = Config::load(tmp.path()).expect("should load config");
        assert_eq!(config.load_policy, LoadPolicy::Permissive);
        assert!(!config.register_worker);
        assert_eq!(config.storage_key, "elm-todo-save");
        assert_eq!(config.quota_bytes, DEFAULT_QUOTA_BYTES);
    }

    #[test]
    fn test_load_config_invalid_json_returns_error() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(CONFIG_FILE_NAME), "not json at all").unwrap();

        let result = Config::load(tmp.path());
        assert!(matches!(result, Err(ConfigError::ParseFailed(_))));
    }

    #[test]
    fn test_save_config_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let config = Config {
            storage_key: "todo".to_string(),
            storage_dir: Some(PathBuf::from("/var/lib/todo")),
            load_policy: LoadPolicy::Permissive,
            quota_bytes: 1024,
            register_worker: false,
        };

        config.save(tmp.path()).expect("should save config");
        assert!(tmp.path().join(CONFIG_FILE_NAME).exists());

        let loaded = Config::load(tmp.path()).expect("should load saved config");
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_storage_dir_resolution() {
        let base = Path::new("/home/user/.statebridge");
        let mut config = Config::default();
        assert_eq!(config.storage_dir(base), base.join("storage"));

        config.storage_dir = Some(PathBuf::from("/elsewhere"));
        assert_eq!(config.storage_dir(base), PathBuf::from("/elsewhere"));
    }
}
