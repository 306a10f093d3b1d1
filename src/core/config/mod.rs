//! core::config
//!
//! Configuration schema and loading.
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Config file
//! 3. CLI flags (not handled here)
//!
//! # Config Locations
//!
//! Searched in order:
//! 1. `$MEMBERFLOW_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/memberflow/config.toml`
//! 3. `~/.memberflow/config.toml` (canonical write location)
//!
//! # Example
//!
//! ```no_run
//! use memberflow::core::config::Config;
//!
//! let config = Config::load().unwrap();
//! println!("state: {}", config.state_path().unwrap().display());
//! println!("cache capacity: {}", config.cache_capacity());
//! ```

pub mod schema;

pub use schema::{CacheConfig, FileConfig, HooksConfig, StoreConfig};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::cache::DEFAULT_CAPACITY;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "MEMBERFLOW_CONFIG";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("config file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Loaded configuration with defaults applied by the accessors.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Parsed file contents
    pub file: FileConfig,
    /// Path the file was loaded from (if any)
    loaded_from: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed or
    /// fails validation. A missing file is not an error.
    pub fn load() -> Result<Config, ConfigError> {
        match Self::locate() {
            Some(path) => Self::load_from(&path),
            None => Ok(Config::default()),
        }
    }

    /// Load configuration from an explicit file.
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let file: FileConfig = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        file.validate()?;

        Ok(Config {
            file,
            loaded_from: Some(path.to_path_buf()),
        })
    }

    fn locate() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("memberflow/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        dirs::home_dir()
            .map(|home| home.join(".memberflow/config.toml"))
            .filter(|path| path.exists())
    }

    /// Canonical config path, `~/.memberflow/config.toml`.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".memberflow/config.toml"))
    }

    /// Write `file` to `path` atomically, refusing to overwrite unless
    /// `force` is set.
    pub fn write(path: &Path, file: &FileConfig, force: bool) -> Result<(), ConfigError> {
        if path.exists() && !force {
            return Err(ConfigError::AlreadyExists(path.to_path_buf()));
        }
        file.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let contents =
            toml::to_string_pretty(file).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        let temp_path = path.with_extension("toml.tmp");
        let mut tmp = fs::File::create(&temp_path).map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;
        tmp.write_all(contents.as_bytes())
            .and_then(|()| tmp.sync_all())
            .map_err(|e| ConfigError::WriteError {
                path: temp_path.clone(),
                source: e,
            })?;

        fs::rename(&temp_path, path).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }

    // =========================================================================
    // Accessors with defaults
    // =========================================================================

    /// Snapshot file holding membership state.
    ///
    /// Defaults to `~/.memberflow/state.json`.
    pub fn state_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = self.file.store.as_ref().and_then(|s| s.path.clone()) {
            return Ok(path);
        }
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".memberflow/state.json"))
    }

    /// Membership cache capacity.
    ///
    /// Defaults to [`DEFAULT_CAPACITY`].
    pub fn cache_capacity(&self) -> usize {
        self.file
            .cache
            .as_ref()
            .and_then(|c| c.capacity)
            .unwrap_or(DEFAULT_CAPACITY)
    }

    /// Whether fired hooks are logged.
    ///
    /// Defaults to `true`.
    pub fn log_events(&self) -> bool {
        self.file
            .hooks
            .as_ref()
            .and_then(|h| h.log_events)
            .unwrap_or(true)
    }

    /// Path the configuration was loaded from.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.loaded_from.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_without_file() {
        let config = Config::default();
        assert_eq!(config.cache_capacity(), DEFAULT_CAPACITY);
        assert!(config.log_events());
        assert!(config.loaded_from().is_none());
    }

    #[test]
    fn load_from_explicit_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(
            &path,
            r#"
            [store]
            path = "/srv/members.json"

            [cache]
            capacity = 32
            "#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();

        assert_eq!(
            config.state_path().unwrap(),
            PathBuf::from("/srv/members.json")
        );
        assert_eq!(config.cache_capacity(), 32);
        assert_eq!(config.loaded_from(), Some(path.as_path()));
    }

    #[test]
    fn invalid_value_rejected_on_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "[cache]\ncapacity = 0\n").unwrap();

        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn malformed_toml_reports_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "[cache\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn write_is_atomic_and_round_trips() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/config.toml");
        let file = FileConfig {
            hooks: Some(HooksConfig {
                log_events: Some(false),
            }),
            ..Default::default()
        };

        Config::write(&path, &file, false).unwrap();

        assert!(!path.with_extension("toml.tmp").exists());
        let loaded = Config::load_from(&path).unwrap();
        assert!(!loaded.log_events());
    }

    #[test]
    fn write_refuses_to_overwrite() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "").unwrap();

        assert!(matches!(
            Config::write(&path, &FileConfig::default(), false),
            Err(ConfigError::AlreadyExists(_))
        ));
        Config::write(&path, &FileConfig::default(), true).unwrap();
    }
}
