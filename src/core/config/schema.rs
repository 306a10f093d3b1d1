//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Validation
//!
//! Values are validated after parsing; a cache capacity of zero is
//! rejected rather than clamped.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::ConfigError;

/// Top-level configuration.
///
/// # Example
///
/// ```toml
/// [store]
/// path = "/var/lib/memberflow/state.json"
///
/// [cache]
/// capacity = 10000
///
/// [hooks]
/// log_events = true
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Membership state settings
    pub store: Option<StoreConfig>,

    /// Membership cache settings
    pub cache: Option<CacheConfig>,

    /// Hook delivery settings
    pub hooks: Option<HooksConfig>,
}

impl FileConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(store) = &self.store {
            store.validate()?;
        }
        if let Some(cache) = &self.cache {
            cache.validate()?;
        }
        Ok(())
    }
}

/// Where membership state is kept.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Snapshot file
    pub path: Option<PathBuf>,
}

impl StoreConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        match &self.path {
            Some(p) if p.as_os_str().is_empty() => Err(ConfigError::InvalidValue(
                "store.path must not be empty".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

/// Membership cache sizing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Maximum cached membership answers
    pub capacity: Option<usize>,
}

impl CacheConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == Some(0) {
            return Err(ConfigError::InvalidValue(
                "cache.capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Hook delivery.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct HooksConfig {
    /// Emit a log event for every fired hook
    pub log_events: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let config: FileConfig = toml::from_str(
            r#"
            [store]
            path = "/tmp/state.json"

            [cache]
            capacity = 5

            [hooks]
            log_events = false
            "#,
        )
        .unwrap();

        assert_eq!(
            config.store.unwrap().path,
            Some(PathBuf::from("/tmp/state.json"))
        );
        assert_eq!(config.cache.unwrap().capacity, Some(5));
        assert_eq!(config.hooks.unwrap().log_events, Some(false));
    }

    #[test]
    fn empty_config_is_valid() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert_eq!(config, FileConfig::default());
        config.validate().unwrap();
    }

    #[test]
    fn zero_capacity_rejected() {
        let config = FileConfig {
            cache: Some(CacheConfig { capacity: Some(0) }),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue(msg)) if msg.contains("capacity")
        ));
    }

    #[test]
    fn unknown_section_rejected() {
        let result: Result<FileConfig, _> = toml::from_str("[metrics]\nenabled = true\n");
        assert!(result.is_err());
    }

    #[test]
    fn unknown_key_in_section_rejected() {
        let result: Result<FileConfig, _> = toml::from_str("[cache]\nttl = 30\n");
        assert!(result.is_err());
    }
}
