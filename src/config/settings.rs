//! Application settings loaded from config.toml
//!
//! Every setting has a default, so the file is optional. A file that exists
//! but cannot be read or parsed is an error.

use crate::core::allocation::DuplicateRequestPolicy;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Default location of the settings file
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// Storage keys and session persistence
    pub storage: StorageConfig,
    /// Presentation settings
    pub ui: UiConfig,
    /// Allocation rules
    pub allocation: AllocationConfig,
}

/// `[storage]` section
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct StorageConfig {
    /// Prefix of every storage key
    pub key_prefix: String,
    /// Version suffix of every storage key
    pub key_version: String,
    /// Keep the session in the database so it survives a restart
    pub persist_session: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            key_prefix: "alloc".to_string(),
            key_version: "v2".to_string(),
            persist_session: false,
        }
    }
}

/// `[ui]` section
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct UiConfig {
    /// How long a notice stays visible, in milliseconds
    pub notice_duration_ms: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            notice_duration_ms: 3000,
        }
    }
}

impl UiConfig {
    /// Notice display duration
    #[must_use]
    pub const fn notice_duration(&self) -> Duration {
        Duration::from_millis(self.notice_duration_ms)
    }
}

/// `[allocation]` section
#[derive(Debug, Default, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AllocationConfig {
    /// Handling of a student request for a subject they already requested
    pub duplicate_requests: DuplicateRequestPolicy,
}

/// Loads settings from a TOML file.
///
/// # Errors
/// Returns an error if the file cannot be read or its TOML is invalid.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;

    parse_config(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {}: {e}", path_ref.display()),
    })
}

/// Loads settings from `path`, falling back to defaults when the file does
/// not exist.
///
/// # Errors
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config_or_default<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    if path_ref.exists() {
        load_config(path_ref)
    } else {
        tracing::info!(
            "No configuration file at {}, using defaults",
            path_ref.display()
        );
        Ok(AppConfig::default())
    }
}

fn parse_config(contents: &str) -> std::result::Result<AppConfig, toml::de::Error> {
    toml::from_str(contents)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            [storage]
            key_prefix = "campus"
            key_version = "v3"
            persist_session = true

            [ui]
            notice_duration_ms = 5000

            [allocation]
            duplicate_requests = "reject"
        "#;

        let config = parse_config(toml_str).unwrap();
        assert_eq!(config.storage.key_prefix, "campus");
        assert_eq!(config.storage.key_version, "v3");
        assert!(config.storage.persist_session);
        assert_eq!(config.ui.notice_duration(), Duration::from_secs(5));
        assert_eq!(
            config.allocation.duplicate_requests,
            DuplicateRequestPolicy::Reject
        );
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config = parse_config("[ui]\nnotice_duration_ms = 100\n").unwrap();
        assert_eq!(config.storage, StorageConfig::default());
        assert_eq!(config.ui.notice_duration_ms, 100);
        assert_eq!(
            config.allocation.duplicate_requests,
            DuplicateRequestPolicy::Allow
        );
        assert_eq!(parse_config("").unwrap(), AppConfig::default());
    }

    #[test]
    fn test_invalid_policy_is_rejected() {
        assert!(parse_config("[allocation]\nduplicate_requests = \"sometimes\"\n").is_err());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = load_config_or_default("definitely/not/here/config.toml").unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(matches!(
            load_config("definitely/not/here/config.toml"),
            Err(Error::Config { .. })
        ));
    }
}
