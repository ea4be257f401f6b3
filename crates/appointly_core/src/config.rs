//! Runtime configuration resolved from environment variables.
//!
//! # Responsibility
//! - Resolve storage location, storage key, quota and log level.
//! - Keep resolution testable through an injectable variable lookup.
//!
//! # Invariants
//! - Blank variables count as unset.
//! - An unparseable quota is an error, not a silent default.

use crate::logging::default_log_level;
use crate::store::appointment_store::DEFAULT_STORAGE_KEY;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "APPOINTLY_DB_PATH";
pub const ENV_STORAGE_KEY: &str = "APPOINTLY_STORAGE_KEY";
pub const ENV_STORAGE_QUOTA_BYTES: &str = "APPOINTLY_STORAGE_QUOTA_BYTES";
pub const ENV_LOG_LEVEL: &str = "APPOINTLY_LOG_LEVEL";

/// Database file used when `APPOINTLY_DB_PATH` is unset.
pub const DEFAULT_DB_FILE_NAME: &str = "appointly.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidQuota { value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidQuota { value } => write!(
                f,
                "{ENV_STORAGE_QUOTA_BYTES} must be a positive byte count, got `{value}`"
            ),
        }
    }
}

impl Error for ConfigError {}

/// Resolved runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppointlyConfig {
    /// SQLite file holding device-local storage.
    pub db_path: PathBuf,
    /// Namespaced key holding the appointment array.
    pub storage_key: String,
    /// Optional byte quota for the storage backend.
    pub storage_quota_bytes: Option<usize>,
    /// `trace|debug|info|warn|error`.
    pub log_level: String,
}

impl Default for AppointlyConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            storage_quota_bytes: None,
            log_level: default_log_level().to_string(),
        }
    }
}

impl AppointlyConfig {
    /// Resolves configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves configuration through `lookup`, falling back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        let storage_quota_bytes = match read(ENV_STORAGE_QUOTA_BYTES) {
            None => None,
            Some(value) => match value.parse::<usize>() {
                Ok(bytes) if bytes > 0 => Some(bytes),
                _ => return Err(ConfigError::InvalidQuota { value }),
            },
        };

        Ok(Self {
            db_path: read(ENV_DB_PATH)
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            storage_key: read(ENV_STORAGE_KEY).unwrap_or(defaults.storage_key),
            storage_quota_bytes,
            log_level: read(ENV_LOG_LEVEL).unwrap_or(defaults.log_level),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{AppointlyConfig, ConfigError, DEFAULT_DB_FILE_NAME};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars = pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect::<HashMap<_, _>>();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_unset_or_blank() {
        let config =
            AppointlyConfig::from_lookup(lookup_from(&[("APPOINTLY_STORAGE_KEY", "  ")])).unwrap();

        assert!(config.db_path.ends_with(DEFAULT_DB_FILE_NAME));
        assert_eq!(config.storage_key, "appointments");
        assert_eq!(config.storage_quota_bytes, None);
        assert!(!config.log_level.is_empty());
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = AppointlyConfig::from_lookup(lookup_from(&[
            ("APPOINTLY_DB_PATH", "/var/lib/appointly/store.sqlite3"),
            ("APPOINTLY_STORAGE_KEY", "garage-bookings"),
            ("APPOINTLY_STORAGE_QUOTA_BYTES", "5242880"),
            ("APPOINTLY_LOG_LEVEL", "warn"),
        ]))
        .unwrap();

        assert_eq!(
            config.db_path,
            PathBuf::from("/var/lib/appointly/store.sqlite3")
        );
        assert_eq!(config.storage_key, "garage-bookings");
        assert_eq!(config.storage_quota_bytes, Some(5_242_880));
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn invalid_quota_is_rejected() {
        let err = AppointlyConfig::from_lookup(lookup_from(&[(
            "APPOINTLY_STORAGE_QUOTA_BYTES",
            "lots",
        )]))
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidQuota {
                value: "lots".to_string()
            }
        );
    }
}
