//! Configuration parsing and validation for habitual
//!
//! Supports TOML configuration with:
//! - Versioned schema
//! - Storage location and database name
//! - Log level and optional log file
//! - Stored periodicity codes
//! - Reconciliation limits and the corrupt check-in repair policy
//! - Validation with clear error messages

mod schema;
mod settings;
mod validation;

pub use schema::*;
pub use settings::*;
pub use validation::*;

use std::path::Path;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation failed: {errors:?}")]
    ValidationFailed { errors: Vec<ValidationError> },

    #[error("Unsupported config version: {0}")]
    UnsupportedVersion(u32),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Load and validate configuration from a TOML file
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<Settings> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Load configuration if the file exists.
///
/// `None` means there is no file and the caller should use defaults.
pub fn load_config_if_present(path: impl AsRef<Path>) -> ConfigResult<Option<Settings>> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(None);
    }
    load_config(path).map(Some)
}

/// Parse and validate configuration from a TOML string
pub fn parse_config(content: &str) -> ConfigResult<Settings> {
    let raw: RawConfig = toml::from_str(content)?;

    if raw.config_version != CURRENT_CONFIG_VERSION {
        return Err(ConfigError::UnsupportedVersion(raw.config_version));
    }

    let errors = validate_config(&raw);
    if !errors.is_empty() {
        return Err(ConfigError::ValidationFailed { errors });
    }

    Ok(Settings::from_raw(raw))
}

/// Current supported config version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

#[cfg(test)]
mod tests {
    use super::*;
    use habitual_util::Periodicity;
    use std::io::Write;

    #[test]
    fn parse_minimal_config() {
        let settings = parse_config("config_version = 1").unwrap();
        assert_eq!(settings.storage.database, "habits");
        assert_eq!(settings.tracking.codes.code(Periodicity::Daily), "0");
        assert_eq!(settings.tracking.codes.code(Periodicity::Weekly), "1");
        assert_eq!(
            settings.tracking.corrupt_last_checked,
            CorruptCheckInPolicy::CreditAsChecked
        );
    }

    #[test]
    fn parse_overrides() {
        let config = r#"
            config_version = 1

            [periodicity]
            daily = "day"
            weekly = "week"

            [reconcile]
            weekly_max_periods = 52
            corrupt_last_checked = "treat_as_unchecked"
        "#;

        let settings = parse_config(config).unwrap();
        assert_eq!(settings.tracking.codes.parse("week"), Some(Periodicity::Weekly));
        assert_eq!(settings.tracking.limits.weekly_max_periods, 52);
        assert_eq!(settings.tracking.limits.daily_max_periods, 3650);
        assert_eq!(
            settings.tracking.corrupt_last_checked,
            CorruptCheckInPolicy::TreatAsUnchecked
        );
    }

    #[test]
    fn reject_wrong_version() {
        let result = parse_config("config_version = 99");
        assert!(matches!(result, Err(ConfigError::UnsupportedVersion(99))));
    }

    #[test]
    fn reject_invalid_values() {
        let config = r#"
            config_version = 1
            [reconcile]
            daily_max_periods = 0
        "#;
        let result = parse_config(config);
        assert!(matches!(result, Err(ConfigError::ValidationFailed { errors }) if errors.len() == 1));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_config_if_present(dir.path().join("absent.toml")).unwrap();
        assert!(loaded.is_none());
        assert_eq!(loaded.unwrap_or_default().storage.database, "habits");
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "config_version = 1\n[storage]\ndatabase = \"mine\"").unwrap();

        let settings = load_config(file.path()).unwrap();
        assert_eq!(settings.storage.database, "mine");
    }
}
