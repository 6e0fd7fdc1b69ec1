//! Configuration validation

use crate::schema::RawConfig;
use crate::settings::{
    CorruptCheckInPolicy, DEFAULT_DAILY_CODE, DEFAULT_WEEKLY_CODE, LogFileMode,
};
use habitual_util::Periodicity;
use std::str::FromStr;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Periodicity code for {periodicity} cannot be empty")]
    EmptyPeriodicityCode { periodicity: Periodicity },

    #[error("Daily and weekly habits share the periodicity code '{0}'")]
    DuplicatePeriodicityCode(String),

    #[error("Periodicity code '{code}' for {periodicity} is the name of another periodicity")]
    AmbiguousPeriodicityCode {
        periodicity: Periodicity,
        code: String,
    },

    #[error("Iteration cap for {periodicity} reconciliation must be greater than zero")]
    ZeroIterationCap { periodicity: Periodicity },

    #[error("Invalid log level '{0}'")]
    InvalidLogLevel(String),

    #[error("Invalid log file mode '{0}', expected 'append' or 'truncate'")]
    InvalidLogFileMode(String),

    #[error("Invalid corrupt_last_checked policy '{0}'")]
    InvalidCheckInPolicy(String),

    #[error("Database name cannot be empty")]
    EmptyDatabaseName,
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Some(database) = &config.storage.database
        && database.trim().is_empty()
    {
        errors.push(ValidationError::EmptyDatabaseName);
    }

    if let Some(level) = &config.logging.level
        && let Err(e) = parse_log_level(level)
    {
        errors.push(e);
    }

    if let Some(mode) = &config.logging.mode
        && let Err(e) = parse_log_file_mode(mode)
    {
        errors.push(e);
    }

    errors.extend(validate_periodicity_codes(config));

    let reconcile = &config.reconcile;
    if reconcile.daily_max_periods == Some(0) {
        errors.push(ValidationError::ZeroIterationCap {
            periodicity: Periodicity::Daily,
        });
    }
    if reconcile.weekly_max_periods == Some(0) {
        errors.push(ValidationError::ZeroIterationCap {
            periodicity: Periodicity::Weekly,
        });
    }
    if let Some(policy) = &reconcile.corrupt_last_checked
        && let Err(e) = parse_check_in_policy(policy)
    {
        errors.push(e);
    }

    errors
}

fn validate_periodicity_codes(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let daily = config
        .periodicity
        .daily
        .as_deref()
        .unwrap_or(DEFAULT_DAILY_CODE)
        .trim();
    let weekly = config
        .periodicity
        .weekly
        .as_deref()
        .unwrap_or(DEFAULT_WEEKLY_CODE)
        .trim();

    for (periodicity, code) in [(Periodicity::Daily, daily), (Periodicity::Weekly, weekly)] {
        if code.is_empty() {
            errors.push(ValidationError::EmptyPeriodicityCode { periodicity });
            continue;
        }
        // Names are accepted as aliases, so a code may not shadow the other name
        if let Some(named) = Periodicity::from_name(code)
            && named != periodicity
        {
            errors.push(ValidationError::AmbiguousPeriodicityCode {
                periodicity,
                code: code.to_string(),
            });
        }
    }

    if !daily.is_empty() && daily == weekly {
        errors.push(ValidationError::DuplicatePeriodicityCode(daily.to_string()));
    }

    errors
}

/// Parse a log level filter ("warn", "DEBUG", "off", ...)
pub fn parse_log_level(s: &str) -> Result<LevelFilter, ValidationError> {
    LevelFilter::from_str(s.trim()).map_err(|_| ValidationError::InvalidLogLevel(s.to_string()))
}

/// Parse a log file mode
pub fn parse_log_file_mode(s: &str) -> Result<LogFileMode, ValidationError> {
    match s.trim().to_lowercase().as_str() {
        "append" | "a" => Ok(LogFileMode::Append),
        "truncate" | "w" => Ok(LogFileMode::Truncate),
        _ => Err(ValidationError::InvalidLogFileMode(s.to_string())),
    }
}

/// Parse the repair policy for unparseable check-in timestamps
pub fn parse_check_in_policy(s: &str) -> Result<CorruptCheckInPolicy, ValidationError> {
    match s.trim().to_lowercase().as_str() {
        "credit_as_checked" => Ok(CorruptCheckInPolicy::CreditAsChecked),
        "treat_as_unchecked" => Ok(CorruptCheckInPolicy::TreatAsUnchecked),
        _ => Err(ValidationError::InvalidCheckInPolicy(s.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(toml_str: &str) -> RawConfig {
        toml::from_str(toml_str).unwrap()
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate_config(&raw("config_version = 1")).is_empty());
    }

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("warn").unwrap(), LevelFilter::WARN);
        assert_eq!(parse_log_level("DEBUG").unwrap(), LevelFilter::DEBUG);
        assert_eq!(parse_log_level("off").unwrap(), LevelFilter::OFF);
        assert!(parse_log_level("loud").is_err());
    }

    #[test]
    fn test_parse_log_file_mode() {
        assert_eq!(parse_log_file_mode("append").unwrap(), LogFileMode::Append);
        assert_eq!(parse_log_file_mode("w").unwrap(), LogFileMode::Truncate);
        assert!(parse_log_file_mode("rw").is_err());
    }

    #[test]
    fn test_duplicate_periodicity_codes() {
        let errors = validate_config(&raw(
            r#"
            config_version = 1
            [periodicity]
            daily = "x"
            weekly = "x"
            "#,
        ));
        assert!(
            errors
                .iter()
                .any(|e| matches!(e, ValidationError::DuplicatePeriodicityCode(c) if c == "x"))
        );
    }

    #[test]
    fn test_code_cannot_shadow_other_name() {
        let errors = validate_config(&raw(
            r#"
            config_version = 1
            [periodicity]
            daily = "weekly"
            "#,
        ));
        assert!(errors.iter().any(|e| matches!(
            e,
            ValidationError::AmbiguousPeriodicityCode {
                periodicity: Periodicity::Daily,
                ..
            }
        )));
    }

    #[test]
    fn test_errors_are_collected() {
        let errors = validate_config(&raw(
            r#"
            config_version = 1
            [storage]
            database = " "
            [logging]
            level = "chatty"
            [periodicity]
            weekly = ""
            [reconcile]
            daily_max_periods = 0
            corrupt_last_checked = "shrug"
            "#,
        ));
        assert_eq!(errors.len(), 5);
    }
}
