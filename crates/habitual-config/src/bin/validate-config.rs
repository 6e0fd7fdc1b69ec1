//! Config validation CLI tool
//!
//! Validates a habitual configuration file and reports any errors.

use habitual_util::default_config_path;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let default_path = default_config_path();
            eprintln!("Usage: validate-config [config-file]");
            eprintln!();
            eprintln!("Validates a habitual configuration file.");
            eprintln!();
            eprintln!("Example:");
            eprintln!("  validate-config {}", default_path.display());
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match habitual_config::load_config(&config_path) {
        Ok(settings) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Config version: {}", habitual_config::CURRENT_CONFIG_VERSION);
            println!("  Database: {}", settings.storage.database_path().display());
            println!("  Log level: {}", settings.logging.level);
            if let Some(file) = &settings.logging.file {
                println!("  Log file: {} ({:?})", file.display(), settings.logging.mode);
            }
            println!("  Periodicity codes:");
            for (periodicity, code) in settings.tracking.codes.entries() {
                println!(
                    "    - {}: '{}' (backfill cap {})",
                    periodicity,
                    code,
                    settings.tracking.limits.max_periods(periodicity)
                );
            }
            println!(
                "  Corrupt last check-in: {:?}",
                settings.tracking.corrupt_last_checked
            );

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                habitual_config::ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                habitual_config::ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                habitual_config::ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                habitual_config::ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver,
                        habitual_config::CURRENT_CONFIG_VERSION
                    );
                }
            }
            ExitCode::from(1)
        }
    }
}
