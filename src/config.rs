//! Configuration management for the follow-up tracker.
//!
//! Settings come from environment variables, optionally seeded from a `.env`
//! file in the working directory.

use crate::codec::InterchangeFormat;
use crate::error::{ConfigError, ConfigResult};
use std::env;
use std::path::PathBuf;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Configuration for the follow-up tracker.
#[derive(Debug, Clone)]
pub struct Config {
    /// JSON file holding customers, follow-ups and reminder times
    pub data_file: PathBuf,

    /// Directory exports are written to (default: ".")
    pub export_dir: PathBuf,

    /// Format used when an export does not name one (default: csv)
    pub default_format: InterchangeFormat,

    /// Log level when `RUST_LOG` is not set (default: "info")
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `FOLLOWUP_DATA_FILE`: record store path (default: followup-data.json)
    /// - `FOLLOWUP_EXPORT_DIR`: export directory (default: .)
    /// - `FOLLOWUP_DEFAULT_FORMAT`: `csv` or `xlsx` (default: csv)
    /// - `LOG_LEVEL`: trace, debug, info, warn or error (default: info)
    pub fn from_env() -> ConfigResult<Self> {
        // A missing .env is fine.
        let _ = dotenvy::dotenv();

        let defaults = Config::default();

        let data_file = Self::parse_env_path("FOLLOWUP_DATA_FILE", defaults.data_file)?;
        let export_dir = Self::parse_env_path("FOLLOWUP_EXPORT_DIR", defaults.export_dir)?;

        let default_format = match env::var("FOLLOWUP_DEFAULT_FORMAT") {
            Ok(val) => val.trim().parse::<InterchangeFormat>().map_err(|reason| {
                ConfigError::InvalidValue {
                    var: "FOLLOWUP_DEFAULT_FORMAT".to_string(),
                    reason,
                }
            })?,
            Err(_) => defaults.default_format,
        };

        let log_level = env::var("LOG_LEVEL")
            .map(|l| l.trim().to_lowercase())
            .unwrap_or(defaults.log_level);
        if !LOG_LEVELS.contains(&log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                var: "LOG_LEVEL".to_string(),
                reason: format!("Must be one of {}, got: {}", LOG_LEVELS.join(", "), log_level),
            });
        }

        Ok(Config {
            data_file,
            export_dir,
            default_format,
            log_level,
        })
    }

    /// Parse an environment variable as a non-empty path with a default value.
    fn parse_env_path(var_name: &str, default: PathBuf) -> ConfigResult<PathBuf> {
        match env::var(var_name) {
            Ok(val) if val.trim().is_empty() => Err(ConfigError::InvalidValue {
                var: var_name.to_string(),
                reason: "Cannot be empty".to_string(),
            }),
            Ok(val) => Ok(PathBuf::from(val.trim())),
            Err(_) => Ok(default),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_file: PathBuf::from("followup-data.json"),
            export_dir: PathBuf::from("."),
            default_format: InterchangeFormat::Csv,
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    const VARS: [&str; 4] = [
        "FOLLOWUP_DATA_FILE",
        "FOLLOWUP_EXPORT_DIR",
        "FOLLOWUP_DEFAULT_FORMAT",
        "LOG_LEVEL",
    ];

    // Sets env vars for one test and removes them again on drop
    struct EnvGuard {
        vars: Vec<String>,
    }

    impl EnvGuard {
        fn new() -> Self {
            for var in VARS {
                env::remove_var(var);
            }
            EnvGuard { vars: Vec::new() }
        }

        fn set(&mut self, key: &str, value: &str) {
            env::set_var(key, value);
            self.vars.push(key.to_string());
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for var in &self.vars {
                env::remove_var(var);
            }
        }
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.data_file, PathBuf::from("followup-data.json"));
        assert_eq!(config.export_dir, PathBuf::from("."));
        assert_eq!(config.default_format, InterchangeFormat::Csv);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    #[serial]
    fn test_config_from_env_valid() {
        let mut guard = EnvGuard::new();
        guard.set("FOLLOWUP_DATA_FILE", "/var/lib/followup/data.json");
        guard.set("FOLLOWUP_EXPORT_DIR", "/tmp/exports");
        guard.set("FOLLOWUP_DEFAULT_FORMAT", "XLSX");
        guard.set("LOG_LEVEL", "Debug");

        let config = Config::from_env().unwrap();
        assert_eq!(config.data_file, PathBuf::from("/var/lib/followup/data.json"));
        assert_eq!(config.export_dir, PathBuf::from("/tmp/exports"));
        assert_eq!(config.default_format, InterchangeFormat::Xlsx);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    #[serial]
    fn test_config_invalid_format() {
        let mut guard = EnvGuard::new();
        guard.set("FOLLOWUP_DEFAULT_FORMAT", "ods");

        match Config::from_env() {
            Err(ConfigError::InvalidValue { var, .. }) => {
                assert_eq!(var, "FOLLOWUP_DEFAULT_FORMAT")
            }
            other => panic!("Expected InvalidValue error, got: {:?}", other),
        }
    }

    #[test]
    #[serial]
    fn test_config_invalid_log_level() {
        let mut guard = EnvGuard::new();
        guard.set("LOG_LEVEL", "chatty");

        let result = Config::from_env();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { ref var, .. }) if var == "LOG_LEVEL"
        ));
    }

    #[test]
    #[serial]
    fn test_parse_env_path() {
        let mut guard = EnvGuard::new();
        guard.set("TEST_PATH", "  data/store.json ");
        guard.set("TEST_PATH_EMPTY", "   ");

        assert_eq!(
            Config::parse_env_path("TEST_PATH", PathBuf::from("x")).unwrap(),
            PathBuf::from("data/store.json")
        );
        assert_eq!(
            Config::parse_env_path("NONEXISTENT_PATH_VAR", PathBuf::from("x")).unwrap(),
            PathBuf::from("x")
        );
        assert!(Config::parse_env_path("TEST_PATH_EMPTY", PathBuf::from("x")).is_err());
    }
}
