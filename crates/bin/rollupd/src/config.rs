//! Configuration loading from a TOML file with environment variable overrides.
//!
//! Looks for `rollupd.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use serde::Deserialize;

use sensorlink_domain::error::ValidationError;
use sensorlink_domain::id::DeviceId;
use sensorlink_domain::rollup::{RollupWindow, WEEKLY_LABEL};

/// Longest rollup window accepted, in days.
const MAX_WINDOW_DAYS: u32 = 3_650;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Device whose summaries are rolled up.
    pub device: DeviceConfig,
    /// Database settings.
    pub database: DatabaseConfig,
    /// Rollup window.
    pub rollup: RollupConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Device selection.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub id: String,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Rollup window configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RollupConfig {
    /// Suffix of the rollup key (`<device>#<label>`).
    pub label: String,
    /// Days covered by one rollup, ending at invocation time.
    pub window_days: u32,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load configuration from `rollupd.toml` (if present), apply
    /// environment-variable overrides, then validate.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("rollupd.toml")?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("SENSORLINK_DEVICE_ID") {
            self.device.id = val;
        }
        if let Some(val) = lookup("SENSORLINK_DATABASE_URL") {
            self.database.url = val;
        }
        if let Some(val) = lookup("SENSORLINK_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = lookup("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.device_id()?;
        self.rollup_window()?;
        if self.rollup.window_days > MAX_WINDOW_DAYS {
            return Err(ConfigError::Validation(format!(
                "window_days must not exceed {MAX_WINDOW_DAYS}"
            )));
        }
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::Validation(
                "database url must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the device id.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyDeviceId`] for a blank id.
    pub fn device_id(&self) -> Result<DeviceId, ValidationError> {
        DeviceId::new(self.device.id.as_str())
    }

    /// Return the rollup window.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for a blank label or a zero-day window.
    pub fn rollup_window(&self) -> Result<RollupWindow, ValidationError> {
        RollupWindow::new(
            self.rollup.label.as_str(),
            chrono::Duration::days(i64::from(self.rollup.window_days)),
        )
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            id: "Raspberry_Device_1".to_string(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:sensorlink.db?mode=rwc".to_string(),
        }
    }
}

impl Default for RollupConfig {
    fn default() -> Self {
        Self {
            label: WEEKLY_LABEL.to_string(),
            window_days: 7,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "rollupd=info,sensorlink=info".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

impl From<ValidationError> for ConfigError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.device.id, "Raspberry_Device_1");
        assert_eq!(config.database_url(), "sqlite:sensorlink.db?mode=rwc");
        assert_eq!(config.rollup.label, "WEEKLY_AVG");
        assert_eq!(config.rollup.window_days, 7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_build_weekly_window_by_default() {
        let config = Config::default();
        assert_eq!(config.rollup_window().unwrap(), RollupWindow::weekly());
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [device]
            id = 'greenhouse-1'

            [database]
            url = 'sqlite:test.db'

            [rollup]
            label = 'DAILY_AVG'
            window_days = 1

            [logging]
            filter = 'debug'
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.device.id, "greenhouse-1");
        assert_eq!(config.database_url(), "sqlite:test.db");
        assert_eq!(config.logging.filter, "debug");

        let window = config.rollup_window().unwrap();
        assert_eq!(window.label(), "DAILY_AVG");
        assert_eq!(window.length(), chrono::Duration::days(1));
    }

    #[test]
    fn should_parse_partial_toml_with_defaults() {
        let toml = "
            [rollup]
            window_days = 30
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.rollup.window_days, 30);
        assert_eq!(config.rollup.label, "WEEKLY_AVG");
        assert_eq!(config.database_url(), "sqlite:sensorlink.db?mode=rwc");
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.rollup.window_days, 7);
    }

    #[test]
    fn should_apply_env_overrides() {
        let mut config = Config::default();
        config.apply_overrides(env(&[
            ("SENSORLINK_DEVICE_ID", "edge-7"),
            ("SENSORLINK_DATABASE_URL", "sqlite::memory:"),
            ("RUST_LOG", "warn"),
        ]));
        assert_eq!(config.device.id, "edge-7");
        assert_eq!(config.database_url(), "sqlite::memory:");
        assert_eq!(config.logging.filter, "warn");
    }

    #[test]
    fn should_reject_zero_day_window() {
        let mut config = Config::default();
        config.rollup.window_days = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_oversized_window() {
        let mut config = Config::default();
        config.rollup.window_days = MAX_WINDOW_DAYS + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_blank_label() {
        let mut config = Config::default();
        config.rollup.label = String::new();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn should_reject_blank_device_id() {
        let mut config = Config::default();
        config.device.id = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }
}
