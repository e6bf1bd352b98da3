//! Configuration loading from a TOML file with environment variable overrides.
//!
//! Looks for `sensord.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::time::Duration;

use serde::Deserialize;

use sensorlink_adapter_mqtt::MqttConfig;
use sensorlink_adapter_virtual::VirtualSensorConfig;
use sensorlink_app::retry::RetryPolicy;
use sensorlink_domain::id::DeviceId;
use sensorlink_domain::window::WindowSize;

// One summary being retried plus the next one closed behind it.
const MIN_OUTBOX_CAPACITY: usize = 2;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Identity of this edge device.
    pub device: DeviceConfig,
    /// Sampling cadence and hand-off buffer.
    pub sampling: SamplingConfig,
    /// Simulated sensor signal.
    pub sensor: VirtualSensorConfig,
    /// Broker connection.
    pub mqtt: MqttConfig,
    /// Publish retry policy.
    pub retry: RetryPolicy,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Device identity.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Identifier stamped on every published summary.
    pub id: String,
}

/// Sampling configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Seconds between two sensor reads. Must divide into a minute at least once.
    pub interval_secs: u64,
    /// Summaries that may wait for the publisher. At least two: one being
    /// published and the one closed behind it.
    pub outbox_capacity: usize,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load configuration from `sensord.toml` (if present), apply
    /// environment-variable overrides, then validate.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("sensord.toml")?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.mqtt.resolve_identity(&config.device.id);
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
        if let Some(val) = lookup("SENSORLINK_INTERVAL_SECS")
            && let Ok(secs) = val.parse()
        {
            self.sampling.interval_secs = secs;
        }
        if let Some(val) = lookup("SENSORLINK_MQTT_HOST") {
            self.mqtt.broker_host = val;
        }
        if let Some(val) = lookup("SENSORLINK_MQTT_PORT")
            && let Ok(port) = val.parse()
        {
            self.mqtt.broker_port = port;
        }
        if let Some(val) = lookup("SENSORLINK_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = lookup("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        DeviceId::new(self.device.id.as_str())
            .map_err(|err| ConfigError::Validation(err.to_string()))?;
        let size = WindowSize::from_interval(self.interval())
            .map_err(|err| ConfigError::Validation(err.to_string()))?;
        if self.sampling.outbox_capacity < MIN_OUTBOX_CAPACITY {
            return Err(ConfigError::Validation(format!(
                "outbox capacity must be at least {MIN_OUTBOX_CAPACITY}"
            )));
        }
        let period = Duration::from_secs(
            self.sampling
                .interval_secs
                .saturating_mul(u64::try_from(size.get()).unwrap_or(u64::MAX)),
        );
        let backoff = self.retry.worst_case_delay();
        if backoff >= period {
            return Err(ConfigError::Validation(format!(
                "retry backoff of {backoff:?} does not fit in the {period:?} summary period"
            )));
        }
        if self.mqtt.broker_port == 0 {
            return Err(ConfigError::Validation(
                "broker port must be non-zero".to_string(),
            ));
        }
        if self.mqtt.topic().trim().is_empty() {
            return Err(ConfigError::Validation(
                "topic must not be empty".to_string(),
            ));
        }
        if self.mqtt.has_partial_tls() {
            return Err(ConfigError::Validation(
                "ca_path, cert_path and key_path must be set together".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the validated device id.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if the id is blank.
    pub fn device_id(&self) -> Result<DeviceId, ConfigError> {
        DeviceId::new(self.device.id.as_str()).map_err(|err| ConfigError::Validation(err.to_string()))
    }

    /// Return the sampling interval.
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.sampling.interval_secs)
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            id: "Raspberry_Device_1".to_string(),
        }
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            interval_secs: 5,
            outbox_capacity: 64,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "sensord=info,sensorlink=info,rumqttc=warn".to_string(),
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
        assert_eq!(config.sampling.interval_secs, 5);
        assert_eq!(config.sampling.outbox_capacity, 64);
        assert_eq!(config.mqtt.broker_port, 1883);
        assert_eq!(config.retry.max_attempts, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.sampling.interval_secs, 5);
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [device]
            id = 'greenhouse-1'

            [sampling]
            interval_secs = 10
            outbox_capacity = 8

            [sensor]
            base_temperature = 18.5
            fault_every = 4

            [mqtt]
            broker_host = 'broker.local'
            broker_port = 8883
            topic = 'greenhouse-1/telemetry'

            [retry]
            max_attempts = 3
            initial_delay_ms = 100

            [logging]
            filter = 'debug'
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.device.id, "greenhouse-1");
        assert_eq!(config.sampling.interval_secs, 10);
        assert_eq!(config.sampling.outbox_capacity, 8);
        assert!((config.sensor.base_temperature - 18.5).abs() < f64::EPSILON);
        assert_eq!(config.sensor.fault_every, 4);
        assert_eq!(config.mqtt.broker_host, "broker.local");
        assert_eq!(config.mqtt.broker_port, 8883);
        assert_eq!(config.mqtt.topic(), "greenhouse-1/telemetry");
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.initial_delay_ms, 100);
        assert_eq!(config.retry.max_delay_ms, 30_000);
        assert_eq!(config.logging.filter, "debug");
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.sampling.interval_secs, 5);
    }

    #[test]
    fn should_apply_env_overrides() {
        let mut config = Config::default();
        config.apply_overrides(env(&[
            ("SENSORLINK_DEVICE_ID", "edge-7"),
            ("SENSORLINK_INTERVAL_SECS", "15"),
            ("SENSORLINK_MQTT_HOST", "10.0.0.2"),
            ("SENSORLINK_MQTT_PORT", "8883"),
            ("SENSORLINK_LOG", "trace"),
        ]));
        assert_eq!(config.device.id, "edge-7");
        assert_eq!(config.sampling.interval_secs, 15);
        assert_eq!(config.mqtt.broker_host, "10.0.0.2");
        assert_eq!(config.mqtt.broker_port, 8883);
        assert_eq!(config.logging.filter, "trace");
    }

    #[test]
    fn should_prefer_rust_log_over_sensorlink_log() {
        let mut config = Config::default();
        config.apply_overrides(env(&[("SENSORLINK_LOG", "trace"), ("RUST_LOG", "warn")]));
        assert_eq!(config.logging.filter, "warn");
    }

    #[test]
    fn should_ignore_unparsable_numeric_overrides() {
        let mut config = Config::default();
        config.apply_overrides(env(&[
            ("SENSORLINK_INTERVAL_SECS", "fast"),
            ("SENSORLINK_MQTT_PORT", "not-a-port"),
        ]));
        assert_eq!(config.sampling.interval_secs, 5);
        assert_eq!(config.mqtt.broker_port, 1883);
    }

    #[test]
    fn should_reject_blank_device_id() {
        let mut config = Config::default();
        config.device.id = "  ".to_string();
        assert!(config.validate().is_err());
        assert!(config.device_id().is_err());
    }

    #[test]
    fn should_reject_interval_longer_than_a_minute() {
        let mut config = Config::default();
        config.sampling.interval_secs = 61;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_zero_interval() {
        let mut config = Config::default();
        config.sampling.interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_outbox_capacity_below_two() {
        let mut config = Config::default();
        config.sampling.outbox_capacity = 0;
        assert!(config.validate().is_err());
        config.sampling.outbox_capacity = 1;
        assert!(config.validate().is_err());
        config.sampling.outbox_capacity = 2;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_reject_retry_policy_outlasting_summary_period() {
        let mut config = Config::default();
        config.retry = RetryPolicy {
            max_attempts: 4,
            initial_delay_ms: 20_000,
            max_delay_ms: 30_000,
            multiplier: 2,
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(msg) if msg.contains("retry backoff")));
    }

    #[test]
    fn should_accept_default_retry_policy_within_summary_period() {
        let config = Config::default();
        assert!(config.retry.worst_case_delay() < Duration::from_secs(60));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_derive_mqtt_identity_from_overridden_device_id() {
        let mut config = Config::default();
        config.apply_overrides(env(&[("SENSORLINK_DEVICE_ID", "edge-7")]));
        config.mqtt.resolve_identity(&config.device.id);
        assert_eq!(config.mqtt.client_id(), "edge-7");
        assert_eq!(config.mqtt.topic(), "edge-7/test");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_keep_explicit_topic_when_device_id_changes() {
        let mut config: Config = toml::from_str(
            "
            [device]
            id = 'greenhouse-1'

            [mqtt]
            topic = 'site/a/telemetry'
            ",
        )
        .unwrap();
        config.mqtt.resolve_identity(&config.device.id);
        assert_eq!(config.mqtt.client_id(), "greenhouse-1");
        assert_eq!(config.mqtt.topic(), "site/a/telemetry");
    }

    #[test]
    fn should_reject_zero_broker_port() {
        let mut config = Config::default();
        config.mqtt.broker_port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_partial_tls_configuration() {
        let mut config = Config::default();
        config.mqtt.ca_path = Some("root-ca.pem".into());
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }
}
