//! MQTT transport configuration.

use std::path::PathBuf;

use serde::Deserialize;

const DEFAULT_CLIENT_ID: &str = "Raspberry_Device_1";
const DEFAULT_TOPIC: &str = "Raspberry_Device_1/test";

/// Configuration for the MQTT transport.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// MQTT broker hostname or IP address.
    pub broker_host: String,
    /// MQTT broker port.
    pub broker_port: u16,
    /// MQTT client identifier. Follows the device id when unset.
    pub client_id: Option<String>,
    /// Topic window summaries are published to. `<device id>/test` when unset.
    pub topic: Option<String>,
    /// Keep-alive interval in seconds.
    pub keep_alive_secs: u16,
    /// CA certificate (PEM) used to verify the broker.
    pub ca_path: Option<PathBuf>,
    /// Client certificate (PEM) presented to the broker.
    pub cert_path: Option<PathBuf>,
    /// Private key (PEM) matching `cert_path`.
    pub key_path: Option<PathBuf>,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker_host: "localhost".to_string(),
            broker_port: 1883,
            client_id: None,
            topic: None,
            keep_alive_secs: 30,
            ca_path: None,
            cert_path: None,
            key_path: None,
        }
    }
}

/// File paths for a mutual-TLS connection.
#[derive(Debug, Clone, Copy)]
pub struct TlsPaths<'a> {
    pub ca: &'a std::path::Path,
    pub cert: &'a std::path::Path,
    pub key: &'a std::path::Path,
}

impl MqttConfig {
    /// Fill the client id and topic from `device_id` where they were not
    /// set explicitly.
    pub fn resolve_identity(&mut self, device_id: &str) {
        self.client_id.get_or_insert_with(|| device_id.to_string());
        self.topic.get_or_insert_with(|| format!("{device_id}/test"));
    }

    /// Client identifier presented to the broker.
    #[must_use]
    pub fn client_id(&self) -> &str {
        self.client_id.as_deref().unwrap_or(DEFAULT_CLIENT_ID)
    }

    /// Topic summaries are published to.
    #[must_use]
    pub fn topic(&self) -> &str {
        self.topic.as_deref().unwrap_or(DEFAULT_TOPIC)
    }

    /// TLS material, when all three paths are configured.
    #[must_use]
    pub fn tls(&self) -> Option<TlsPaths<'_>> {
        match (&self.ca_path, &self.cert_path, &self.key_path) {
            (Some(ca), Some(cert), Some(key)) => Some(TlsPaths { ca, cert, key }),
            _ => None,
        }
    }

    /// Whether some, but not all, TLS paths are set.
    #[must_use]
    pub fn has_partial_tls(&self) -> bool {
        let set = [&self.ca_path, &self.cert_path, &self.key_path]
            .into_iter()
            .filter(|path| path.is_some())
            .count();
        set != 0 && set != 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_have_sensible_defaults() {
        let config = MqttConfig::default();
        assert_eq!(config.broker_host, "localhost");
        assert_eq!(config.broker_port, 1883);
        assert_eq!(config.client_id(), "Raspberry_Device_1");
        assert_eq!(config.topic(), "Raspberry_Device_1/test");
        assert_eq!(config.keep_alive_secs, 30);
        assert!(config.tls().is_none());
    }

    #[test]
    fn should_deserialize_from_toml() {
        let toml = r#"
            broker_host = "broker.example.com"
            broker_port = 8883
            client_id = "greenhouse"
            topic = "greenhouse/telemetry"
            keep_alive_secs = 60
            ca_path = "/etc/sensorlink/root-ca.pem"
            cert_path = "/etc/sensorlink/device.pem.crt"
            key_path = "/etc/sensorlink/private.pem.key"
        "#;
        let config: MqttConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.broker_host, "broker.example.com");
        assert_eq!(config.broker_port, 8883);
        assert_eq!(config.client_id(), "greenhouse");
        assert_eq!(config.topic(), "greenhouse/telemetry");
        assert_eq!(config.keep_alive_secs, 60);

        let tls = config.tls().unwrap();
        assert_eq!(tls.ca, std::path::Path::new("/etc/sensorlink/root-ca.pem"));
        assert_eq!(tls.key, std::path::Path::new("/etc/sensorlink/private.pem.key"));
    }

    #[test]
    fn should_use_defaults_for_missing_fields() {
        let toml = r#"broker_host = "192.168.1.100""#;
        let config: MqttConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.broker_host, "192.168.1.100");
        assert_eq!(config.broker_port, 1883);
        assert_eq!(config.topic(), "Raspberry_Device_1/test");
    }

    #[test]
    fn should_derive_identity_from_device_id_when_unset() {
        let mut config = MqttConfig::default();
        config.resolve_identity("greenhouse-3");
        assert_eq!(config.client_id(), "greenhouse-3");
        assert_eq!(config.topic(), "greenhouse-3/test");
    }

    #[test]
    fn should_keep_explicit_identity_when_resolving() {
        let mut config = MqttConfig {
            client_id: Some("bridge".to_string()),
            topic: Some("site/a/telemetry".to_string()),
            ..MqttConfig::default()
        };
        config.resolve_identity("greenhouse-3");
        assert_eq!(config.client_id(), "bridge");
        assert_eq!(config.topic(), "site/a/telemetry");
    }

    #[test]
    fn should_detect_partial_tls_when_key_is_missing() {
        let config = MqttConfig {
            ca_path: Some("ca.pem".into()),
            cert_path: Some("cert.pem".into()),
            ..MqttConfig::default()
        };
        assert!(config.tls().is_none());
        assert!(config.has_partial_tls());
    }

    #[test]
    fn should_not_flag_partial_tls_when_nothing_is_set() {
        assert!(!MqttConfig::default().has_partial_tls());
    }
}
