//! # sensorlink-adapter-mqtt
//!
//! MQTT transport for window summaries, built on `rumqttc`.
//!
//! ## Responsibilities
//! - Connect to the broker, optionally over mutual TLS
//! - Drive the rumqttc event loop in a background task
//! - Report connection lifecycle events over a channel
//! - Publish payloads with QoS 1 (at-least-once)
//!
//! ## Dependency rule
//! Same as other adapters: depends on `sensorlink-app` and `sensorlink-domain`.

mod config;
mod error;
mod transport;

pub use config::{MqttConfig, TlsPaths};
pub use error::MqttError;
pub use transport::{EventLoopTask, MqttConnection, MqttTransport};
