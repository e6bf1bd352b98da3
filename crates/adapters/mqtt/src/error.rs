//! MQTT adapter error types.

use std::path::PathBuf;

use sensorlink_domain::error::SensorLinkError;

/// Errors specific to the MQTT adapter.
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    /// The broker has not acknowledged a connection yet, or the connection
    /// was lost.
    #[error("MQTT client not connected")]
    NotConnected,

    /// The rumqttc client returned an error.
    #[error("MQTT client error")]
    Client(#[source] rumqttc::ClientError),

    /// A TLS certificate or key file could not be read.
    #[error("failed to read TLS file {}", path.display())]
    TlsFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MqttError {
    /// Convert into a [`SensorLinkError::Transport`] for propagation across
    /// port boundaries.
    pub fn into_domain(self) -> SensorLinkError {
        SensorLinkError::Transport(Box::new(self))
    }
}

impl From<MqttError> for SensorLinkError {
    fn from(err: MqttError) -> Self {
        err.into_domain()
    }
}
