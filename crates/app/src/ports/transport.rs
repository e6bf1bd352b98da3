//! Transport port: publish/subscribe link from the edge device to the broker.

use std::future::Future;

use sensorlink_domain::error::SensorLinkError;

/// Publishes encoded payloads with an at-least-once guarantee.
///
/// `publish` returns once the transport has accepted the message for
/// delivery; it must not block waiting for the broker to come back. A
/// rejected publish is reported as [`SensorLinkError::Transport`] and retried
/// by the caller's policy.
pub trait Transport {
    fn publish(&self, payload: Vec<u8>) -> impl Future<Output = Result<(), SensorLinkError>> + Send;
}

/// Connection lifecycle notifications emitted by a transport.
///
/// These are informational: the publisher logs them but its retry policy is
/// what reacts to an unavailable link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// The broker accepted the connection.
    Connected,
    /// A connection attempt failed or an established link dropped.
    ConnectFailed {
        /// Human-readable cause reported by the client library.
        reason: String,
    },
}
