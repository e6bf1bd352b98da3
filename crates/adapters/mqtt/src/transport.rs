//! rumqttc-backed [`Transport`] with a background event loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS, TlsConfiguration};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use sensorlink_app::ports::{ConnectionEvent, Transport};
use sensorlink_domain::error::SensorLinkError;

use crate::config::{MqttConfig, TlsPaths};
use crate::error::MqttError;

/// Requests buffered between the client handle and the event loop.
const REQUEST_CAPACITY: usize = 32;
const LIFECYCLE_CAPACITY: usize = 16;
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Publishes payloads to a single topic.
///
/// Cloning is cheap; all clones share the same broker connection.
#[derive(Clone)]
pub struct MqttTransport {
    client: AsyncClient,
    topic: String,
    connected: Arc<AtomicBool>,
}

/// Handle to the background task polling the rumqttc event loop.
pub struct EventLoopTask {
    handle: JoinHandle<()>,
}

/// Everything [`MqttTransport::connect`] hands back to the caller.
pub struct MqttConnection {
    pub transport: MqttTransport,
    /// Connection lifecycle events, meant for the telemetry publisher.
    pub lifecycle: mpsc::Receiver<ConnectionEvent>,
    pub event_loop: EventLoopTask,
}

impl MqttTransport {
    /// Configure the client and spawn its event loop.
    ///
    /// The broker connection is established asynchronously; publishing is
    /// refused with [`MqttError::NotConnected`] until the broker acknowledges
    /// it. Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`MqttError::TlsFile`] if TLS material cannot be read.
    pub fn connect(config: &MqttConfig) -> Result<MqttConnection, MqttError> {
        let options = mqtt_options(config)?;
        let (client, event_loop) = AsyncClient::new(options, REQUEST_CAPACITY);
        let connected = Arc::new(AtomicBool::new(false));
        let (events_tx, events_rx) = mpsc::channel(LIFECYCLE_CAPACITY);

        tracing::info!(
            host = %config.broker_host,
            port = config.broker_port,
            client_id = config.client_id(),
            tls = config.tls().is_some(),
            "connecting to MQTT broker"
        );

        let handle = tokio::spawn(drive(event_loop, Arc::clone(&connected), events_tx));

        Ok(MqttConnection {
            transport: Self {
                client,
                topic: config.topic().to_string(),
                connected,
            },
            lifecycle: events_rx,
            event_loop: EventLoopTask { handle },
        })
    }

    /// Whether the broker has acknowledged the current connection.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Queue a graceful disconnect behind any pending publishes.
    ///
    /// # Errors
    ///
    /// Returns [`MqttError::Client`] if the event loop is already gone.
    pub async fn disconnect(&self) -> Result<(), MqttError> {
        self.client.disconnect().await.map_err(MqttError::Client)
    }
}

impl Transport for MqttTransport {
    async fn publish(&self, payload: Vec<u8>) -> Result<(), SensorLinkError> {
        if !self.is_connected() {
            return Err(MqttError::NotConnected.into());
        }
        self.client
            .try_publish(self.topic.as_str(), QoS::AtLeastOnce, false, payload)
            .map_err(MqttError::Client)?;
        Ok(())
    }
}

impl EventLoopTask {
    /// Wait for the event loop to stop after a disconnect, aborting it if it
    /// takes longer than `timeout`.
    pub async fn join(self, timeout: Duration) {
        let mut handle = self.handle;
        if tokio::time::timeout(timeout, &mut handle).await.is_err() {
            tracing::warn!(?timeout, "MQTT event loop did not stop in time, aborting");
            handle.abort();
        }
    }
}

fn mqtt_options(config: &MqttConfig) -> Result<MqttOptions, MqttError> {
    let mut options = MqttOptions::new(
        config.client_id(),
        config.broker_host.as_str(),
        config.broker_port,
    );
    options.set_keep_alive(Duration::from_secs(u64::from(config.keep_alive_secs)));

    if let Some(paths) = config.tls() {
        options.set_transport(rumqttc::Transport::Tls(tls_configuration(paths)?));
    }

    Ok(options)
}

fn tls_configuration(paths: TlsPaths<'_>) -> Result<TlsConfiguration, MqttError> {
    let read = |path: &std::path::Path| {
        std::fs::read(path).map_err(|source| MqttError::TlsFile {
            path: path.to_path_buf(),
            source,
        })
    };

    Ok(TlsConfiguration::Simple {
        ca: read(paths.ca)?,
        alpn: None,
        client_auth: Some((read(paths.cert)?, read(paths.key)?)),
    })
}

async fn drive(
    mut event_loop: EventLoop,
    connected: Arc<AtomicBool>,
    events: mpsc::Sender<ConnectionEvent>,
) {
    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                connected.store(true, Ordering::Release);
                notify(&events, ConnectionEvent::Connected);
            }
            Ok(Event::Incoming(Packet::PubAck(ack))) => {
                tracing::trace!(pkid = ack.pkid, "publish acknowledged");
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                connected.store(false, Ordering::Release);
                tracing::info!("disconnected from MQTT broker");
                return;
            }
            Ok(_) => {}
            Err(err) => {
                connected.store(false, Ordering::Release);
                notify(
                    &events,
                    ConnectionEvent::ConnectFailed {
                        reason: err.to_string(),
                    },
                );
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
    }
}

// The event loop never waits on the publisher; events are dropped when the channel is full.
fn notify(events: &mpsc::Sender<ConnectionEvent>, event: ConnectionEvent) {
    match events.try_send(event) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(event)) => {
            tracing::warn!(?event, "lifecycle channel full, event dropped");
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            tracing::debug!("lifecycle receiver gone, event dropped");
        }
    }
}
