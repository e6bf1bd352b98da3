//! Telemetry publisher: drains the sampler's outbox onto the transport.
//!
//! The publisher runs as its own task, fed by a bounded channel. The sampler
//! never waits on it: a slow or disconnected broker only delays this task.
//! Each summary is attempted until it is accepted or the [`RetryPolicy`] is
//! exhausted, then the publisher moves on to the next one.

use tokio::sync::mpsc;

use sensorlink_domain::summary::WindowSummary;

use crate::ports::{ConnectionEvent, Transport};
use crate::retry::RetryPolicy;

/// Result of publishing one summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The transport accepted the payload.
    Delivered {
        /// Attempts it took, including the successful one.
        attempts: u32,
    },
    /// Every attempt failed; the summary was discarded.
    Dropped {
        /// Attempts made before giving up.
        attempts: u32,
    },
}

/// Publishes window summaries with bounded retry.
pub struct TelemetryPublisher<T> {
    transport: T,
    policy: RetryPolicy,
    lifecycle: Option<mpsc::Receiver<ConnectionEvent>>,
}

impl<T: Transport> TelemetryPublisher<T> {
    /// Create a publisher over `transport`, retrying according to `policy`.
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self {
            transport,
            policy,
            lifecycle: None,
        }
    }

    /// Attach the transport's connection lifecycle channel. Events are logged
    /// as they arrive while idle and drained before every publish attempt.
    #[must_use]
    pub fn with_lifecycle(mut self, lifecycle: mpsc::Receiver<ConnectionEvent>) -> Self {
        self.lifecycle = Some(lifecycle);
        self
    }

    /// Consume summaries until every sender of `outbox` is dropped.
    pub async fn run(mut self, mut outbox: mpsc::Receiver<WindowSummary>) {
        loop {
            let summary = tokio::select! {
                summary = outbox.recv() => summary,
                Some(event) = next_event(self.lifecycle.as_mut()) => {
                    log_event(event);
                    continue;
                }
            };
            let Some(summary) = summary else {
                break;
            };
            self.publish(&summary).await;
        }
        self.drain_lifecycle();
        tracing::debug!("outbox closed, publisher stopped");
    }

    /// Publish one summary, retrying on transport failures.
    pub async fn publish(&mut self, summary: &WindowSummary) -> PublishOutcome {
        let payload = match summary.to_payload() {
            Ok(payload) => payload,
            Err(err) => {
                tracing::error!(%err, device_id = %summary.device_id, "failed to encode summary, dropping");
                return PublishOutcome::Dropped { attempts: 0 };
            }
        };

        let mut attempt = 1;
        loop {
            self.drain_lifecycle();

            match self.transport.publish(payload.clone()).await {
                Ok(()) => {
                    tracing::info!(
                        device_id = %summary.device_id,
                        timestamp = summary.timestamp.timestamp(),
                        temperature = summary.avg_temperature,
                        humidity = summary.avg_humidity,
                        attempt,
                        "window summary published"
                    );
                    return PublishOutcome::Delivered { attempts: attempt };
                }
                Err(err) if self.policy.should_retry(attempt) => {
                    let delay = self.policy.delay_after(attempt);
                    tracing::debug!(%err, attempt, ?delay, "publish failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    tracing::warn!(
                        %err,
                        attempts = attempt,
                        device_id = %summary.device_id,
                        timestamp = summary.timestamp.timestamp(),
                        "retries exhausted, dropping window summary"
                    );
                    return PublishOutcome::Dropped { attempts: attempt };
                }
            }
        }
    }

    fn drain_lifecycle(&mut self) {
        let Some(lifecycle) = self.lifecycle.as_mut() else {
            return;
        };
        while let Ok(event) = lifecycle.try_recv() {
            log_event(event);
        }
    }
}

// Pends forever without a lifecycle channel so `select!` only waits on the outbox.
async fn next_event(
    lifecycle: Option<&mut mpsc::Receiver<ConnectionEvent>>,
) -> Option<ConnectionEvent> {
    match lifecycle {
        Some(lifecycle) => lifecycle.recv().await,
        None => std::future::pending().await,
    }
}

fn log_event(event: ConnectionEvent) {
    match event {
        ConnectionEvent::Connected => tracing::info!("transport connected"),
        ConnectionEvent::ConnectFailed { reason } => {
            tracing::warn!(%reason, "transport connection failed");
        }
    }
}
