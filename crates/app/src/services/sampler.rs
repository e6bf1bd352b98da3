//! Edge sampler loop. Reads the sensor, buffers, closes the window and hands off.
//!
//! One tick is strictly sequential: read the sensor, append the reading,
//! close the window if it is full and push the summary into the publisher's
//! outbox with `try_send`. Nothing in a tick waits on the transport.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::MissedTickBehavior;

use sensorlink_domain::error::{SensorError, SensorLinkError, ValidationError};
use sensorlink_domain::id::DeviceId;
use sensorlink_domain::summary::WindowSummary;
use sensorlink_domain::time::now;
use sensorlink_domain::window::{WindowBuffer, WindowSize};

use crate::ports::Sensor;

/// What a single tick did.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// No usable reading this tick; the buffer is unchanged.
    Skipped,
    /// The reading was appended; the window is still open.
    Buffered {
        /// Readings now in the buffer.
        len: usize,
    },
    /// The reading completed the window, which was reduced and handed off.
    Closed(WindowSummary),
}

/// Samples one sensor on a fixed interval and reduces readings into
/// per-minute window summaries.
pub struct Sampler<S> {
    sensor: S,
    device_id: DeviceId,
    interval: Duration,
    window: WindowBuffer,
    outbox: mpsc::Sender<WindowSummary>,
}

impl<S: Sensor> Sampler<S> {
    /// Create a sampler whose window size is derived from `interval`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidInterval`] when `interval` does not
    /// fit at least once into a minute.
    pub fn new(
        sensor: S,
        device_id: DeviceId,
        interval: Duration,
        outbox: mpsc::Sender<WindowSummary>,
    ) -> Result<Self, ValidationError> {
        let size = WindowSize::from_interval(interval)?;
        Ok(Self {
            sensor,
            device_id,
            interval,
            window: WindowBuffer::new(size),
            outbox,
        })
    }

    /// Readings currently buffered.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.window.len()
    }

    /// Readings per window.
    #[must_use]
    pub fn window_size(&self) -> WindowSize {
        self.window.size()
    }

    /// Run ticks every `interval` until the sensor fails unrecoverably.
    ///
    /// # Errors
    ///
    /// Returns [`SensorLinkError::Sensor`] with the unrecoverable cause.
    pub async fn run(&mut self) -> Result<(), SensorLinkError> {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            device_id = %self.device_id,
            interval_secs = self.interval.as_secs(),
            window_size = self.window.size().get(),
            "sampling started"
        );

        loop {
            ticker.tick().await;
            if let Err(err) = self.tick().await {
                tracing::error!(%err, device_id = %self.device_id, "sensor failed, stopping sampling");
                return Err(err);
            }
        }
    }

    /// Perform one tick.
    ///
    /// # Errors
    ///
    /// Returns [`SensorLinkError::Sensor`] only for unrecoverable sensor
    /// failures; transient faults and invalid readings yield
    /// [`TickOutcome::Skipped`].
    pub async fn tick(&mut self) -> Result<TickOutcome, SensorLinkError> {
        let reading = match self.sensor.read_once().await {
            Ok(reading) => reading,
            Err(SensorError::NoData) => {
                tracing::warn!("sensor returned no data, skipping tick");
                return Ok(TickOutcome::Skipped);
            }
            Err(err) if err.is_recoverable() => {
                tracing::warn!(%err, "sensor reading error, skipping tick");
                return Ok(TickOutcome::Skipped);
            }
            Err(err) => return Err(err.into()),
        };

        if let Err(err) = reading.validate() {
            tracing::warn!(%err, "discarding invalid reading");
            return Ok(TickOutcome::Skipped);
        }

        let len = self.window.push(reading)?;
        tracing::debug!(
            temperature = reading.temperature,
            humidity = reading.humidity,
            "reading {len}/{}",
            self.window.size().get()
        );

        match self.window.close(&self.device_id, now()) {
            Some(summary) => {
                self.hand_off(summary.clone());
                Ok(TickOutcome::Closed(summary))
            }
            None => Ok(TickOutcome::Buffered { len }),
        }
    }

    fn hand_off(&self, summary: WindowSummary) {
        match self.outbox.try_send(summary) {
            Ok(()) => tracing::debug!("window summary queued for publishing"),
            Err(TrySendError::Full(summary)) => tracing::warn!(
                timestamp = summary.timestamp.timestamp(),
                "publisher outbox full, dropping window summary"
            ),
            Err(TrySendError::Closed(summary)) => tracing::warn!(
                timestamp = summary.timestamp.timestamp(),
                "publisher stopped, dropping window summary"
            ),
        }
    }
}
