//! Sensor port: the physical (or simulated) temperature/humidity driver.

use std::future::Future;

use sensorlink_domain::error::SensorError;
use sensorlink_domain::reading::Reading;

/// Produces one reading per call.
///
/// Implementations report a missing value as [`SensorError::NoData`] and
/// checksum/timing glitches as [`SensorError::Transient`]; the sampler skips
/// those ticks. [`SensorError::Unrecoverable`] stops the sampling loop.
pub trait Sensor {
    /// Take a single reading.
    fn read_once(&mut self) -> impl Future<Output = Result<Reading, SensorError>> + Send;
}
