//! Window summary: the per-minute average published by the edge device.
//!
//! The serialized form is the wire payload and, once ingested, the stored
//! record:
//!
//! ```json
//! {"clientId":"Raspberry_Device_1","timeStamp":1700000000,"temperature":21.0,"humidity":51.0}
//! ```

use serde::{Deserialize, Serialize};

use crate::id::DeviceId;
use crate::stats::round2;
use crate::time::Timestamp;

/// Averages of one closed window, stamped with the window close time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSummary {
    #[serde(rename = "clientId")]
    pub device_id: DeviceId,
    #[serde(rename = "timeStamp", with = "chrono::serde::ts_seconds")]
    pub timestamp: Timestamp,
    #[serde(rename = "temperature")]
    pub avg_temperature: f64,
    #[serde(rename = "humidity")]
    pub avg_humidity: f64,
}

impl WindowSummary {
    /// Build a summary, rounding both averages to two decimals.
    #[must_use]
    pub fn new(
        device_id: DeviceId,
        timestamp: Timestamp,
        avg_temperature: f64,
        avg_humidity: f64,
    ) -> Self {
        Self {
            device_id,
            timestamp,
            avg_temperature: round2(avg_temperature),
            avg_humidity: round2(avg_humidity),
        }
    }

    /// Encode the canonical JSON payload sent over the transport.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if encoding fails.
    pub fn to_payload(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
