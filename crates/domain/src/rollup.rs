//! Rollups: a coarser average over a range of stored window summaries.
//!
//! A rollup is a mean of per-window means: every stored summary weighs the
//! same regardless of how many raw samples produced it. The record is stored
//! under a key derived from the device id (`<id>#<label>`), so each run
//! replaces the previous rollup of that device.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::DeviceId;
use crate::stats::{mean, round2};
use crate::summary::WindowSummary;
use crate::time::{TimeRange, Timestamp};

/// Label of the default seven-day rollup.
pub const WEEKLY_LABEL: &str = "WEEKLY_AVG";

/// How far back a rollup looks and the label appended to its key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollupWindow {
    label: String,
    length: Duration,
}

impl RollupWindow {
    /// Build a rollup window.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyRollupLabel`] for a blank label and
    /// [`ValidationError::EmptyRollupWindow`] for a non-positive length.
    pub fn new(label: impl Into<String>, length: Duration) -> Result<Self, ValidationError> {
        let label = label.into();
        if label.trim().is_empty() {
            return Err(ValidationError::EmptyRollupLabel);
        }
        if length <= Duration::zero() {
            return Err(ValidationError::EmptyRollupWindow);
        }
        Ok(Self { label, length })
    }

    /// Seven days, labelled [`WEEKLY_LABEL`].
    #[must_use]
    pub fn weekly() -> Self {
        Self {
            label: WEEKLY_LABEL.to_string(),
            length: Duration::days(7),
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn length(&self) -> Duration {
        self.length
    }

    /// The range this window covers when the job runs at `now`.
    ///
    /// # Errors
    ///
    /// Propagates [`TimeRange::ending_at`] validation.
    pub fn range_ending_at(&self, now: Timestamp) -> Result<TimeRange, ValidationError> {
        TimeRange::ending_at(now, self.length)
    }
}

impl Default for RollupWindow {
    fn default() -> Self {
        Self::weekly()
    }
}

/// The persisted aggregate of one rollup run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollupRecord {
    /// Derived identity, e.g. `Raspberry_Device_1#WEEKLY_AVG`.
    #[serde(rename = "clientId")]
    pub key: String,
    /// End of the aggregated range.
    #[serde(with = "chrono::serde::ts_seconds")]
    pub timestamp: Timestamp,
    pub avg_temperature: f64,
    pub avg_humidity: f64,
    pub processed_item_count: u64,
}

/// Average `records` into a rollup for `device_id`.
///
/// Returns `None` when there is nothing to process.
#[must_use]
pub fn aggregate(
    device_id: &DeviceId,
    window: &RollupWindow,
    range_end: Timestamp,
    records: &[WindowSummary],
) -> Option<RollupRecord> {
    let avg_temperature = mean(records.iter().map(|r| r.avg_temperature))?;
    let avg_humidity = mean(records.iter().map(|r| r.avg_humidity))?;

    Some(RollupRecord {
        key: device_id.derived_key(window.label()),
        timestamp: range_end,
        avg_temperature: round2(avg_temperature),
        avg_humidity: round2(avg_humidity),
        processed_item_count: records.len() as u64,
    })
}
