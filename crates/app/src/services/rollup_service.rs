//! Rollup service: query a range of window summaries, average them and
//! write the aggregate back under the device's derived key.
//!
//! A run is a single pass with no state carried between runs. Two runs for
//! the same device racing each other both upsert the same key; the last
//! write wins. That race is accepted and not guarded against.

use std::error::Error as _;

use serde::Serialize;

use sensorlink_domain::error::SensorLinkError;
use sensorlink_domain::id::DeviceId;
use sensorlink_domain::rollup::{self, RollupRecord, RollupWindow};
use sensorlink_domain::summary::WindowSummary;
use sensorlink_domain::time::{TimeRange, Timestamp};

use crate::ports::{RollupRepository, SummaryRepository};

/// Outcome class of one rollup invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// A rollup was computed and written.
    Success,
    /// The range held no summaries; nothing was written.
    NoData,
    /// The query or the write failed.
    Error,
}

impl JobStatus {
    /// HTTP-style status code reported to the invoking environment.
    #[must_use]
    pub fn status_code(self) -> u16 {
        match self {
            Self::Success => 200,
            Self::NoData => 204,
            Self::Error => 500,
        }
    }
}

/// Status plus a human-readable message, as returned to the invoker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobReport {
    pub status: JobStatus,
    pub status_code: u16,
    pub message: String,
    /// The record written by a successful run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rollup: Option<RollupRecord>,
}

impl JobReport {
    fn new(status: JobStatus, message: impl Into<String>, rollup: Option<RollupRecord>) -> Self {
        Self {
            status,
            status_code: status.status_code(),
            message: message.into(),
            rollup,
        }
    }

    /// Report for a run that ended with `err`, including its source chain.
    #[must_use]
    pub fn failed(err: &SensorLinkError) -> Self {
        let mut message = format!("error processing data: {err}");
        let mut source = err.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Self::new(JobStatus::Error, message, None)
    }
}

/// Computes and stores the rollup of one device.
pub struct RollupService<S, R> {
    summaries: S,
    rollups: R,
    device_id: DeviceId,
    window: RollupWindow,
}

impl<S: SummaryRepository, R: RollupRepository> RollupService<S, R> {
    /// Create a service for `device_id` over the given repositories.
    pub fn new(summaries: S, rollups: R, device_id: DeviceId, window: RollupWindow) -> Self {
        Self {
            summaries,
            rollups,
            device_id,
            window,
        }
    }

    /// Fetch all stored summaries of `device_id` inside `range` (bounds included).
    ///
    /// # Errors
    ///
    /// Returns [`SensorLinkError::Storage`] when the query fails. An empty
    /// range is `Ok(vec![])`.
    pub async fn fetch_range(
        &self,
        device_id: &DeviceId,
        range: TimeRange,
    ) -> Result<Vec<WindowSummary>, SensorLinkError> {
        self.summaries.find_by_device_in_range(device_id, range).await
    }

    /// Upsert `record` under its derived key. No retry happens here.
    ///
    /// # Errors
    ///
    /// Returns [`SensorLinkError::Storage`] when the write fails.
    pub async fn write(&self, record: RollupRecord) -> Result<RollupRecord, SensorLinkError> {
        self.rollups.upsert(record).await
    }

    /// Run one rollup over the window ending at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`SensorLinkError`] when the range cannot be built or the
    /// store fails; an empty range is reported as [`JobStatus::NoData`].
    pub async fn run(&self, now: Timestamp) -> Result<JobReport, SensorLinkError> {
        let range = self.window.range_ending_at(now)?;

        tracing::info!(
            device_id = %self.device_id,
            start = range.start().timestamp(),
            end = range.end().timestamp(),
            label = self.window.label(),
            "fetching window summaries"
        );

        let records = self.fetch_range(&self.device_id, range).await?;

        let Some(record) = rollup::aggregate(&self.device_id, &self.window, range.end(), &records)
        else {
            tracing::info!(device_id = %self.device_id, "no data found for the specified time range");
            return Ok(JobReport::new(JobStatus::NoData, "No data to process.", None));
        };

        tracing::info!(
            count = record.processed_item_count,
            avg_temperature = record.avg_temperature,
            avg_humidity = record.avg_humidity,
            key = %record.key,
            "rollup computed"
        );

        let written = self.write(record).await?;

        Ok(JobReport::new(
            JobStatus::Success,
            format!(
                "{} averages calculated and stored successfully.",
                self.window.label()
            ),
            Some(written),
        ))
    }
}
