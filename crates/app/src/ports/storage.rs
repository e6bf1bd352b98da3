//! Storage port: repository traits for the time-series store.
//!
//! Window summaries are partitioned by device id and sorted by their
//! epoch-second timestamp. Rollups are keyed by their derived key only, so a
//! write always replaces the previous rollup of that device.

use std::future::Future;

use sensorlink_domain::error::SensorLinkError;
use sensorlink_domain::id::DeviceId;
use sensorlink_domain::rollup::RollupRecord;
use sensorlink_domain::summary::WindowSummary;
use sensorlink_domain::time::TimeRange;

/// Append-only store of window summaries.
pub trait SummaryRepository {
    /// Store a summary. Appending a `(device, timestamp)` pair that already
    /// exists keeps the first copy and succeeds.
    fn append(
        &self,
        summary: WindowSummary,
    ) -> impl Future<Output = Result<WindowSummary, SensorLinkError>> + Send;

    /// All summaries of `device_id` with `range.start() <= timestamp <= range.end()`,
    /// oldest first. An empty result is not an error.
    fn find_by_device_in_range(
        &self,
        device_id: &DeviceId,
        range: TimeRange,
    ) -> impl Future<Output = Result<Vec<WindowSummary>, SensorLinkError>> + Send;
}

/// Keyed store of rollup records.
pub trait RollupRepository {
    /// Insert or overwrite the record stored under `record.key`, atomically.
    fn upsert(
        &self,
        record: RollupRecord,
    ) -> impl Future<Output = Result<RollupRecord, SensorLinkError>> + Send;

    /// Fetch the record stored under `key`.
    fn get_by_key(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<RollupRecord>, SensorLinkError>> + Send;
}
