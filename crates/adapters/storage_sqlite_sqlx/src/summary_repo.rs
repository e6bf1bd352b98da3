//! `SQLite` implementation of [`SummaryRepository`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use sensorlink_app::ports::storage::SummaryRepository;
use sensorlink_domain::error::SensorLinkError;
use sensorlink_domain::id::DeviceId;
use sensorlink_domain::summary::WindowSummary;
use sensorlink_domain::time::{TimeRange, from_epoch_secs};

use crate::error::StorageError;

/// Wrapper for converting database rows into domain types without polluting
/// domain structs with database concerns.
struct Wrapper(WindowSummary);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let client_id: String = row.try_get("client_id")?;
        let time_stamp: i64 = row.try_get("time_stamp")?;
        let temperature: f64 = row.try_get("temperature")?;
        let humidity: f64 = row.try_get("humidity")?;

        let device_id = DeviceId::new(client_id).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let timestamp = from_epoch_secs(time_stamp).ok_or_else(|| {
            sqlx::Error::Decode(Box::new(StorageError::TimestampOutOfRange(time_stamp)))
        })?;

        Ok(Self(WindowSummary {
            device_id,
            timestamp,
            avg_temperature: temperature,
            avg_humidity: humidity,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO window_summaries (client_id, time_stamp, temperature, humidity)
    VALUES (?, ?, ?, ?)
    ON CONFLICT (client_id, time_stamp) DO NOTHING
";

const SELECT_BY_DEVICE_IN_RANGE: &str = r"
    SELECT client_id, time_stamp, temperature, humidity FROM window_summaries
    WHERE client_id = ? AND time_stamp BETWEEN ? AND ?
    ORDER BY time_stamp ASC
";

/// `SQLite`-backed window summary repository.
pub struct SqliteSummaryRepository {
    pool: SqlitePool,
}

impl SqliteSummaryRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl SummaryRepository for SqliteSummaryRepository {
    async fn append(&self, summary: WindowSummary) -> Result<WindowSummary, SensorLinkError> {
        let result = sqlx::query(INSERT)
            .bind(summary.device_id.as_str())
            .bind(summary.timestamp.timestamp())
            .bind(summary.avg_temperature)
            .bind(summary.avg_humidity)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        if result.rows_affected() == 0 {
            tracing::debug!(
                device_id = %summary.device_id,
                timestamp = summary.timestamp.timestamp(),
                "duplicate window summary ignored"
            );
        }

        Ok(summary)
    }

    async fn find_by_device_in_range(
        &self,
        device_id: &DeviceId,
        range: TimeRange,
    ) -> Result<Vec<WindowSummary>, SensorLinkError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_BY_DEVICE_IN_RANGE)
            .bind(device_id.as_str())
            .bind(range.start().timestamp())
            .bind(range.end().timestamp())
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }
}
