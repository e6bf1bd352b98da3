//! `SQLite` implementation of [`RollupRepository`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use sensorlink_app::ports::storage::RollupRepository;
use sensorlink_domain::error::SensorLinkError;
use sensorlink_domain::rollup::RollupRecord;
use sensorlink_domain::time::from_epoch_secs;

use crate::error::StorageError;

struct Wrapper(RollupRecord);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let key: String = row.try_get("client_id")?;
        let secs: i64 = row.try_get("timestamp")?;
        let avg_temperature: f64 = row.try_get("avg_temperature")?;
        let avg_humidity: f64 = row.try_get("avg_humidity")?;
        let count: i64 = row.try_get("processed_item_count")?;

        let timestamp = from_epoch_secs(secs).ok_or_else(|| {
            sqlx::Error::Decode(Box::new(StorageError::TimestampOutOfRange(secs)))
        })?;
        let processed_item_count = u64::try_from(count)
            .map_err(|_| sqlx::Error::Decode(Box::new(StorageError::NegativeCount(count))))?;

        Ok(Self(RollupRecord {
            key,
            timestamp,
            avg_temperature,
            avg_humidity,
            processed_item_count,
        }))
    }
}

// Single statement, so readers never observe a half-written rollup.
const UPSERT: &str = r"
    INSERT INTO rollups (client_id, timestamp, avg_temperature, avg_humidity, processed_item_count)
    VALUES (?, ?, ?, ?, ?)
    ON CONFLICT (client_id) DO UPDATE SET
        timestamp = excluded.timestamp,
        avg_temperature = excluded.avg_temperature,
        avg_humidity = excluded.avg_humidity,
        processed_item_count = excluded.processed_item_count
";

const SELECT_BY_KEY: &str = r"
    SELECT client_id, timestamp, avg_temperature, avg_humidity, processed_item_count
    FROM rollups WHERE client_id = ?
";

/// `SQLite`-backed rollup repository.
pub struct SqliteRollupRepository {
    pool: SqlitePool,
}

impl SqliteRollupRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl RollupRepository for SqliteRollupRepository {
    async fn upsert(&self, record: RollupRecord) -> Result<RollupRecord, SensorLinkError> {
        let count = i64::try_from(record.processed_item_count).unwrap_or(i64::MAX);

        sqlx::query(UPSERT)
            .bind(&record.key)
            .bind(record.timestamp.timestamp())
            .bind(record.avg_temperature)
            .bind(record.avg_humidity)
            .bind(count)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(record)
    }

    async fn get_by_key(&self, key: &str) -> Result<Option<RollupRecord>, SensorLinkError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_KEY)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(row.map(|w| w.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Config;

    async fn setup() -> SqliteRollupRepository {
        let db = Config::in_memory().build().await.unwrap();
        SqliteRollupRepository::new(db.pool().clone())
    }

    fn record(secs: i64, avg_temperature: f64, count: u64) -> RollupRecord {
        RollupRecord {
            key: "Raspberry_Device_1#WEEKLY_AVG".to_string(),
            timestamp: from_epoch_secs(secs).unwrap(),
            avg_temperature,
            avg_humidity: 48.5,
            processed_item_count: count,
        }
    }

    #[tokio::test]
    async fn should_insert_and_read_back_rollup() {
        let repo = setup().await;
        let written = repo.upsert(record(1_000, 22.0, 3)).await.unwrap();

        let found = repo
            .get_by_key("Raspberry_Device_1#WEEKLY_AVG")
            .await
            .unwrap();

        assert_eq!(found, Some(written));
    }

    #[tokio::test]
    async fn should_overwrite_rollup_with_same_key() {
        let repo = setup().await;
        repo.upsert(record(1_000, 22.0, 3)).await.unwrap();
        repo.upsert(record(2_000, 19.5, 10)).await.unwrap();

        let found = repo
            .get_by_key("Raspberry_Device_1#WEEKLY_AVG")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(found.timestamp.timestamp(), 2_000);
        assert!((found.avg_temperature - 19.5).abs() < f64::EPSILON);
        assert_eq!(found.processed_item_count, 10);

        let (rows,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM rollups")
            .fetch_one(&repo.pool)
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn should_return_none_for_unknown_key() {
        let repo = setup().await;
        assert!(repo.get_by_key("missing#WEEKLY_AVG").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn should_keep_rollups_of_different_devices_apart() {
        let repo = setup().await;
        repo.upsert(record(1_000, 22.0, 3)).await.unwrap();
        let mut other = record(1_000, 30.0, 1);
        other.key = "Raspberry_Device_2#WEEKLY_AVG".to_string();
        repo.upsert(other).await.unwrap();

        let first = repo
            .get_by_key("Raspberry_Device_1#WEEKLY_AVG")
            .await
            .unwrap()
            .unwrap();
        assert!((first.avg_temperature - 22.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn should_report_storage_error_when_write_fails() {
        let repo = setup().await;
        sqlx::query("DROP TABLE rollups")
            .execute(&repo.pool)
            .await
            .unwrap();

        let result = repo.upsert(record(1_000, 22.0, 3)).await;

        assert!(matches!(result, Err(SensorLinkError::Storage(_))));
    }
}
