//! Storage-specific error type wrapping sqlx errors.

use sensorlink_domain::error::SensorLinkError;

/// Errors originating from the `SQLite` storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A query or connection failed.
    #[error("database error")]
    Database(#[from] sqlx::Error),

    /// Failed to run migrations.
    #[error("migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored epoch-second value is outside the representable range.
    #[error("stored timestamp {0} is out of range")]
    TimestampOutOfRange(i64),

    /// A stored row count is negative.
    #[error("stored item count {0} is negative")]
    NegativeCount(i64),
}

impl From<StorageError> for SensorLinkError {
    fn from(err: StorageError) -> Self {
        Self::Storage(Box::new(err))
    }
}
