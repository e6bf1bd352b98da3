//! `SQLite` pool setup and migration runner.
//!
//! File databases run in WAL mode so the rollup job can read while ingestion
//! appends. In-memory databases live only as long as one of their connections
//! does, so their pool is pinned to a single connection that never expires.

use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

use crate::error::StorageError;

const DEFAULT_MAX_CONNECTIONS: u32 = 4;
const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// How to open the `SQLite` store.
#[derive(Debug, Clone)]
pub struct Config {
    /// `SQLite` connection URL (e.g. `sqlite:sensorlink.db` or `sqlite::memory:`).
    pub database_url: String,
    /// Upper bound on pooled connections for file databases.
    pub max_connections: u32,
    /// How long a connection waits on a locked database before failing.
    pub busy_timeout: Duration,
}

impl Config {
    /// Configuration for `database_url` with default pool settings.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    /// A private in-memory database.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new("sqlite::memory:")
    }

    fn is_in_memory(&self) -> bool {
        self.database_url.contains(":memory:") || self.database_url.contains("mode=memory")
    }

    fn connect_options(&self) -> Result<SqliteConnectOptions, StorageError> {
        let options = SqliteConnectOptions::from_str(&self.database_url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(self.busy_timeout);
        if self.is_in_memory() {
            Ok(options)
        } else {
            Ok(options.journal_mode(SqliteJournalMode::Wal))
        }
    }

    fn pool_options(&self) -> SqlitePoolOptions {
        if self.is_in_memory() {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(self.max_connections.max(1))
        }
    }

    /// Open the pool and bring the schema up to date.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the URL is malformed, the database cannot
    /// be opened or a migration fails.
    pub async fn build(self) -> Result<Database, StorageError> {
        let pool = self
            .pool_options()
            .connect_with(self.connect_options()?)
            .await?;
        tracing::debug!(
            url = %self.database_url,
            in_memory = self.is_in_memory(),
            "database opened"
        );

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::debug!("database migrations applied");

        Ok(Database { pool })
    }
}

/// An open, migrated `SQLite` store.
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Borrow the underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
