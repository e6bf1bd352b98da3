//! # sensorlink-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the repository port traits defined in `sensorlink-app::ports::storage`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between domain types and database rows
//!
//! ## Tables
//!
//! | Table | Key | Written by |
//! |-------|-----|------------|
//! | `window_summaries` | `(client_id, time_stamp)` | ingestion, append-only |
//! | `rollups` | `client_id` (derived key) | rollup job, upsert |
//!
//! ## Dependency rule
//! Depends on `sensorlink-app` (for port traits) and `sensorlink-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

mod error;
mod pool;
mod rollup_repo;
mod summary_repo;

pub use error::StorageError;
pub use pool::{Config, Database};
pub use rollup_repo::SqliteRollupRepository;
pub use summary_repo::SqliteSummaryRepository;
