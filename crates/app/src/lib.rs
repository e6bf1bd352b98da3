//! # sensorlink-app
//!
//! Application layer: use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `Sensor`: take one reading
//!   - `Transport`: publish a payload with at-least-once delivery
//!   - `SummaryRepository`: append & range-query window summaries
//!   - `RollupRepository`: upsert & fetch rollup records
//! - Define **driving/inbound ports** as use-case structs:
//!   - `Sampler`: tick loop that fills the window buffer and closes windows
//!   - `TelemetryPublisher`: outbox consumer with bounded retry
//!   - `RollupService`: query a range, aggregate, write back
//! - Provide the injectable `RetryPolicy` used by the publisher
//!
//! ## Dependency rule
//! Depends on `sensorlink-domain` only (plus `tokio::sync`/`tokio::time` and `select!`).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod ports;
pub mod retry;
pub mod services;
