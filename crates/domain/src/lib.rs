//! # sensorlink-domain
//!
//! Pure domain model for the sensorlink telemetry pipeline.
//!
//! ## Responsibilities
//! - Foundational types: device identity, error conventions, timestamps and ranges
//! - Define **Readings** (single raw sensor samples)
//! - Define the **Window** buffer and its reduction into a [`WindowSummary`](summary::WindowSummary)
//! - Define **Rollups** (a mean over a range of stored window summaries)
//! - Contain all invariant enforcement and numeric reduction logic
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod stats;
pub mod time;

pub mod reading;
pub mod rollup;
pub mod summary;
pub mod window;
