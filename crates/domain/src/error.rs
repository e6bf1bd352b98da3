//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`SensorLinkError`] at port boundaries. Causes are carried as sources,
//! never flattened into strings.

use std::error::Error as StdError;

/// Boxed error used to carry adapter-specific causes across port boundaries.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Top-level error for every port and service in the workspace.
#[derive(Debug, thiserror::Error)]
pub enum SensorLinkError {
    /// A domain invariant was violated.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// The sensor collaborator failed.
    #[error("sensor error")]
    Sensor(#[from] SensorError),

    /// The transport collaborator rejected or failed a publish.
    #[error("transport error")]
    Transport(#[source] BoxError),

    /// The store collaborator failed a query or write.
    #[error("storage error")]
    Storage(#[source] BoxError),
}

/// Invariant violations on domain values.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// A device identifier was empty or whitespace.
    #[error("device id must not be empty")]
    EmptyDeviceId,

    /// A rollup label was empty or whitespace.
    #[error("rollup label must not be empty")]
    EmptyRollupLabel,

    /// A rollup window length was zero or negative.
    #[error("rollup window must be longer than zero")]
    EmptyRollupWindow,

    /// A measured value was `NaN` or infinite.
    #[error("{field} is not a finite number")]
    NonFinite {
        /// Name of the offending field.
        field: &'static str,
    },

    /// Relative humidity outside the physical `0..=100` percent range.
    #[error("humidity {0} is outside 0..=100")]
    HumidityOutOfRange(f64),

    /// The sampling interval does not divide a minute into at least one sample.
    #[error("sampling interval must be between 1 and {max} seconds, got {actual}")]
    InvalidInterval {
        /// The configured interval, in seconds.
        actual: u64,
        /// The largest accepted interval, in seconds.
        max: u64,
    },

    /// The sampling interval has a sub-second part.
    #[error("sampling interval must be a whole number of seconds, got {millis} ms")]
    FractionalInterval {
        /// The configured interval, in milliseconds.
        millis: u64,
    },

    /// A reading was pushed into a window that already holds `capacity` readings.
    #[error("window already holds {capacity} readings")]
    WindowFull {
        /// The window size `N`.
        capacity: usize,
    },

    /// A range reaching back further than timestamps can represent.
    #[error("range of {length_secs} s ending at {end} starts out of bounds")]
    RangeOutOfBounds {
        /// End, in epoch seconds.
        end: i64,
        /// Requested length, in seconds.
        length_secs: i64,
    },

    /// A time range whose start lies after its end.
    #[error("range start {start} is after range end {end}")]
    InvertedRange {
        /// Start, in epoch seconds.
        start: i64,
        /// End, in epoch seconds.
        end: i64,
    },
}

/// Failures reported by a sensor driver.
#[derive(Debug, thiserror::Error)]
pub enum SensorError {
    /// The driver answered but had no value for this tick.
    #[error("sensor returned no data")]
    NoData,

    /// A fault that is expected to clear on its own (checksum, timing, …).
    #[error("transient sensor fault")]
    Transient(#[source] BoxError),

    /// The driver cannot be used anymore.
    #[error("unrecoverable sensor failure")]
    Unrecoverable(#[source] BoxError),
}

impl SensorError {
    /// Whether the sampling loop should skip the tick and keep going.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Unrecoverable(_))
    }
}
