//! Time and timestamp helpers.

use chrono::{DateTime, Duration, Utc};

use crate::error::ValidationError;

/// UTC timestamp used for capture times, window close times and range bounds.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Drop sub-second precision; stored timestamps are whole epoch seconds.
#[must_use]
pub fn truncate_to_secs(ts: Timestamp) -> Timestamp {
    from_epoch_secs(ts.timestamp()).unwrap_or(ts)
}

/// Build a timestamp from epoch seconds, `None` when out of chrono's range.
#[must_use]
pub fn from_epoch_secs(secs: i64) -> Option<Timestamp> {
    DateTime::from_timestamp(secs, 0)
}

/// A closed time interval: both `start` and `end` belong to the range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    start: Timestamp,
    end: Timestamp,
}

impl TimeRange {
    /// Build a range, rejecting `start > end`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvertedRange`] when the bounds are swapped.
    pub fn new(start: Timestamp, end: Timestamp) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvertedRange {
                start: start.timestamp(),
                end: end.timestamp(),
            });
        }
        Ok(Self { start, end })
    }

    /// The `length`-long range that finishes at `end`, both bounds truncated
    /// to whole seconds.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvertedRange`] when `length` is negative
    /// and [`ValidationError::RangeOutOfBounds`] when the start would fall
    /// outside the representable time span.
    pub fn ending_at(end: Timestamp, length: Duration) -> Result<Self, ValidationError> {
        let end = truncate_to_secs(end);
        let start = end
            .checked_sub_signed(length)
            .ok_or(ValidationError::RangeOutOfBounds {
                end: end.timestamp(),
                length_secs: length.num_seconds(),
            })?;
        Self::new(start, end)
    }

    #[must_use]
    pub fn start(&self) -> Timestamp {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> Timestamp {
        self.end
    }

    /// Whether `ts` lies within the range, bounds included.
    #[must_use]
    pub fn contains(&self, ts: Timestamp) -> bool {
        self.start <= ts && ts <= self.end
    }
}
