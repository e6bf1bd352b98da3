//! Window buffer: accumulates readings and reduces them into a
//! [`WindowSummary`] once `N` samples have been collected.
//!
//! `N` is derived from the sampling interval so that one summary covers one
//! wall-clock minute: `N = 60 / interval_secs` (integer division). A 5 s
//! interval gives 12 samples, a 7 s interval gives 8.

use std::time::Duration;

use crate::error::ValidationError;
use crate::id::DeviceId;
use crate::reading::Reading;
use crate::stats::mean;
use crate::summary::WindowSummary;
use crate::time::{Timestamp, truncate_to_secs};

/// Wall-clock span covered by one summary, in seconds.
pub const SUMMARY_PERIOD_SECS: u64 = 60;

/// Number of readings reduced into one summary. Always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSize(usize);

impl WindowSize {
    /// Derive the window size from the sampling interval.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidInterval`] when the interval is zero
    /// or longer than [`SUMMARY_PERIOD_SECS`] (no sample would fit), and
    /// [`ValidationError::FractionalInterval`] when it is not a whole number
    /// of seconds.
    pub fn from_interval(interval: Duration) -> Result<Self, ValidationError> {
        if interval.subsec_nanos() != 0 {
            return Err(ValidationError::FractionalInterval {
                millis: u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
            });
        }
        let secs = interval.as_secs();
        if secs == 0 || secs > SUMMARY_PERIOD_SECS {
            return Err(ValidationError::InvalidInterval {
                actual: secs,
                max: SUMMARY_PERIOD_SECS,
            });
        }
        // At most 60, always fits.
        #[allow(clippy::cast_possible_truncation)]
        Ok(Self((SUMMARY_PERIOD_SECS / secs) as usize))
    }

    /// Use an explicit size; zero is bumped to one.
    #[must_use]
    pub fn fixed(size: usize) -> Self {
        Self(size.max(1))
    }

    #[must_use]
    pub fn get(self) -> usize {
        self.0
    }
}

/// Readings collected for the window currently open.
///
/// Owned by a single sampler; never shared. Its length never exceeds the
/// window size.
#[derive(Debug)]
pub struct WindowBuffer {
    size: WindowSize,
    readings: Vec<Reading>,
}

impl WindowBuffer {
    #[must_use]
    pub fn new(size: WindowSize) -> Self {
        Self {
            size,
            readings: Vec::with_capacity(size.get()),
        }
    }

    #[must_use]
    pub fn size(&self) -> WindowSize {
        self.size
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.readings.len() >= self.size.get()
    }

    /// Append a reading, returning the new length.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::WindowFull`] if the window must be closed first.
    pub fn push(&mut self, reading: Reading) -> Result<usize, ValidationError> {
        if self.is_full() {
            return Err(ValidationError::WindowFull {
                capacity: self.size.get(),
            });
        }
        self.readings.push(reading);
        Ok(self.readings.len())
    }

    /// Reduce the window if it holds exactly `N` readings.
    ///
    /// Averages temperature and humidity, rounds both to two decimals, stamps
    /// the summary with `closed_at` (whole seconds) and empties the buffer.
    /// Returns `None`, leaving the buffer untouched, while the window is still
    /// filling.
    pub fn close(&mut self, device_id: &DeviceId, closed_at: Timestamp) -> Option<WindowSummary> {
        if !self.is_full() {
            return None;
        }
        let avg_temperature = mean(self.readings.iter().map(|r| r.temperature))?;
        let avg_humidity = mean(self.readings.iter().map(|r| r.humidity))?;
        self.readings.clear();

        Some(WindowSummary::new(
            device_id.clone(),
            truncate_to_secs(closed_at),
            avg_temperature,
            avg_humidity,
        ))
    }
}
