//! Reading: a single raw sample taken from the sensor.

use crate::error::ValidationError;
use crate::time::Timestamp;

/// One temperature/humidity sample. Lives only inside the sampling loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// Degrees Celsius.
    pub temperature: f64,
    /// Relative humidity, percent.
    pub humidity: f64,
    pub captured_at: Timestamp,
}

impl Reading {
    #[must_use]
    pub fn new(temperature: f64, humidity: f64, captured_at: Timestamp) -> Self {
        Self {
            temperature,
            humidity,
            captured_at,
        }
    }

    /// Check that the sample is usable for averaging.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NonFinite`] for `NaN`/infinite values and
    /// [`ValidationError::HumidityOutOfRange`] outside `0..=100`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.temperature.is_finite() {
            return Err(ValidationError::NonFinite {
                field: "temperature",
            });
        }
        if !self.humidity.is_finite() {
            return Err(ValidationError::NonFinite { field: "humidity" });
        }
        if !(0.0..=100.0).contains(&self.humidity) {
            return Err(ValidationError::HumidityOutOfRange(self.humidity));
        }
        Ok(())
    }
}
