//! # sensorlink-adapter-virtual
//!
//! Simulated temperature/humidity sensor standing in for real DHT hardware.
//!
//! Readings follow a slow sine wave around configured base values so window
//! averages move visibly without being random. Every `fault_every`-th read
//! fails with a transient error, mimicking the checksum glitches of cheap
//! one-wire sensors.
//!
//! ## Dependency rule
//!
//! Depends on `sensorlink-app` (port traits) and `sensorlink-domain` only.

use std::f64::consts::TAU;

use serde::Deserialize;

use sensorlink_app::ports::Sensor;
use sensorlink_domain::error::SensorError;
use sensorlink_domain::reading::Reading;
use sensorlink_domain::time::now;

/// Shape of the simulated signal.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct VirtualSensorConfig {
    /// Temperature at the centre of the wave, in °C.
    pub base_temperature: f64,
    /// Relative humidity at the centre of the wave, in %.
    pub base_humidity: f64,
    /// Peak deviation from the base values.
    pub amplitude: f64,
    /// Reads per full wave period.
    pub period_ticks: u32,
    /// Fail every n-th read with a transient error. Zero never fails.
    pub fault_every: u32,
}

impl Default for VirtualSensorConfig {
    fn default() -> Self {
        Self {
            base_temperature: 21.0,
            base_humidity: 45.0,
            amplitude: 1.5,
            period_ticks: 120,
            fault_every: 0,
        }
    }
}

/// A deterministic, simulated sensor.
pub struct VirtualSensor {
    config: VirtualSensorConfig,
    ticks: u32,
}

impl VirtualSensor {
    #[must_use]
    pub fn new(config: VirtualSensorConfig) -> Self {
        Self { config, ticks: 0 }
    }

    /// Reads attempted so far, including failed ones.
    #[must_use]
    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    fn sample(&mut self) -> Result<Reading, SensorError> {
        self.ticks = self.ticks.wrapping_add(1);

        if self.config.fault_every != 0 && self.ticks.is_multiple_of(self.config.fault_every) {
            return Err(SensorError::Transient(
                "simulated checksum mismatch".into(),
            ));
        }

        let period = f64::from(self.config.period_ticks.max(1));
        let phase = (TAU * f64::from(self.ticks) / period).sin();
        let temperature = self.config.base_temperature + self.config.amplitude * phase;
        let humidity = (self.config.base_humidity - self.config.amplitude * phase).clamp(0.0, 100.0);

        Ok(Reading::new(temperature, humidity, now()))
    }
}

impl Default for VirtualSensor {
    fn default() -> Self {
        Self::new(VirtualSensorConfig::default())
    }
}

impl Sensor for VirtualSensor {
    async fn read_once(&mut self) -> Result<Reading, SensorError> {
        self.sample()
    }
}
