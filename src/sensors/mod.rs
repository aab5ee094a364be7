//! Sensor subsystem: individual drivers and the aggregating [`SensorHub`].
//!
//! Driver errors are logged here and surface to the domain as `None`; the
//! pump controller then holds the last good value.

pub mod distance;
pub mod temperature;

use log::warn;

use distance::DistanceSensor;
use temperature::TemperatureSensor;

/// Aggregates the level and temperature sensors.
pub struct SensorHub {
    pub distance: DistanceSensor,
    pub temperature: TemperatureSensor,
}

impl SensorHub {
    pub fn new(distance: DistanceSensor, temperature: TemperatureSensor) -> Self {
        Self {
            distance,
            temperature,
        }
    }

    /// Distance to the water surface, or `None` on a failed read.
    pub fn distance_cm(&mut self) -> Option<f32> {
        self.distance
            .read()
            .map_err(|e| warn!("distance read failed: {}", crate::error::Error::from(e)))
            .ok()
    }

    /// Water temperature, or `None` on a failed read.
    pub fn temperature_c(&mut self) -> Option<f32> {
        self.temperature
            .read()
            .map_err(|e| warn!("temperature read failed: {}", crate::error::Error::from(e)))
            .ok()
    }
}
