//! Traits for sensors.

use crate::error::Result;

/// A device producing a single temperature reading.
pub trait Sensor {
    /// Take one reading, in degrees Celsius.
    fn read(&self) -> Result<f32>;
}
