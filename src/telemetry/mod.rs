//! Board identity, thermal and CPU telemetry, and the single-wire temperature
//! sensor.
//!
//! These readers are stateless: each value is one file read or one command
//! invocation, parsed on the spot.

pub mod data;
pub mod pi;
pub mod traits;
pub mod w1;

// Re-export commonly used items
pub use data::{HostInfo, LoadAverage, TelemetrySnapshot, TemperatureUnit};
pub use pi::PiTelemetry;
pub use traits::Sensor;
pub use w1::Ds18b20;
