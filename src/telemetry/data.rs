//! Data structures for board telemetry.

use crate::gpio::BoardGeneration;
use serde::{Deserialize, Serialize};

/// Unit in which temperatures are reported.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    /// Convert a Celsius reading into this unit.
    pub fn from_celsius(&self, celsius: f32) -> f32 {
        match self {
            TemperatureUnit::Celsius => celsius,
            TemperatureUnit::Fahrenheit => 1.8 * celsius + 32.0,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
        }
    }
}

/// System load averages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct LoadAverage {
    pub one_minute: f64,
    pub five_minutes: f64,
    pub fifteen_minutes: f64,
}

/// Host details gathered through `sysinfo`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HostInfo {
    /// System hostname
    pub hostname: String,
    /// Operating system name
    pub os_name: String,
    /// Kernel version
    pub kernel_version: String,
    /// System uptime in seconds
    pub uptime_seconds: u64,
}

/// Everything the board reports about itself at one point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    /// Timestamp when this snapshot was taken (Unix timestamp in milliseconds)
    pub timestamp: u64,
    /// Hardware revision code from `/proc/cpuinfo`
    pub revision: u32,
    /// Header layout derived from the revision
    pub generation: BoardGeneration,
    /// Unit of the temperature fields
    pub unit: TemperatureUnit,
    /// SoC temperature from the thermal zone
    pub cpu_temperature: Option<f32>,
    /// GPU temperature reported by the VideoCore
    pub gpu_temperature: Option<f32>,
    /// Current CPU frequency in MHz
    pub cpu_frequency_mhz: Option<f32>,
    pub load_average: Option<LoadAverage>,
    pub host: HostInfo,
}

impl TelemetrySnapshot {
    /// Create an empty snapshot stamped with the current time.
    pub fn new(revision: u32, generation: BoardGeneration, unit: TemperatureUnit) -> Self {
        Self {
            timestamp: chrono::Utc::now().timestamp_millis().max(0) as u64,
            revision,
            generation,
            unit,
            cpu_temperature: None,
            gpu_temperature: None,
            cpu_frequency_mhz: None,
            load_average: None,
            host: HostInfo::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fahrenheit_conversion() {
        assert_eq!(TemperatureUnit::Fahrenheit.from_celsius(0.0), 32.0);
        assert_eq!(TemperatureUnit::Fahrenheit.from_celsius(100.0), 212.0);
        assert_eq!(TemperatureUnit::Celsius.from_celsius(48.3), 48.3);
    }

    #[test]
    fn test_snapshot_serialization() {
        let snapshot = TelemetrySnapshot::new(0xa02082, BoardGeneration::FortyPin, TemperatureUnit::Celsius);
        assert!(snapshot.timestamp > 0);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["revision"], 0xa02082);
        assert_eq!(json["generation"], "FortyPin");
        assert_eq!(json["unit"], "celsius");
        assert!(json["cpu_temperature"].is_null());
    }
}
