//! Board revision, temperatures, CPU frequency and load.

use crate::config::PiConfig;
use crate::error::{GpioError, Result};
use crate::gpio::BoardProfile;
use crate::telemetry::data::{HostInfo, LoadAverage, TelemetrySnapshot, TemperatureUnit};
use std::fs;
use std::path::Path;
use std::process::Command;
use sysinfo::System;
use tracing::debug;

/// Reads board telemetry from the locations in a [`PiConfig`].
#[derive(Debug, Clone, Default)]
pub struct PiTelemetry {
    config: PiConfig,
}

impl PiTelemetry {
    pub fn new(config: PiConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PiConfig {
        &self.config
    }

    /// Hardware revision code, `0` if `/proc/cpuinfo` has none.
    pub fn revision(&self) -> Result<u32> {
        detect_revision(&self.config.cpuinfo_path)
    }

    /// The pin map for the detected revision.
    pub fn board_profile(&self) -> Result<BoardProfile> {
        Ok(BoardProfile::resolve(self.revision()?))
    }

    /// SoC temperature from the first thermal zone.
    pub fn cpu_temperature(&self, unit: TemperatureUnit) -> Result<f32> {
        let raw = fs::read_to_string(&self.config.thermal_path)?;
        Ok(unit.from_celsius(parse_thousandths(&raw)?))
    }

    /// GPU temperature as reported by `vcgencmd measure_temp`.
    pub fn gpu_temperature(&self, unit: TemperatureUnit) -> Result<f32> {
        let output = Command::new(&self.config.vcgencmd)
            .arg("measure_temp")
            .output()?;
        if !output.status.success() {
            return Err(GpioError::command_error(format!(
                "{} measure_temp exited with {}",
                self.config.vcgencmd, output.status
            )));
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(unit.from_celsius(parse_gpu_temperature(&stdout)?))
    }

    /// Current frequency of CPU 0 in MHz.
    pub fn cpu_frequency_mhz(&self) -> Result<f32> {
        let raw = fs::read_to_string(&self.config.cpufreq_path)?;
        parse_thousandths(&raw)
    }

    pub fn load_average(&self) -> Result<LoadAverage> {
        let raw = fs::read_to_string(&self.config.loadavg_path)?;
        parse_load_average(&raw)
    }

    /// Collect every reading available on this host.
    ///
    /// Only the revision is mandatory; readers that fail leave their field
    /// empty.
    pub fn snapshot(&self, unit: TemperatureUnit) -> Result<TelemetrySnapshot> {
        let revision = self.revision()?;
        let profile = BoardProfile::resolve(revision);
        let mut snapshot = TelemetrySnapshot::new(revision, profile.generation, unit);

        snapshot.cpu_temperature = optional("CPU temperature", self.cpu_temperature(unit));
        snapshot.gpu_temperature = optional("GPU temperature", self.gpu_temperature(unit));
        snapshot.cpu_frequency_mhz = optional("CPU frequency", self.cpu_frequency_mhz());
        snapshot.load_average = optional("load average", self.load_average());
        snapshot.host = host_info();

        Ok(snapshot)
    }
}

fn optional<T>(what: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            debug!("{} unavailable: {}", what, err);
            None
        }
    }
}

fn host_info() -> HostInfo {
    HostInfo {
        hostname: System::host_name().unwrap_or_else(|| "unknown".to_string()),
        os_name: System::name().unwrap_or_else(|| "unknown".to_string()),
        kernel_version: System::kernel_version().unwrap_or_else(|| "unknown".to_string()),
        uptime_seconds: System::uptime(),
    }
}

/// Read the revision code from a cpuinfo file.
pub fn detect_revision(path: impl AsRef<Path>) -> Result<u32> {
    let cpuinfo = fs::read_to_string(path)?;
    parse_revision(&cpuinfo)
}

/// Find the `Revision : <hex>` line of cpuinfo text.
///
/// Text without such a line yields `0`, which resolves to the oldest board.
pub fn parse_revision(cpuinfo: &str) -> Result<u32> {
    for line in cpuinfo.lines() {
        let Some(index) = line.find("Revision") else {
            continue;
        };
        let Some(rest) = line[index + "Revision".len()..].trim_start().strip_prefix(':') else {
            continue;
        };
        let code = rest.split_whitespace().next().unwrap_or("");
        if code.is_empty() {
            return Ok(0);
        }
        return u32::from_str_radix(code, 16)
            .map_err(|e| GpioError::parse_error(format!("Invalid revision code {:?}: {}", code, e)));
    }
    Ok(0)
}

/// Parse a sysfs integer reported in thousandths (millidegrees, kHz).
pub fn parse_thousandths(raw: &str) -> Result<f32> {
    let value = raw
        .trim()
        .parse::<f32>()
        .map_err(|e| GpioError::parse_error(format!("Invalid reading {:?}: {}", raw.trim(), e)))?;
    Ok(value / 1000.0)
}

/// Parse `vcgencmd measure_temp` output such as `temp=48.3'C`.
pub fn parse_gpu_temperature(raw: &str) -> Result<f32> {
    let cleaned = raw.trim().replace("temp=", "").replace("'C", "");
    cleaned
        .trim()
        .parse::<f32>()
        .map_err(|e| GpioError::parse_error(format!("Invalid GPU temperature {:?}: {}", raw.trim(), e)))
}

/// Parse the first three fields of `/proc/loadavg`.
pub fn parse_load_average(raw: &str) -> Result<LoadAverage> {
    let parts: Vec<&str> = raw.split_whitespace().collect();
    if parts.len() < 3 {
        return Err(GpioError::parse_error(format!("Invalid load average {:?}", raw.trim())));
    }

    let field = |s: &str| {
        s.parse::<f64>()
            .map_err(|e| GpioError::parse_error(format!("Invalid load value {:?}: {}", s, e)))
    };

    Ok(LoadAverage {
        one_minute: field(parts[0])?,
        five_minutes: field(parts[1])?,
        fifteen_minutes: field(parts[2])?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const CPUINFO: &str = "processor\t: 0\n\
        model name\t: ARMv7 Processor rev 4 (v7l)\n\
        Hardware\t: BCM2835\n\
        Revision\t: a02082\n\
        Serial\t\t: 00000000abcdef01\n";

    #[test]
    fn test_parse_revision() {
        assert_eq!(parse_revision(CPUINFO).unwrap(), 0xa02082);
        assert_eq!(parse_revision("Revision:000e").unwrap(), 0xe);
        assert_eq!(parse_revision("Revision   :   0002   \n").unwrap(), 2);
    }

    #[test]
    fn test_parse_revision_missing_line() {
        assert_eq!(parse_revision("processor\t: 0\n").unwrap(), 0);
        assert_eq!(parse_revision("").unwrap(), 0);
    }

    #[test]
    fn test_parse_revision_rejects_garbage() {
        let err = parse_revision("Revision\t: zz12\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_parse_thousandths() {
        assert_eq!(parse_thousandths("48312\n").unwrap(), 48.312);
        assert_eq!(parse_thousandths("1500000").unwrap(), 1500.0);
        assert!(parse_thousandths("warm").is_err());
    }

    #[test]
    fn test_parse_gpu_temperature() {
        assert_eq!(parse_gpu_temperature("temp=48.3'C\n").unwrap(), 48.3);
        assert!(parse_gpu_temperature("VCHI initialization failed").is_err());
    }

    #[test]
    fn test_parse_load_average() {
        let load = parse_load_average("0.52 0.58 0.59 1/389 12345\n").unwrap();
        assert_eq!(load.one_minute, 0.52);
        assert_eq!(load.five_minutes, 0.58);
        assert_eq!(load.fifteen_minutes, 0.59);
        assert!(parse_load_average("0.52").is_err());
    }
}
