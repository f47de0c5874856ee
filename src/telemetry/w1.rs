//! DS18B20 temperature sensor on the 1-Wire bus.
//!
//! With the `w1-gpio` and `w1-therm` kernel modules loaded, every DS18B20 shows
//! up as `/sys/bus/w1/devices/28-<serial>` (28 is the family code) and its
//! last conversion can be read from the `w1_slave` file in that directory:
//!
//! ```text
//! 72 01 4b 46 7f ff 0e 10 57 : crc=57 YES
//! 72 01 4b 46 7f ff 0e 10 57 t=23125
//! ```

use crate::error::{GpioError, Result};
use crate::telemetry::data::TemperatureUnit;
use crate::telemetry::traits::Sensor;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory name prefix of DS18B20 devices.
pub const FAMILY_PREFIX: &str = "28-";

const SLAVE_FILE: &str = "w1_slave";

/// A DS18B20 bound to one `w1_slave` file.
#[derive(Debug, Clone)]
pub struct Ds18b20 {
    devices_dir: PathBuf,
    bus: PathBuf,
}

impl Ds18b20 {
    /// Bind to the first DS18B20 found under `devices_dir`.
    pub fn discover(devices_dir: impl Into<PathBuf>) -> Result<Self> {
        let devices_dir = devices_dir.into();
        let bus = guess_bus(&devices_dir)?;
        debug!("Using 1-Wire bus {}", bus.display());
        Ok(Self { devices_dir, bus })
    }

    /// The `w1_slave` file readings come from.
    pub fn bus(&self) -> &Path {
        &self.bus
    }

    /// Point the sensor at another `w1_slave` file.
    ///
    /// The file must exist and sit in a `28-*` directory of the devices tree.
    pub fn set_bus(&mut self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        if !path.exists() {
            return Err(GpioError::sensor_error(format!(
                "{} is not a valid w1 bus path",
                path.display()
            )));
        }

        let in_family = path
            .strip_prefix(&self.devices_dir)
            .ok()
            .and_then(|relative| relative.components().next())
            .map(|device| device.as_os_str().to_string_lossy().starts_with(FAMILY_PREFIX))
            .unwrap_or(false);
        if !in_family {
            return Err(GpioError::sensor_error(format!(
                "{} does not seem to be a regular w1 bus path",
                path.display()
            )));
        }

        self.bus = path;
        Ok(())
    }

    /// Read the temperature in the given unit.
    pub fn read_in(&self, unit: TemperatureUnit) -> Result<f32> {
        Ok(unit.from_celsius(self.read()?))
    }
}

impl Sensor for Ds18b20 {
    fn read(&self) -> Result<f32> {
        if !self.bus.exists() {
            return Err(GpioError::sensor_error(format!(
                "No bus file found at {}: run `sudo modprobe w1-gpio; sudo modprobe w1-therm`",
                self.bus.display()
            )));
        }
        let raw = fs::read_to_string(&self.bus)?;
        parse_w1_slave(&raw)
    }
}

/// Locate the `w1_slave` file of the first `28-*` device, by name order.
pub fn guess_bus(devices_dir: &Path) -> Result<PathBuf> {
    let mut devices: Vec<PathBuf> = match fs::read_dir(devices_dir) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(FAMILY_PREFIX))
            .map(|entry| entry.path())
            .collect(),
        Err(err) => {
            debug!("Cannot list {}: {}", devices_dir.display(), err);
            Vec::new()
        }
    };
    devices.sort();

    devices
        .into_iter()
        .next()
        .map(|device| device.join(SLAVE_FILE))
        .ok_or_else(|| GpioError::sensor_error("No bus found"))
}

/// Extract the temperature in Celsius from `w1_slave` contents.
pub fn parse_w1_slave(raw: &str) -> Result<f32> {
    let flattened = raw.replace('\n', "");
    let millis = flattened
        .split("t=")
        .nth(1)
        .ok_or_else(|| GpioError::parse_error("w1_slave output has no t= field"))?;
    let millis = millis.trim().parse::<f32>().map_err(|e| {
        GpioError::parse_error(format!("Invalid w1 temperature {:?}: {}", millis.trim(), e))
    })?;
    Ok(millis / 1000.0)
}
