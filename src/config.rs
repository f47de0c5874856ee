//! Paths and behaviour switches.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where to find the kernel interfaces and how strictly to drive pins.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PiConfig {
    /// Root of the sysfs GPIO tree
    pub gpio_root: PathBuf,
    /// CPU information file holding the board revision
    pub cpuinfo_path: PathBuf,
    /// Thermal zone reporting the SoC temperature in millidegrees
    pub thermal_path: PathBuf,
    /// Current CPU frequency in kHz
    pub cpufreq_path: PathBuf,
    /// Load average file
    pub loadavg_path: PathBuf,
    /// VideoCore command used for the GPU temperature
    pub vcgencmd: String,
    /// Directory listing single-wire bus devices
    pub w1_devices_dir: PathBuf,
    /// Fail writes to unexported pins instead of ignoring them
    pub strict_output: bool,
}

impl Default for PiConfig {
    fn default() -> Self {
        Self {
            gpio_root: PathBuf::from(crate::DEFAULT_GPIO_ROOT),
            cpuinfo_path: PathBuf::from("/proc/cpuinfo"),
            thermal_path: PathBuf::from("/sys/class/thermal/thermal_zone0/temp"),
            cpufreq_path: PathBuf::from("/sys/devices/system/cpu/cpu0/cpufreq/scaling_cur_freq"),
            loadavg_path: PathBuf::from("/proc/loadavg"),
            vcgencmd: "vcgencmd".to_string(),
            w1_devices_dir: PathBuf::from(crate::DEFAULT_W1_DEVICES_DIR),
            strict_output: false,
        }
    }
}

impl PiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sysfs GPIO root.
    pub fn with_gpio_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.gpio_root = root.into();
        self
    }

    pub fn with_cpuinfo_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cpuinfo_path = path.into();
        self
    }

    pub fn with_thermal_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.thermal_path = path.into();
        self
    }

    pub fn with_cpufreq_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cpufreq_path = path.into();
        self
    }

    pub fn with_loadavg_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.loadavg_path = path.into();
        self
    }

    /// Set the command used to query the GPU temperature.
    pub fn with_vcgencmd(mut self, command: impl Into<String>) -> Self {
        self.vcgencmd = command.into();
        self
    }

    pub fn with_w1_devices_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.w1_devices_dir = dir.into();
        self
    }

    /// Enable or disable strict output.
    pub fn with_strict_output(mut self, strict: bool) -> Self {
        self.strict_output = strict;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths() {
        let config = PiConfig::default();
        assert_eq!(config.gpio_root, PathBuf::from("/sys/class/gpio"));
        assert_eq!(config.w1_devices_dir, PathBuf::from("/sys/bus/w1/devices"));
        assert!(!config.strict_output);
    }

    #[test]
    fn test_config_deserializes_from_json() {
        let mut value = serde_json::to_value(PiConfig::default()).unwrap();
        value["strict_output"] = serde_json::Value::Bool(true);
        value["gpio_root"] = serde_json::Value::String("/tmp/gpio".into());

        let config: PiConfig = serde_json::from_value(value).unwrap();
        assert!(config.strict_output);
        assert_eq!(config.gpio_root, PathBuf::from("/tmp/gpio"));
    }
}
