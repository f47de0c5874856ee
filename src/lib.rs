//! # pi_gpio - Raspberry Pi GPIO over sysfs
//!
//! A small crate for driving Raspberry Pi GPIO pins through the Linux sysfs
//! interface (`/sys/class/gpio`) and reading board telemetry.
//!
//! ## Features
//!
//! - **Board profiles**: valid and safe ("hackable") BCM pins per header revision
//! - **Pin controller**: export bookkeeping with a direction guard that refuses
//!   reads on outputs and writes on inputs
//! - **Pluggable file access**: [`SysfsPort`] on a Pi, [`MemoryPort`] for
//!   development and tests
//! - **Telemetry**: board revision, CPU/GPU temperature, CPU frequency, load
//! - **DS18B20**: 1-Wire temperature sensor
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pi_gpio::{DigitalValue, Direction, PiConfig, PiTelemetry, PinController, SysfsPort};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PiConfig::default();
//!     let profile = PiTelemetry::new(config.clone()).board_profile()?;
//!     let mut gpio = PinController::from_config(
//!         profile,
//!         SysfsPort::new(&config.gpio_root),
//!         &config,
//!     );
//!
//!     gpio.setup(17, Direction::Out)?.output(17, DigitalValue::High)?;
//!     gpio.unexport_all()?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod gpio;
pub mod telemetry;

// Re-export public API
pub use config::PiConfig;
pub use error::{ErrorKind, GpioError, Result};
pub use gpio::{
    board::{BoardGeneration, BoardProfile},
    controller::PinController,
    observer::{ControllerObserver, NoopObserver, Operation, TracingObserver},
    port::{FilesystemPort, MemoryPort, PortCall, PortOperation, SysfsPort},
    DigitalValue, Direction,
};
pub use telemetry::{
    data::{LoadAverage, TelemetrySnapshot, TemperatureUnit},
    pi::PiTelemetry,
    traits::Sensor,
    w1::Ds18b20,
};

/// The default sysfs GPIO root
pub const DEFAULT_GPIO_ROOT: &str = "/sys/class/gpio";

/// The default 1-Wire devices directory
pub const DEFAULT_W1_DEVICES_DIR: &str = "/sys/bus/w1/devices";
