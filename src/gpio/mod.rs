//! GPIO pin control over the Linux sysfs interface.
//!
//! The [`PinController`] validates pin numbers against a [`BoardProfile`],
//! keeps track of exported pins and refuses reads on output pins and writes on
//! input pins. All file access goes through a [`FilesystemPort`], so the
//! controller can be driven by [`SysfsPort`] on a Pi or [`MemoryPort`]
//! anywhere else.

pub mod board;
pub mod controller;
pub mod observer;
pub mod port;

// Re-export commonly used items
pub use board::{BoardGeneration, BoardProfile};
pub use controller::PinController;
pub use observer::{ControllerObserver, NoopObserver, Operation, TracingObserver};
pub use port::{FilesystemPort, MemoryPort, PortCall, PortOperation, SysfsPort};

use crate::error::{GpioError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Direction of a GPIO pin.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Pin is read by the host
    In,
    /// Pin is driven by the host
    Out,
}

impl Direction {
    /// The sysfs spelling of this direction.
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = GpioError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "in" => Ok(Direction::In),
            "out" => Ok(Direction::Out),
            other => Err(GpioError::InvalidDirection(other.to_string())),
        }
    }
}

/// Digital level of a GPIO pin.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DigitalValue {
    /// Logic 0
    Low,
    /// Logic 1
    High,
}

impl DigitalValue {
    /// The sysfs spelling of this value.
    pub fn as_str(&self) -> &'static str {
        match self {
            DigitalValue::Low => "0",
            DigitalValue::High => "1",
        }
    }
}

impl fmt::Display for DigitalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<u8> for DigitalValue {
    type Error = GpioError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(DigitalValue::Low),
            1 => Ok(DigitalValue::High),
            other => Err(GpioError::InvalidValue(other.to_string())),
        }
    }
}

impl From<DigitalValue> for u8 {
    fn from(value: DigitalValue) -> u8 {
        match value {
            DigitalValue::Low => 0,
            DigitalValue::High => 1,
        }
    }
}

impl FromStr for DigitalValue {
    type Err = GpioError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "0" => Ok(DigitalValue::Low),
            "1" => Ok(DigitalValue::High),
            other => Err(GpioError::InvalidValue(other.to_string())),
        }
    }
}
