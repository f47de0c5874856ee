//! Error handling for the pi_gpio crate.

use crate::gpio::Direction;

/// A specialized `Result` type for pi_gpio operations.
pub type Result<T> = std::result::Result<T, GpioError>;

/// The main error type for GPIO and telemetry operations.
#[derive(Debug, thiserror::Error)]
pub enum GpioError {
    /// Pin is not addressable on the active board
    #[error("Pin number {pin} is invalid for this board")]
    InvalidPin { pin: u8 },

    /// Direction is neither `in` nor `out`
    #[error("Direction \"{0}\" is invalid (expected \"in\" or \"out\")")]
    InvalidDirection(String),

    /// Value is neither `0` nor `1`
    #[error("Pin value \"{0}\" is invalid (expected 0 or 1)")]
    InvalidValue(String),

    /// Operation needs an exported pin
    #[error("Pin {pin} is not exported")]
    NotExported { pin: u8 },

    /// Read on an output pin or write on an input pin
    #[error("Pin {pin} is configured as \"{direction}\", which is the wrong direction for this operation")]
    WrongDirection { pin: u8, direction: Direction },

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Telemetry text could not be parsed
    #[error("Failed to parse system information: {0}")]
    Parse(String),

    /// Single-wire sensor bus missing or invalid
    #[error("Sensor error: {0}")]
    Sensor(String),

    /// External command failed
    #[error("Command error: {0}")]
    Command(String),
}

/// Coarse category of a [`GpioError`], convenient for matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidPin,
    InvalidDirection,
    InvalidValue,
    NotExported,
    WrongDirection,
    Io,
    Parse,
    Sensor,
    Command,
}

impl GpioError {
    /// Create a new parse error
    pub fn parse_error(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a new sensor error
    pub fn sensor_error(msg: impl Into<String>) -> Self {
        Self::Sensor(msg.into())
    }

    /// Create a new command error
    pub fn command_error(msg: impl Into<String>) -> Self {
        Self::Command(msg.into())
    }

    /// The category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidPin { .. } => ErrorKind::InvalidPin,
            Self::InvalidDirection(_) => ErrorKind::InvalidDirection,
            Self::InvalidValue(_) => ErrorKind::InvalidValue,
            Self::NotExported { .. } => ErrorKind::NotExported,
            Self::WrongDirection { .. } => ErrorKind::WrongDirection,
            Self::Io(_) => ErrorKind::Io,
            Self::Parse(_) => ErrorKind::Parse,
            Self::Sensor(_) => ErrorKind::Sensor,
            Self::Command(_) => ErrorKind::Command,
        }
    }
}
