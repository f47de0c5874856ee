//! Failure reporting hooks for the pin controller.

use crate::error::GpioError;
use std::fmt;
use tracing::warn;

/// Controller operation during which a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Setup,
    IsExported,
    CurrentDirection,
    Input,
    Output,
    Unexport,
    UnexportAll,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Setup => "setup",
            Operation::IsExported => "is_exported",
            Operation::CurrentDirection => "current_direction",
            Operation::Input => "input",
            Operation::Output => "output",
            Operation::Unexport => "unexport",
            Operation::UnexportAll => "unexport_all",
        };
        f.write_str(name)
    }
}

/// Receives every error a [`PinController`](super::PinController) returns.
///
/// Called once per failed operation, before the error reaches the caller.
pub trait ControllerObserver {
    fn on_failure(&self, operation: Operation, pin: Option<u8>, error: &GpioError);
}

/// Logs failures through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ControllerObserver for TracingObserver {
    fn on_failure(&self, operation: Operation, pin: Option<u8>, error: &GpioError) {
        match pin {
            Some(pin) => warn!("GPIO {} failed on pin {}: {}", operation, pin, error),
            None => warn!("GPIO {} failed: {}", operation, error),
        }
    }
}

/// Discards failures.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ControllerObserver for NoopObserver {
    fn on_failure(&self, _operation: Operation, _pin: Option<u8>, _error: &GpioError) {}
}
