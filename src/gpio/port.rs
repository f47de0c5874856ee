//! Filesystem access used by the pin controller.
//!
//! [`SysfsPort`] talks to the kernel through `/sys/class/gpio`:
//!
//! - export: write the pin number to `export`
//! - unexport: write the pin number to `unexport`
//! - direction: `gpio<N>/direction`, `in` or `out`
//! - value: `gpio<N>/value`, `0` or `1`
//! - existence: the `gpio<N>` directory is present
//!
//! [`MemoryPort`] simulates the same files in memory for development and tests.

use crate::error::Result;
use crate::gpio::{DigitalValue, Direction};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File operations the pin controller needs from the operating system.
///
/// Errors are handed back to the caller untouched; implementations should not
/// retry.
pub trait FilesystemPort {
    /// Ask the kernel to expose `pin`.
    fn export_pin(&mut self, pin: u8) -> Result<()>;

    /// Ask the kernel to withdraw `pin`.
    fn unexport_pin(&mut self, pin: u8) -> Result<()>;

    fn write_direction(&mut self, pin: u8, direction: Direction) -> Result<()>;

    /// Raw contents of the pin's `direction` attribute.
    fn read_direction(&self, pin: u8) -> Result<String>;

    fn write_value(&mut self, pin: u8, value: DigitalValue) -> Result<()>;

    /// Raw contents of the pin's `value` attribute.
    fn read_value(&self, pin: u8) -> Result<String>;

    /// Whether the pin's sysfs directory exists.
    fn pin_exists(&self, pin: u8) -> bool;
}

/// Port backed by the real sysfs GPIO tree.
#[derive(Debug, Clone)]
pub struct SysfsPort {
    root: PathBuf,
}

impl SysfsPort {
    /// Create a port rooted at `root`, normally `/sys/class/gpio`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn pin_dir(&self, pin: u8) -> PathBuf {
        self.root.join(format!("gpio{}", pin))
    }

    fn attribute(&self, pin: u8, name: &str) -> PathBuf {
        self.pin_dir(pin).join(name)
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        debug!("Writing {:?} to {}", contents, path.display());
        fs::write(path, contents)?;
        Ok(())
    }

    fn read(&self, path: &Path) -> Result<String> {
        debug!("Reading {}", path.display());
        Ok(fs::read_to_string(path)?)
    }
}

impl Default for SysfsPort {
    fn default() -> Self {
        Self::new(crate::DEFAULT_GPIO_ROOT)
    }
}

impl FilesystemPort for SysfsPort {
    fn export_pin(&mut self, pin: u8) -> Result<()> {
        self.write(&self.root.join("export"), &pin.to_string())
    }

    fn unexport_pin(&mut self, pin: u8) -> Result<()> {
        self.write(&self.root.join("unexport"), &pin.to_string())
    }

    fn write_direction(&mut self, pin: u8, direction: Direction) -> Result<()> {
        self.write(&self.attribute(pin, "direction"), direction.as_str())
    }

    fn read_direction(&self, pin: u8) -> Result<String> {
        self.read(&self.attribute(pin, "direction"))
    }

    fn write_value(&mut self, pin: u8, value: DigitalValue) -> Result<()> {
        self.write(&self.attribute(pin, "value"), value.as_str())
    }

    fn read_value(&self, pin: u8) -> Result<String> {
        self.read(&self.attribute(pin, "value"))
    }

    fn pin_exists(&self, pin: u8) -> bool {
        self.pin_dir(pin).exists()
    }
}

/// A single call received by a [`MemoryPort`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortCall {
    Export(u8),
    Unexport(u8),
    WriteDirection(u8, Direction),
    ReadDirection(u8),
    WriteValue(u8, DigitalValue),
    ReadValue(u8),
    Exists(u8),
}

/// Port operations that can be made to fail on a [`MemoryPort`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortOperation {
    Export,
    Unexport,
    WriteDirection,
    ReadDirection,
    WriteValue,
    ReadValue,
}

#[derive(Debug, Clone)]
struct SimulatedPin {
    direction: Direction,
    value: DigitalValue,
}

/// In-memory stand-in for sysfs.
///
/// Behaves like the kernel interface: exporting creates a pin configured as
/// an input, exporting twice or unexporting an absent pin is refused, and
/// attributes of an unexported pin cannot be touched. Every call is recorded.
#[derive(Debug, Default)]
pub struct MemoryPort {
    pins: HashMap<u8, SimulatedPin>,
    failures: HashSet<PortOperation>,
    calls: RefCell<Vec<PortCall>>,
}

impl MemoryPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `pin` already exported, as if by another process.
    pub fn with_exported(mut self, pin: u8, direction: Direction) -> Self {
        self.pins.insert(
            pin,
            SimulatedPin {
                direction,
                value: DigitalValue::Low,
            },
        );
        self
    }

    /// Make every subsequent `operation` fail with a permission error.
    pub fn inject_failure(&mut self, operation: PortOperation) {
        self.failures.insert(operation);
    }

    pub fn clear_failures(&mut self) {
        self.failures.clear();
    }

    /// Change a pin's direction behind the controller's back.
    pub fn set_direction_externally(&mut self, pin: u8, direction: Direction) {
        if let Some(state) = self.pins.get_mut(&pin) {
            state.direction = direction;
        }
    }

    /// Drive the level seen on an input pin.
    pub fn set_level(&mut self, pin: u8, value: DigitalValue) {
        if let Some(state) = self.pins.get_mut(&pin) {
            state.value = value;
        }
    }

    /// Remove a pin without going through the port, as if by another process.
    pub fn remove_externally(&mut self, pin: u8) {
        self.pins.remove(&pin);
    }

    /// Current level of a pin, if exported.
    pub fn level(&self, pin: u8) -> Option<DigitalValue> {
        self.pins.get(&pin).map(|state| state.value)
    }

    /// Pins currently exported, ascending.
    pub fn exported(&self) -> Vec<u8> {
        let mut pins: Vec<u8> = self.pins.keys().copied().collect();
        pins.sort_unstable();
        pins
    }

    /// All calls received so far, in order.
    pub fn calls(&self) -> Vec<PortCall> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    fn record(&self, call: PortCall) {
        self.calls.borrow_mut().push(call);
    }

    fn check(&self, operation: PortOperation) -> Result<()> {
        if self.failures.contains(&operation) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("simulated failure of {:?}", operation),
            )
            .into());
        }
        Ok(())
    }

    fn pin(&self, pin: u8) -> Result<&SimulatedPin> {
        self.pins.get(&pin).ok_or_else(|| missing(pin))
    }

    fn pin_mut(&mut self, pin: u8) -> Result<&mut SimulatedPin> {
        self.pins.get_mut(&pin).ok_or_else(|| missing(pin))
    }
}

fn missing(pin: u8) -> crate::error::GpioError {
    io::Error::new(io::ErrorKind::NotFound, format!("gpio{} does not exist", pin)).into()
}

impl FilesystemPort for MemoryPort {
    fn export_pin(&mut self, pin: u8) -> Result<()> {
        self.record(PortCall::Export(pin));
        self.check(PortOperation::Export)?;
        if self.pins.contains_key(&pin) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("gpio{} is already exported", pin),
            )
            .into());
        }
        self.pins.insert(
            pin,
            SimulatedPin {
                direction: Direction::In,
                value: DigitalValue::Low,
            },
        );
        Ok(())
    }

    fn unexport_pin(&mut self, pin: u8) -> Result<()> {
        self.record(PortCall::Unexport(pin));
        self.check(PortOperation::Unexport)?;
        self.pins.remove(&pin).map(|_| ()).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("gpio{} is not exported", pin),
            )
            .into()
        })
    }

    fn write_direction(&mut self, pin: u8, direction: Direction) -> Result<()> {
        self.record(PortCall::WriteDirection(pin, direction));
        self.check(PortOperation::WriteDirection)?;
        let state = self.pin_mut(pin)?;
        state.direction = direction;
        if direction == Direction::Out {
            // The kernel drives a freshly configured output low.
            state.value = DigitalValue::Low;
        }
        Ok(())
    }

    fn read_direction(&self, pin: u8) -> Result<String> {
        self.record(PortCall::ReadDirection(pin));
        self.check(PortOperation::ReadDirection)?;
        Ok(format!("{}\n", self.pin(pin)?.direction))
    }

    fn write_value(&mut self, pin: u8, value: DigitalValue) -> Result<()> {
        self.record(PortCall::WriteValue(pin, value));
        self.check(PortOperation::WriteValue)?;
        let state = self.pin_mut(pin)?;
        if state.direction == Direction::In {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("gpio{} is an input", pin),
            )
            .into());
        }
        state.value = value;
        Ok(())
    }

    fn read_value(&self, pin: u8) -> Result<String> {
        self.record(PortCall::ReadValue(pin));
        self.check(PortOperation::ReadValue)?;
        Ok(format!("{}\n", self.pin(pin)?.value))
    }

    fn pin_exists(&self, pin: u8) -> bool {
        self.record(PortCall::Exists(pin));
        self.pins.contains_key(&pin)
    }
}
