//! The pin controller: validation, export bookkeeping and the direction guard.
//!
//! A pin's state is never cached. Whether it is exported and which direction
//! it has are read back through the [`FilesystemPort`] on every call, since
//! another process may change either at any time.

use crate::config::PiConfig;
use crate::error::{GpioError, Result};
use crate::gpio::board::BoardProfile;
use crate::gpio::observer::{ControllerObserver, Operation, TracingObserver};
use crate::gpio::port::FilesystemPort;
use crate::gpio::{DigitalValue, Direction};
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, info};

/// Drives GPIO pins of one board through a [`FilesystemPort`].
///
/// Mutating operations return `&mut Self` so calls can be chained:
///
/// ```rust
/// use pi_gpio::{BoardProfile, DigitalValue, Direction, MemoryPort, PinController};
///
/// # fn main() -> pi_gpio::Result<()> {
/// let mut gpio = PinController::new(BoardProfile::resolve(0xa02082), MemoryPort::new());
/// gpio.setup(17, Direction::Out)?.output(17, DigitalValue::High)?;
/// assert_eq!(gpio.exported_pins(), vec![17]);
/// gpio.unexport_all()?;
/// # Ok(())
/// # }
/// ```
///
/// Pins are not unexported on drop; call [`unexport_all`](Self::unexport_all)
/// before shutting down.
pub struct PinController<P: FilesystemPort> {
    profile: BoardProfile,
    port: P,
    exported: BTreeSet<u8>,
    strict_output: bool,
    observer: Box<dyn ControllerObserver>,
}

impl<P: FilesystemPort> PinController<P> {
    /// Create a controller for `profile` that logs failures through `tracing`.
    pub fn new(profile: BoardProfile, port: P) -> Self {
        Self {
            profile,
            port,
            exported: BTreeSet::new(),
            strict_output: false,
            observer: Box::new(TracingObserver),
        }
    }

    /// Create a controller using the behaviour switches of `config`.
    pub fn from_config(profile: BoardProfile, port: P, config: &PiConfig) -> Self {
        Self::new(profile, port).with_strict_output(config.strict_output)
    }

    /// When enabled, [`output`](Self::output) on an unexported pin fails with
    /// [`GpioError::NotExported`] instead of doing nothing.
    pub fn with_strict_output(mut self, strict: bool) -> Self {
        self.strict_output = strict;
        self
    }

    /// Replace the failure observer.
    pub fn with_observer(mut self, observer: impl ControllerObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    pub fn profile(&self) -> &BoardProfile {
        &self.profile
    }

    /// Pins safe for general use on this board.
    pub fn hackable_pins(&self) -> &'static [u8] {
        self.profile.hackable_pins()
    }

    /// Pins exported by this controller, ascending.
    pub fn exported_pins(&self) -> Vec<u8> {
        self.exported.iter().copied().collect()
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    pub fn into_port(self) -> P {
        self.port
    }

    pub fn is_valid_pin(&self, pin: u8) -> bool {
        self.profile.is_valid_pin(pin)
    }

    /// Fail with [`GpioError::InvalidPin`] unless `pin` exists on this board.
    pub fn validate_pin(&self, pin: u8) -> Result<()> {
        if self.is_valid_pin(pin) {
            Ok(())
        } else {
            Err(GpioError::InvalidPin { pin })
        }
    }

    /// Export `pin` and set its direction.
    ///
    /// A pin that is already exported is unexported first, so this also
    /// reconfigures pins left behind by other processes.
    pub fn setup(&mut self, pin: u8, direction: Direction) -> Result<&mut Self> {
        let result = self.try_setup(pin, direction);
        self.observe(Operation::Setup, Some(pin), result)?;
        Ok(self)
    }

    /// Whether the pin's sysfs entry exists.
    pub fn is_exported(&self, pin: u8) -> Result<bool> {
        let result = self.validate_pin(pin).map(|_| self.port.pin_exists(pin));
        self.observe(Operation::IsExported, Some(pin), result)
    }

    /// The direction currently configured in sysfs.
    pub fn current_direction(&self, pin: u8) -> Result<Direction> {
        let result = self.try_current_direction(pin);
        self.observe(Operation::CurrentDirection, Some(pin), result)
    }

    /// Read the level of an exported pin that is not configured as output.
    pub fn input(&self, pin: u8) -> Result<DigitalValue> {
        let result = self.try_input(pin);
        self.observe(Operation::Input, Some(pin), result)
    }

    /// Drive an exported pin that is not configured as input.
    ///
    /// Unexported pins are skipped silently unless strict output is enabled.
    pub fn output(&mut self, pin: u8, value: DigitalValue) -> Result<&mut Self> {
        let result = self.try_output(pin, value);
        self.observe(Operation::Output, Some(pin), result)?;
        Ok(self)
    }

    /// Like [`output`](Self::output), taking the level as `0` or `1`.
    pub fn output_raw(&mut self, pin: u8, value: u8) -> Result<&mut Self> {
        let result = self
            .validate_pin(pin)
            .and_then(|_| DigitalValue::try_from(value))
            .and_then(|value| self.try_output(pin, value));
        self.observe(Operation::Output, Some(pin), result)?;
        Ok(self)
    }

    /// Withdraw `pin` from sysfs. Does nothing if it is not exported.
    pub fn unexport(&mut self, pin: u8) -> Result<&mut Self> {
        let result = self.try_unexport(pin);
        self.observe(Operation::Unexport, Some(pin), result)?;
        Ok(self)
    }

    /// Withdraw every pin this controller exported.
    pub fn unexport_all(&mut self) -> Result<&mut Self> {
        let result = self.try_unexport_all();
        self.observe(Operation::UnexportAll, None, result)?;
        Ok(self)
    }

    fn observe<T>(&self, operation: Operation, pin: Option<u8>, result: Result<T>) -> Result<T> {
        if let Err(ref error) = result {
            self.observer.on_failure(operation, pin, error);
        }
        result
    }

    fn try_setup(&mut self, pin: u8, direction: Direction) -> Result<()> {
        self.validate_pin(pin)?;

        if self.port.pin_exists(pin) {
            debug!("GPIO {} already exported, re-exporting", pin);
            self.try_unexport(pin)?;
        }

        self.port.export_pin(pin)?;
        // Tracked as soon as the kernel holds it, so unexport_all can clean up
        // even if the direction write below fails.
        self.exported.insert(pin);

        self.port.write_direction(pin, direction)?;
        info!("Exported GPIO {} as {}", pin, direction);
        Ok(())
    }

    fn try_current_direction(&self, pin: u8) -> Result<Direction> {
        self.validate_pin(pin)?;
        match self.port.read_direction(pin) {
            Ok(raw) => raw.parse(),
            Err(_) if !self.port.pin_exists(pin) => Err(GpioError::NotExported { pin }),
            Err(error) => Err(error),
        }
    }

    fn try_input(&self, pin: u8) -> Result<DigitalValue> {
        self.validate_pin(pin)?;
        if !self.port.pin_exists(pin) {
            return Err(GpioError::NotExported { pin });
        }

        let direction = self.try_current_direction(pin)?;
        if direction == Direction::Out {
            return Err(GpioError::WrongDirection { pin, direction });
        }

        self.port.read_value(pin)?.parse()
    }

    fn try_output(&mut self, pin: u8, value: DigitalValue) -> Result<()> {
        self.validate_pin(pin)?;
        if !self.port.pin_exists(pin) {
            if self.strict_output {
                return Err(GpioError::NotExported { pin });
            }
            debug!("GPIO {} is not exported, ignoring write of {}", pin, value);
            return Ok(());
        }

        let direction = self.try_current_direction(pin)?;
        if direction == Direction::In {
            return Err(GpioError::WrongDirection { pin, direction });
        }

        self.port.write_value(pin, value)?;
        debug!("GPIO {} set to {}", pin, value);
        Ok(())
    }

    fn try_unexport(&mut self, pin: u8) -> Result<()> {
        self.validate_pin(pin)?;
        if self.port.pin_exists(pin) {
            self.port.unexport_pin(pin)?;
            info!("Unexported GPIO {}", pin);
        }
        self.exported.remove(&pin);
        Ok(())
    }

    fn try_unexport_all(&mut self) -> Result<()> {
        let pins: Vec<u8> = self.exported.iter().copied().collect();
        for pin in pins {
            self.port.unexport_pin(pin)?;
            info!("Unexported GPIO {}", pin);
            self.exported.remove(&pin);
        }
        Ok(())
    }
}

impl<P: FilesystemPort + fmt::Debug> fmt::Debug for PinController<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PinController")
            .field("profile", &self.profile)
            .field("port", &self.port)
            .field("exported", &self.exported)
            .field("strict_output", &self.strict_output)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::gpio::observer::NoopObserver;
    use crate::gpio::port::{MemoryPort, PortCall, PortOperation};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn controller() -> PinController<MemoryPort> {
        PinController::new(BoardProfile::resolve(0xa02082), MemoryPort::new())
            .with_observer(NoopObserver)
    }

    #[derive(Clone, Default)]
    struct Recorder(Rc<RefCell<Vec<(Operation, Option<u8>, ErrorKind)>>>);

    impl ControllerObserver for Recorder {
        fn on_failure(&self, operation: Operation, pin: Option<u8>, error: &GpioError) {
            self.0.borrow_mut().push((operation, pin, error.kind()));
        }
    }

    #[test]
    fn test_invalid_pin_rejected_before_io() {
        let mut gpio = PinController::new(BoardProfile::resolve(2), MemoryPort::new())
            .with_observer(NoopObserver);

        let err = gpio.setup(26, Direction::Out).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPin);
        assert_eq!(gpio.is_exported(26).unwrap_err().kind(), ErrorKind::InvalidPin);
        assert_eq!(gpio.input(26).unwrap_err().kind(), ErrorKind::InvalidPin);
        assert_eq!(
            gpio.output(26, DigitalValue::High).unwrap_err().kind(),
            ErrorKind::InvalidPin
        );
        assert_eq!(gpio.output_raw(26, 1).unwrap_err().kind(), ErrorKind::InvalidPin);
        assert_eq!(
            gpio.current_direction(26).unwrap_err().kind(),
            ErrorKind::InvalidPin
        );
        assert_eq!(gpio.unexport(26).unwrap_err().kind(), ErrorKind::InvalidPin);
        assert!(gpio.port().calls().is_empty());
    }

    #[test]
    fn test_setup_exports_and_sets_direction() {
        let mut gpio = controller();
        gpio.setup(17, Direction::Out).unwrap();

        assert_eq!(
            gpio.port().calls(),
            vec![
                PortCall::Exists(17),
                PortCall::Export(17),
                PortCall::WriteDirection(17, Direction::Out),
            ]
        );
        assert_eq!(gpio.exported_pins(), vec![17]);
        assert_eq!(gpio.current_direction(17).unwrap(), Direction::Out);
    }

    #[test]
    fn test_setup_reexports_existing_pin() {
        let port = MemoryPort::new().with_exported(18, Direction::Out);
        let mut gpio = PinController::new(BoardProfile::resolve(0xa02082), port)
            .with_observer(NoopObserver);

        gpio.setup(18, Direction::In).unwrap();
        let calls = gpio.port().calls();
        assert!(calls.contains(&PortCall::Unexport(18)));
        assert!(calls.contains(&PortCall::Export(18)));
        assert_eq!(gpio.current_direction(18).unwrap(), Direction::In);
        assert_eq!(gpio.exported_pins(), vec![18]);
    }

    #[test]
    fn test_direction_guard() {
        let mut gpio = controller();
        gpio.setup(17, Direction::Out).unwrap();
        gpio.setup(27, Direction::In).unwrap();

        let err = gpio.input(17).unwrap_err();
        assert!(matches!(
            err,
            GpioError::WrongDirection {
                pin: 17,
                direction: Direction::Out
            }
        ));

        gpio.port().clear_calls();
        let err = gpio.output(27, DigitalValue::High).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WrongDirection);
        assert!(!gpio
            .port()
            .calls()
            .iter()
            .any(|call| matches!(call, PortCall::WriteValue(..))));
    }

    #[test]
    fn test_direction_rechecked_every_call() {
        let mut gpio = controller();
        gpio.setup(22, Direction::Out).unwrap();
        gpio.output(22, DigitalValue::High).unwrap();

        gpio.port_mut().set_direction_externally(22, Direction::In);
        assert_eq!(
            gpio.output(22, DigitalValue::Low).unwrap_err().kind(),
            ErrorKind::WrongDirection
        );
        gpio.port_mut().set_level(22, DigitalValue::High);
        assert_eq!(gpio.input(22).unwrap(), DigitalValue::High);
    }

    #[test]
    fn test_input_requires_export() {
        let gpio = controller();
        assert_eq!(gpio.input(4).unwrap_err().kind(), ErrorKind::NotExported);
        assert_eq!(
            gpio.current_direction(4).unwrap_err().kind(),
            ErrorKind::NotExported
        );
    }

    #[test]
    fn test_output_on_unexported_pin() {
        let mut gpio = controller();
        gpio.output(5, DigitalValue::High).unwrap();
        assert_eq!(gpio.port().calls(), vec![PortCall::Exists(5)]);

        let mut strict = controller().with_strict_output(true);
        assert_eq!(
            strict.output(5, DigitalValue::High).unwrap_err().kind(),
            ErrorKind::NotExported
        );
    }

    #[test]
    fn test_output_raw_validates_value() {
        let mut gpio = controller();
        gpio.setup(23, Direction::Out).unwrap();
        assert_eq!(
            gpio.output_raw(23, 2).unwrap_err().kind(),
            ErrorKind::InvalidValue
        );
        assert_eq!(gpio.output_raw(1, 2).unwrap_err().kind(), ErrorKind::InvalidPin);
        gpio.output_raw(23, 1).unwrap();
        assert_eq!(gpio.port().level(23), Some(DigitalValue::High));
    }

    #[test]
    fn test_unexport_is_idempotent() {
        let mut gpio = controller();
        gpio.setup(24, Direction::In).unwrap();
        gpio.unexport(24).unwrap();
        assert!(gpio.exported_pins().is_empty());
        assert!(!gpio.is_exported(24).unwrap());

        gpio.port().clear_calls();
        gpio.unexport(24).unwrap();
        assert_eq!(gpio.port().calls(), vec![PortCall::Exists(24)]);
    }

    #[test]
    fn test_unexport_all_drains_tracked_pins() {
        let mut gpio = controller();
        gpio.setup(4, Direction::In)
            .unwrap()
            .setup(17, Direction::Out)
            .unwrap()
            .setup(27, Direction::Out)
            .unwrap();
        gpio.port().clear_calls();

        gpio.unexport_all().unwrap();
        let unexports = gpio
            .port()
            .calls()
            .into_iter()
            .filter(|call| matches!(call, PortCall::Unexport(_)))
            .count();
        assert_eq!(unexports, 3);
        assert!(gpio.exported_pins().is_empty());
        assert!(gpio.port().exported().is_empty());
    }

    #[test]
    fn test_unexport_all_calls_port_for_every_tracked_pin() {
        let mut gpio = controller();
        gpio.setup(4, Direction::Out).unwrap();
        gpio.setup(17, Direction::Out).unwrap();
        gpio.port().clear_calls();

        gpio.unexport_all().unwrap();
        assert_eq!(
            gpio.port().calls(),
            vec![PortCall::Unexport(4), PortCall::Unexport(17)]
        );
        assert!(gpio.exported_pins().is_empty());
    }

    #[test]
    fn test_unexport_all_does_not_skip_vanished_pins() {
        let mut gpio = controller();
        gpio.setup(4, Direction::In).unwrap();
        gpio.setup(5, Direction::In).unwrap();
        gpio.port_mut().remove_externally(4);
        gpio.port().clear_calls();

        // The kernel refuses the stale pin; nothing after it is touched
        let err = gpio.unexport_all().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(gpio.port().calls(), vec![PortCall::Unexport(4)]);
        assert_eq!(gpio.exported_pins(), vec![4, 5]);
    }

    #[test]
    fn test_port_failure_propagates_without_tracking() {
        let mut gpio = controller();
        gpio.port_mut().inject_failure(PortOperation::Export);

        let err = gpio.setup(17, Direction::Out).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(gpio.exported_pins().is_empty());
    }

    #[test]
    fn test_failed_direction_write_keeps_pin_tracked() {
        let mut gpio = controller();
        gpio.port_mut().inject_failure(PortOperation::WriteDirection);

        assert_eq!(
            gpio.setup(17, Direction::Out).unwrap_err().kind(),
            ErrorKind::Io
        );
        assert_eq!(gpio.exported_pins(), vec![17]);

        gpio.port_mut().clear_failures();
        gpio.unexport_all().unwrap();
        assert!(gpio.port().exported().is_empty());
    }

    #[test]
    fn test_observer_sees_each_failure_once() {
        let recorder = Recorder::default();
        let mut gpio = PinController::new(BoardProfile::resolve(0xa02082), MemoryPort::new())
            .with_observer(recorder.clone());

        let _ = gpio.setup(1, Direction::Out);
        let _ = gpio.input(17);
        gpio.setup(17, Direction::Out).unwrap();
        let _ = gpio.input(17);

        assert_eq!(
            *recorder.0.borrow(),
            vec![
                (Operation::Setup, Some(1), ErrorKind::InvalidPin),
                (Operation::Input, Some(17), ErrorKind::NotExported),
                (Operation::Input, Some(17), ErrorKind::WrongDirection),
            ]
        );
    }
}
