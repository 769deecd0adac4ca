//! Recording GPIO backend for tests.
//!
//! Every pin write and every delay goes into one shared, ordered [MockLog], so the exact
//! waveform a driver produced can be replayed and checked afterwards.
use crate::delay::Delay;
use crate::{GpioDriver, GpioError, GpioOutput, GpioPin, GpioResult};
use std::cell::RefCell;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MockEvent {
    /// Pin `pin` was driven to `high`.
    Write { pin: usize, high: bool },
    /// The driver waited for this many microseconds.
    Delay(u32),
}

/// Shared, cloneable event log.
#[derive(Clone, Default)]
pub struct MockLog(Rc<RefCell<Vec<MockEvent>>>);

impl MockLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: MockEvent) {
        self.0.borrow_mut().push(event);
    }

    pub fn events(&self) -> Vec<MockEvent> {
        self.0.borrow().clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    /// Only the pin writes, as `(pin, high)` pairs.
    pub fn writes(&self) -> Vec<(usize, bool)> {
        self.0
            .borrow()
            .iter()
            .filter_map(|event| match *event {
                MockEvent::Write { pin, high } => Some((pin, high)),
                MockEvent::Delay(_) => None,
            })
            .collect()
    }

    pub fn output(&self, pin: usize) -> MockOutput {
        MockOutput { pin, log: self.clone() }
    }

    pub fn delay(&self) -> MockDelay {
        MockDelay { log: self.clone() }
    }

    /// Decodes the recorded waveform into frames.
    ///
    /// A frame starts when `cs` goes low and ends when it goes high again. Inside a frame, a bit
    /// is latched on every rising edge of `clock`, taking whatever level `data` was last driven to.
    pub fn frames(&self, data: usize, clock: usize, cs: usize) -> Vec<Vec<bool>> {
        let mut frames = Vec::new();
        let mut current: Option<Vec<bool>> = None;
        let mut data_level = false;
        let mut clock_level = true;

        for (pin, high) in self.writes() {
            if pin == cs {
                match (high, current.take()) {
                    (false, None) => current = Some(Vec::new()),
                    (true, Some(bits)) => frames.push(bits),
                    (_, other) => current = other,
                }
            } else if pin == data {
                data_level = high;
            } else if pin == clock {
                if high && !clock_level {
                    if let Some(bits) = current.as_mut() {
                        bits.push(data_level);
                    }
                }
                clock_level = high;
            }
        }

        frames
    }
}

impl Debug for MockLog {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "MockLog({} events)", self.0.borrow().len())
    }
}

/// Output pin that records its writes.
#[derive(Debug, Clone)]
pub struct MockOutput {
    pin: usize,
    log: MockLog,
}

impl GpioOutput for MockOutput {
    fn write(&self, value: bool) -> GpioResult<()> {
        self.log.push(MockEvent::Write { pin: self.pin, high: value });
        Ok(())
    }
}

/// Delay that returns immediately and only records how long it was asked to wait.
#[derive(Debug, Clone)]
pub struct MockDelay {
    log: MockLog,
}

impl Delay for MockDelay {
    fn delay_us(&self, us: u32) {
        self.log.push(MockEvent::Delay(us));
    }
}

/// Output pin that fails every write after a given number of successful ones.
#[derive(Debug)]
pub struct FailingOutput {
    inner: MockOutput,
    remaining: RefCell<usize>,
}

impl FailingOutput {
    pub fn new(inner: MockOutput, successful_writes: usize) -> Self {
        Self {
            inner,
            remaining: RefCell::new(successful_writes),
        }
    }
}

impl GpioOutput for FailingOutput {
    fn write(&self, value: bool) -> GpioResult<()> {
        let mut remaining = self.remaining.borrow_mut();
        if *remaining == 0 {
            return Err(GpioError::Io(std::io::ErrorKind::BrokenPipe));
        }
        *remaining -= 1;
        self.inner.write(value)
    }
}

/// Pin-granting driver on top of a [MockLog].
///
/// Pins listed in `rejected` fail when configured as outputs, which mimics a platform refusing
/// the request (for example, a line claimed by the kernel).
#[derive(Debug)]
pub struct MockGpioDriver {
    log: MockLog,
    used_pins: RefCell<Vec<bool>>,
    rejected: Vec<usize>,
}

impl MockGpioDriver {
    pub fn new(log: MockLog, pin_count: usize) -> Self {
        Self {
            log,
            used_pins: RefCell::new(vec![false; pin_count]),
            rejected: Vec::new(),
        }
    }

    pub fn with_rejected_pin(mut self, index: usize) -> Self {
        self.rejected.push(index);
        self
    }
}

impl GpioDriver for MockGpioDriver {
    fn count(&self) -> GpioResult<usize> {
        Ok(self.used_pins.borrow().len())
    }

    fn get_pin(&self, index: usize) -> GpioResult<Box<dyn GpioPin + '_>> {
        let mut used_pins = self.used_pins.borrow_mut();
        match used_pins.get_mut(index) {
            None => Err(GpioError::InvalidArgument),
            Some(true) => Err(GpioError::AlreadyInUse),
            Some(used) => {
                *used = true;
                Ok(Box::new(MockPin { driver: self, index }))
            }
        }
    }
}

struct MockPin<'a> {
    driver: &'a MockGpioDriver,
    index: usize,
}

impl Debug for MockPin<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "MockPin[{}]", self.index)
    }
}

impl GpioPin for MockPin<'_> {
    fn as_output(&mut self) -> GpioResult<Box<dyn GpioOutput + '_>> {
        if self.driver.rejected.contains(&self.index) {
            return Err(GpioError::Io(std::io::ErrorKind::PermissionDenied));
        }
        Ok(Box::new(self.driver.log.output(self.index)))
    }
}

impl Drop for MockPin<'_> {
    fn drop(&mut self) {
        if let Some(used) = self.driver.used_pins.borrow_mut().get_mut(self.index) {
            *used = false;
        }
    }
}
