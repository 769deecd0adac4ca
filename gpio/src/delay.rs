//! Microsecond wait capability used between bit transitions.

use std::fmt::Debug;
use std::hint::spin_loop;
use std::thread::sleep;
use std::time::{Duration, Instant};

/// Something that can block the calling thread for a number of microseconds.
///
/// The HT1621 serial interface has no clock recovery, so every transition has to be held for a
/// minimum time. Drivers take this as a trait object so tests can swap in a recording stub.
pub trait Delay: Debug {
    fn delay_us(&self, us: u32);
}

/// Busy-waits until the requested time has elapsed.
///
/// Scheduler wake-up latency on Linux is usually far above 20 µs, so spinning keeps the bit
/// rate close to what the chip needs instead of sleeping for a millisecond per bit.
#[derive(Debug, Default, Copy, Clone)]
pub struct SpinDelay;

impl Delay for SpinDelay {
    fn delay_us(&self, us: u32) {
        let until = Instant::now() + Duration::from_micros(us as u64);
        while Instant::now() < until {
            spin_loop();
        }
    }
}

/// Yields the thread to the OS for the requested time.
#[derive(Debug, Default, Copy, Clone)]
pub struct SleepDelay;

impl Delay for SleepDelay {
    fn delay_us(&self, us: u32) {
        sleep(Duration::from_micros(us as u64));
    }
}
