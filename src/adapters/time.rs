//! Clock adapters.
//!
//! - [`SystemClock`]: monotonic time since construction from
//!   `std::time::Instant`, plus sleeping delays for the control loop.
//! - [`LocalWallClock`]: local time of day from `chrono::Local`, sampled
//!   on every call. Clock adjustments take effect immediately.

use std::time::{Duration, Instant};

use chrono::{Local, Timelike};
use embedded_hal::delay::DelayNs;

use crate::app::ports::{MonotonicClock, WallClock};
use crate::scheduler::TimeOfDay;

/// Monotonic clock and delay provider. Clones share the same epoch.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl MonotonicClock for SystemClock {
    fn millis(&self) -> u32 {
        // Truncation wraps every ~49 days; consumers use wrapping_sub.
        self.start.elapsed().as_millis() as u32
    }

    fn micros(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}

impl DelayNs for SystemClock {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(u64::from(ns)));
    }

    fn delay_us(&mut self, us: u32) {
        std::thread::sleep(Duration::from_micros(u64::from(us)));
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}

/// Local wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalWallClock;

impl WallClock for LocalWallClock {
    fn now(&self) -> TimeOfDay {
        let now = Local::now();
        TimeOfDay {
            hour: now.hour() as u8,
            minute: now.minute() as u8,
        }
    }
}
