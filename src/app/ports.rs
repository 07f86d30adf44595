//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ FeederService (domain)
//! ```
//!
//! Driven adapters (H-bridge, clocks, schedule storage, the menu display)
//! implement these traits. The [`FeederService`](super::service::FeederService)
//! and [`MotorController`](crate::control::motor::MotorController) consume
//! them via generics, so the domain core never touches hardware directly.

use crate::drivers::button::ButtonEvent;
use crate::error::ScheduleError;
use crate::scheduler::{FeedingSchedule, FeedingScheduler, StoredSchedule, TimeOfDay};

// ───────────────────────────────────────────────────────────────
// Motor port (driven adapter: domain → H-bridge)
// ───────────────────────────────────────────────────────────────

/// Signed duty output to the wheel motor.
pub trait MotorPort {
    /// Drive at `duty` in ±[`DUTY_FULL_SCALE`](crate::drivers::hbridge::DUTY_FULL_SCALE).
    /// Implementations saturate out-of-range values. Zero releases both inputs.
    fn drive(&mut self, duty: i32);

    /// Release both bridge inputs.
    fn stop(&mut self) {
        self.drive(0);
    }
}

// ───────────────────────────────────────────────────────────────
// Clock ports
// ───────────────────────────────────────────────────────────────

/// Monotonic time since process start.
pub trait MonotonicClock {
    /// Milliseconds; wraps after ~49 days, callers use `wrapping_sub`.
    fn millis(&self) -> u32;

    fn micros(&self) -> u64;
}

/// Local time of day, sampled at point of use.
pub trait WallClock {
    fn now(&self) -> TimeOfDay;
}

// ───────────────────────────────────────────────────────────────
// Schedule persistence port (driven adapter: domain ↔ file)
// ───────────────────────────────────────────────────────────────

/// Loads and persists the feeding schedule as a whole.
///
/// Done flags are runtime-only and never reach the store.
pub trait SchedulePort {
    /// Read the stored schedule. [`ScheduleError::NotFound`] on first boot.
    fn load(&self) -> Result<StoredSchedule, ScheduleError>;

    /// Replace the stored schedule with `schedule`.
    fn save(&mut self, schedule: &FeedingSchedule) -> Result<(), ScheduleError>;
}

// ───────────────────────────────────────────────────────────────
// Feed delegate (decouples scheduler from the motor)
// ───────────────────────────────────────────────────────────────

/// Callback the scheduler invokes when an entry's time arrives.
///
/// The scheduler knows nothing about motors or wheels; the service hands
/// it something that does.
pub trait FeedDelegate {
    fn feed(&mut self, portions: u8);
}

// ───────────────────────────────────────────────────────────────
// UI port (driven adapter: domain → menu / display)
// ───────────────────────────────────────────────────────────────

/// The on-device menu. Receives navigation buttons and may edit the
/// schedule through the scheduler's public mutators.
pub trait UiPort {
    /// A debounced UP/DOWN/LEFT/RIGHT press. FEED never reaches the UI.
    fn on_button<S: SchedulePort>(&mut self, event: ButtonEvent, scheduler: &mut FeedingScheduler<S>);

    /// Redraw once per tick. `minutes_to_next` is `u16::MAX` when the
    /// schedule is empty.
    fn refresh<S: SchedulePort>(&mut self, scheduler: &FeedingScheduler<S>, minutes_to_next: u16);
}
