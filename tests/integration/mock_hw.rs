//! Mock hardware for integration tests.
//!
//! A simulated motor plant that turns duty into encoder edges, a manually
//! advanced clock, settable input pins, and recording store/UI adapters.
//! Everything runs on the host with no real GPIO/PWM.

use std::cell::Cell;
use std::convert::Infallible;
use std::rc::Rc;
use std::sync::Arc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin};
use petfeeder::app::ports::{MonotonicClock, MotorPort, SchedulePort, UiPort, WallClock};
use petfeeder::drivers::button::ButtonEvent;
use petfeeder::drivers::encoder::QuadratureDecoder;
use petfeeder::error::ScheduleError;
use petfeeder::scheduler::{FeedingSchedule, FeedingScheduler, StoredSchedule, TimeOfDay};

// ── SimClock ──────────────────────────────────────────────────

/// Monotonic clock that only moves when a delay is requested.
/// Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    us: Rc<Cell<u64>>,
}

#[allow(dead_code)]
impl SimClock {
    pub fn starting_at_ms(ms: u64) -> Self {
        let clock = Self::default();
        clock.us.set(ms * 1_000);
        clock
    }

    pub fn advance_ms(&self, ms: u64) {
        self.us.set(self.us.get() + ms * 1_000);
    }
}

impl MonotonicClock for SimClock {
    fn millis(&self) -> u32 {
        (self.us.get() / 1_000) as u32
    }

    fn micros(&self) -> u64 {
        self.us.get()
    }
}

impl DelayNs for SimClock {
    fn delay_ns(&mut self, ns: u32) {
        self.us.set(self.us.get() + u64::from(ns).div_ceil(1_000));
    }

    fn delay_us(&mut self, us: u32) {
        self.us.set(self.us.get() + u64::from(us));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.advance_ms(u64::from(ms));
    }
}

// ── SimWallClock ──────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SimWallClock {
    now: Rc<Cell<TimeOfDay>>,
}

#[allow(dead_code)]
impl SimWallClock {
    pub fn at(hour: u8, minute: u8) -> Self {
        Self {
            now: Rc::new(Cell::new(TimeOfDay { hour, minute })),
        }
    }

    pub fn set(&self, hour: u8, minute: u8) {
        self.now.set(TimeOfDay { hour, minute });
    }
}

impl WallClock for SimWallClock {
    fn now(&self) -> TimeOfDay {
        self.now.get()
    }
}

// ── SimMotor ──────────────────────────────────────────────────

/// Gray-code states of one electrical cycle, as (A, B).
const GRAY: [(bool, bool); 4] = [(false, false), (true, false), (true, true), (false, true)];

/// Motor plant feeding a real [`QuadratureDecoder`].
///
/// Positive duty turns the shaft so the encoder counts down, negative duty
/// counts up. Each drive call moves `max(1, |duty| / 64)` ticks; duties
/// below 5 do not overcome friction. A blocked direction does not move.
pub struct SimMotor {
    decoder: Arc<QuadratureDecoder>,
    phase: usize,
    /// Every duty written, in order.
    pub drives: Vec<i32>,
    /// Ticks moved with positive / negative duty.
    pub down_ticks: u32,
    pub up_ticks: u32,
    pub block_positive: bool,
    pub block_negative: bool,
    /// Drive calls per direction still to be blocked before the jam clears.
    pub jam_positive_calls: u32,
    pub jam_negative_calls: u32,
}

#[allow(dead_code)]
impl SimMotor {
    pub fn new(decoder: Arc<QuadratureDecoder>) -> Self {
        decoder.seed_levels(GRAY[0].0, GRAY[0].1);
        Self {
            decoder,
            phase: 0,
            drives: Vec::new(),
            down_ticks: 0,
            up_ticks: 0,
            block_positive: false,
            block_negative: false,
            jam_positive_calls: 0,
            jam_negative_calls: 0,
        }
    }

    pub fn last_duty(&self) -> Option<i32> {
        self.drives.last().copied()
    }

    fn step(&mut self, count_up: bool) {
        let next = if count_up {
            (self.phase + 1) % 4
        } else {
            (self.phase + 3) % 4
        };
        let (a0, _) = GRAY[self.phase];
        let (a1, b1) = GRAY[next];
        if a0 != a1 {
            self.decoder.on_edge_a(a1);
        } else {
            self.decoder.on_edge_b(b1);
        }
        self.phase = next;
    }
}

impl MotorPort for SimMotor {
    fn drive(&mut self, duty: i32) {
        let duty = duty.clamp(-1024, 1024);
        self.drives.push(duty);
        if duty.abs() < 5 {
            return;
        }
        let blocked = if duty > 0 {
            if self.jam_positive_calls > 0 {
                self.jam_positive_calls -= 1;
                true
            } else {
                self.block_positive
            }
        } else if self.jam_negative_calls > 0 {
            self.jam_negative_calls -= 1;
            true
        } else {
            self.block_negative
        };
        if blocked {
            return;
        }
        let ticks = (duty.unsigned_abs() / 64).max(1);
        for _ in 0..ticks {
            self.step(duty < 0);
        }
        if duty > 0 {
            self.down_ticks += ticks;
        } else {
            self.up_ticks += ticks;
        }
    }
}

// ── MockPin ───────────────────────────────────────────────────

/// Input pin whose level the test sets through a shared cell.
#[derive(Debug, Clone)]
pub struct MockPin(pub Rc<Cell<bool>>);

#[allow(dead_code)]
impl MockPin {
    /// Idle high, like a pulled-up button.
    pub fn released() -> Self {
        Self(Rc::new(Cell::new(true)))
    }

    pub fn press(&self) {
        self.0.set(false);
    }

    pub fn release(&self) {
        self.0.set(true);
    }
}

impl ErrorType for MockPin {
    type Error = Infallible;
}

impl InputPin for MockPin {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.0.get())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.0.get())
    }
}

// ── MemStore ──────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemStore {
    pub saved: Option<FeedingSchedule>,
    pub saves: usize,
    pub fail_save: bool,
}

#[allow(dead_code)]
impl MemStore {
    pub fn with(schedule: FeedingSchedule) -> Self {
        Self {
            saved: Some(schedule),
            ..Self::default()
        }
    }
}

impl SchedulePort for MemStore {
    fn load(&self) -> Result<StoredSchedule, ScheduleError> {
        let schedule = self.saved.clone().ok_or(ScheduleError::NotFound)?;
        let lines_consumed = schedule.len();
        Ok(StoredSchedule {
            schedule,
            lines_consumed,
        })
    }

    fn save(&mut self, schedule: &FeedingSchedule) -> Result<(), ScheduleError> {
        if self.fail_save {
            return Err(ScheduleError::Io(std::io::ErrorKind::PermissionDenied));
        }
        self.saved = Some(schedule.clone());
        self.saves += 1;
        Ok(())
    }
}

// ── RecordingUi ───────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct RecordingUi {
    pub buttons: Vec<ButtonEvent>,
    pub refreshes: Vec<u16>,
    /// Feeding time the UI adds when UP is pressed.
    pub add_on_up: Option<(u8, u8, u8)>,
}

impl UiPort for RecordingUi {
    fn on_button<S: SchedulePort>(&mut self, event: ButtonEvent, scheduler: &mut FeedingScheduler<S>) {
        self.buttons.push(event);
        if let (ButtonEvent::Up, Some((h, m, p))) = (event, self.add_on_up) {
            let _ = scheduler.add_feeding_time(h, m, p);
        }
    }

    fn refresh<S: SchedulePort>(&mut self, _scheduler: &FeedingScheduler<S>, minutes_to_next: u16) {
        self.refreshes.push(minutes_to_next);
    }
}
