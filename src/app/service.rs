//! Application service: the hexagonal core.
//!
//! [`FeederService`] owns the motor controller and the feeding scheduler
//! and runs one main-loop tick at a time. Buttons and the UI are injected
//! at the call site, making the entire service testable with mock adapters.
//!
//! ```text
//!  ButtonPanel ──▶ ┌──────────────────────────┐ ──▶ UiPort
//!                  │      FeederService       │
//!    WallClock ──▶ │  Scheduler · Motor · PID │ ──▶ MotorPort
//!                  └──────────────────────────┘ ◀─▶ SchedulePort
//! ```

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::InputPin;
use log::{error, info, warn};

use crate::control::motor::MotorController;
use crate::drivers::button::{ButtonEvent, ButtonPanel};
use crate::error::{Error, MotorFault, ScheduleError};
use crate::scheduler::FeedingScheduler;

use super::commands::{AppCommand, CommandOutcome};
use super::ports::{FeedDelegate, MonotonicClock, MotorPort, SchedulePort, UiPort, WallClock};

// ───────────────────────────────────────────────────────────────
// Feed delegate over the motor controller
// ───────────────────────────────────────────────────────────────

/// Hands scheduled feedings to the motor and keeps the first fault.
struct WheelFeeder<'a, M, C> {
    motor: &'a mut MotorController<M, C>,
    wheel_arms: u8,
    fault: Option<MotorFault>,
}

impl<M: MotorPort, C: MonotonicClock + DelayNs> FeedDelegate for WheelFeeder<'_, M, C> {
    fn feed(&mut self, portions: u8) {
        if let Err(fault) = self.motor.feed(portions, self.wheel_arms) {
            error!("Feeding of {} portions aborted: {}", portions, Error::from(fault));
            self.fault.get_or_insert(fault);
        }
    }
}

// ───────────────────────────────────────────────────────────────
// FeederService
// ───────────────────────────────────────────────────────────────

pub struct FeederService<M, C, S, W> {
    motor: MotorController<M, C>,
    scheduler: FeedingScheduler<S>,
    clock: C,
    wall: W,
    tick_count: u64,
    last_fault: Option<MotorFault>,
}

impl<M, C, S, W> FeederService<M, C, S, W>
where
    M: MotorPort,
    C: MonotonicClock + DelayNs + Clone,
    S: SchedulePort,
    W: WallClock,
{
    /// `clock` is shared with the motor controller for debounce timing.
    pub fn new(motor: MotorController<M, C>, scheduler: FeedingScheduler<S>, clock: C, wall: W) -> Self {
        Self {
            motor,
            scheduler,
            clock,
            wall,
            tick_count: 0,
            last_fault: None,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Load the persisted schedule. A failure leaves an empty schedule
    /// with the default wheel and is reported, not fatal.
    pub fn start(&mut self) -> Result<usize, ScheduleError> {
        let loaded = self.scheduler.load();
        if let Err(e) = loaded {
            warn!("No feeding schedule loaded ({}), starting empty", Error::from(e));
        }
        info!("Feeder initialization complete");
        loaded
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one main-loop cycle: buttons → scheduler → UI refresh.
    ///
    /// A motor action started here blocks until it completes or faults.
    /// Faults are logged and remembered; the loop carries on.
    pub fn tick<P: InputPin>(&mut self, buttons: &mut ButtonPanel<P>, ui: &mut impl UiPort) {
        self.tick_count += 1;

        // 1. Debounced button events
        for event in buttons.poll(self.clock.millis()) {
            match event {
                ButtonEvent::Feed => self.rotate_one_arm(),
                nav => ui.on_button(nav, &mut self.scheduler),
            }
        }

        // 2. Scheduled feeding
        let now = self.wall.now();
        let mut feeder = WheelFeeder {
            motor: &mut self.motor,
            wheel_arms: self.scheduler.wheel_arms(),
            fault: None,
        };
        self.scheduler.handle_feeding(now, &mut feeder);
        if let Some(fault) = feeder.fault {
            self.last_fault = Some(fault);
        }

        // 3. Display
        let minutes = self.scheduler.minutes_to_next_feeding(now);
        ui.refresh(&self.scheduler, minutes);
    }

    /// Manual feed: one arm's worth of wheel rotation.
    fn rotate_one_arm(&mut self) {
        let degrees = 360 / i32::from(self.scheduler.wheel_arms().max(1));
        if let Err(fault) = self.motor.rotate_by(degrees) {
            error!("Manual feed aborted: {}", Error::from(fault));
            self.last_fault = Some(fault);
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command.
    pub fn handle_command(&mut self, cmd: AppCommand) -> CommandOutcome {
        match cmd {
            AppCommand::FeedNow { portions } => {
                match self.motor.feed(portions, self.scheduler.wheel_arms()) {
                    Ok(()) => CommandOutcome::Done(None),
                    Err(fault) => {
                        error!("Feeding of {} portions aborted: {}", portions, Error::from(fault));
                        self.last_fault = Some(fault);
                        CommandOutcome::Fault(fault)
                    }
                }
            }
            AppCommand::AddFeeding {
                hour,
                minute,
                portions,
            } => {
                if self.scheduler.is_feeding_time_duplicate(hour, minute) {
                    warn!("Feeding time {}:{} already exists", hour, minute);
                    return CommandOutcome::Duplicate;
                }
                self.scheduler.add_feeding_time(hour, minute, portions).into()
            }
            AppCommand::RemoveFeeding { index } => match self.scheduler.remove_feeding_time(index) {
                Some(_) => CommandOutcome::Done(None),
                None => CommandOutcome::Rejected,
            },
            AppCommand::ModifyFeeding {
                index,
                hour,
                minute,
            } => {
                let unchanged = self.scheduler.hour(index) == Some(hour)
                    && self.scheduler.minute(index) == Some(minute);
                if !unchanged && self.scheduler.is_feeding_time_duplicate(hour, minute) {
                    warn!("Feeding time {}:{} already exists", hour, minute);
                    return CommandOutcome::Duplicate;
                }
                match self.scheduler.save_modified_feeding_time(index, hour, minute) {
                    Some(new_index) => CommandOutcome::Done(Some(new_index)),
                    None => CommandOutcome::Rejected,
                }
            }
            AppCommand::SetPortions { index, portions } => {
                if self.scheduler.set_portions(index, portions) {
                    CommandOutcome::Done(Some(index))
                } else {
                    CommandOutcome::Rejected
                }
            }
            AppCommand::SetWheelArms { arms } => {
                if self.scheduler.set_wheel_arms(arms) {
                    CommandOutcome::Done(None)
                } else {
                    CommandOutcome::Rejected
                }
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn scheduler(&self) -> &FeedingScheduler<S> {
        &self.scheduler
    }

    pub fn motor(&self) -> &MotorController<M, C> {
        &self.motor
    }

    /// Total main-loop ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Most recent motor fault, if any.
    pub fn last_fault(&self) -> Option<MotorFault> {
        self.last_fault
    }
}
