//! Integration tests for the FeederService main-loop tick.
//!
//! Exercises the full chain: pin level → debounced button event → motor
//! rotation, and wall clock → scheduler → feed delegate → motor, with the
//! UI and store replaced by recording mocks.

use std::sync::Arc;

use petfeeder::app::commands::{AppCommand, CommandOutcome};
use petfeeder::app::service::FeederService;
use petfeeder::config::FeederConfig;
use petfeeder::control::motor::MotorController;
use petfeeder::drivers::button::{ButtonDriver, ButtonEvent, ButtonPanel, EdgeFlag};
use petfeeder::drivers::encoder::QuadratureDecoder;
use petfeeder::error::{MotorFault, ScheduleError};
use petfeeder::scheduler::{FeedingEntry, FeedingSchedule, FeedingScheduler, NO_FEEDING};

use crate::mock_hw::{MemStore, MockPin, RecordingUi, SimClock, SimMotor, SimWallClock};

type Service = FeederService<SimMotor, SimClock, MemStore, SimWallClock>;

/// One button line as the test sees it: its level and its interrupt flag.
struct Line {
    pin: MockPin,
    edge: Arc<EdgeFlag>,
}

impl Line {
    fn press(&self) {
        self.pin.press();
        self.edge.raise();
    }

    fn release(&self) {
        self.pin.release();
        self.edge.raise();
    }
}

struct Rig {
    service: Service,
    buttons: ButtonPanel<MockPin>,
    lines: Vec<Line>,
    clock: SimClock,
    wall: SimWallClock,
    ui: RecordingUi,
}

const KINDS: [ButtonEvent; 5] = [
    ButtonEvent::Up,
    ButtonEvent::Down,
    ButtonEvent::Left,
    ButtonEvent::Right,
    ButtonEvent::Feed,
];

fn rig_with(store: MemStore, configure_motor: impl FnOnce(&mut SimMotor)) -> Rig {
    let config = FeederConfig::default();
    let clock = SimClock::starting_at_ms(1_000);
    let wall = SimWallClock::at(6, 0);

    let decoder = Arc::new(QuadratureDecoder::new());
    let mut motor = SimMotor::new(Arc::clone(&decoder));
    configure_motor(&mut motor);
    let motor = MotorController::new(motor, decoder, clock.clone(), &config);
    let scheduler = FeedingScheduler::new(store, config.default_wheel_arms);
    let mut service = FeederService::new(motor, scheduler, clock.clone(), wall.clone());
    let _ = service.start();

    let lines: Vec<Line> = KINDS
        .iter()
        .map(|_| Line {
            pin: MockPin::released(),
            edge: Arc::new(EdgeFlag::new()),
        })
        .collect();
    let drivers = core::array::from_fn(|i| {
        ButtonDriver::with_edge_flag(
            KINDS[i],
            i as u8,
            lines[i].pin.clone(),
            config.debounce_ms,
            Arc::clone(&lines[i].edge),
        )
    });

    Rig {
        service,
        buttons: ButtonPanel::new(drivers),
        lines,
        clock,
        wall,
        ui: RecordingUi::default(),
    }
}

fn rig() -> Rig {
    rig_with(MemStore::default(), |_| {})
}

fn stored(times: &[(u8, u8, u8)], arms: u8) -> MemStore {
    let mut schedule = FeedingSchedule::new(arms);
    for &(h, m, p) in times {
        schedule.insert_sorted(FeedingEntry::new(h, m, p)).unwrap();
    }
    MemStore::with(schedule)
}

impl Rig {
    fn tick(&mut self) {
        self.service.tick(&mut self.buttons, &mut self.ui);
        self.clock.advance_ms(10);
    }

    fn line(&self, event: ButtonEvent) -> &Line {
        &self.lines[KINDS.iter().position(|&k| k == event).unwrap()]
    }

    fn wheel_ticks(&self) -> u32 {
        self.service.motor().motor().down_ticks
    }
}

// ── Buttons ───────────────────────────────────────────────────

#[test]
fn feed_button_rotates_one_arm() {
    let mut r = rig();
    r.line(ButtonEvent::Feed).press();
    r.tick();

    assert_eq!(r.wheel_ticks(), 897, "360/4 arms = 90 degrees");
    assert!(r.ui.buttons.is_empty(), "FEED never reaches the UI");
}

#[test]
fn held_feed_button_rotates_once() {
    let mut r = rig();
    r.line(ButtonEvent::Feed).press();
    for _ in 0..20 {
        r.tick();
        // Contact chatter while held.
        r.line(ButtonEvent::Feed).edge.raise();
    }
    assert_eq!(r.wheel_ticks(), 897);

    r.line(ButtonEvent::Feed).release();
    for _ in 0..4 {
        r.tick();
    }
    r.line(ButtonEvent::Feed).press();
    for _ in 0..4 {
        r.tick();
    }
    assert_eq!(r.wheel_ticks(), 2 * 897);
}

#[test]
fn navigation_buttons_go_to_the_ui() {
    let mut r = rig();
    r.line(ButtonEvent::Down).press();
    r.line(ButtonEvent::Left).press();
    r.tick();

    assert_eq!(r.ui.buttons, vec![ButtonEvent::Down, ButtonEvent::Left]);
    assert_eq!(r.wheel_ticks(), 0);
}

#[test]
fn ui_can_edit_the_schedule() {
    let mut r = rig();
    r.ui.add_on_up = Some((7, 0, 2));
    r.line(ButtonEvent::Up).press();
    r.tick();

    assert_eq!(r.service.scheduler().active_count(), 1);
    assert_eq!(r.service.scheduler().store().saves, 1);
}

// ── Scheduled feeding ─────────────────────────────────────────

#[test]
fn scheduled_time_feeds_once() {
    let mut r = rig_with(stored(&[(8, 0, 2)], 4), |_| {});
    r.wall.set(8, 0);

    r.tick();
    r.tick();
    r.tick();

    assert_eq!(r.wheel_ticks(), 2 * 897, "two portions, fed once");
}

#[test]
fn refresh_reports_minutes_to_next() {
    let mut r = rig_with(stored(&[(8, 0, 1), (20, 0, 1)], 4), |_| {});
    r.wall.set(7, 0);
    r.tick();
    r.wall.set(21, 0);
    r.tick();
    assert_eq!(r.ui.refreshes, vec![60, 660]);
}

#[test]
fn empty_schedule_refreshes_with_sentinel() {
    let mut r = rig();
    r.tick();
    assert_eq!(r.ui.refreshes, vec![NO_FEEDING]);
}

#[test]
fn motor_fault_is_recorded_and_loop_continues() {
    let mut r = rig_with(stored(&[(8, 0, 1)], 4), |m| m.block_positive = true);
    r.wall.set(8, 0);

    r.tick();
    assert!(matches!(
        r.service.last_fault(),
        Some(MotorFault::BackoffExhausted { .. })
    ));

    r.tick();
    assert_eq!(r.service.tick_count(), 2);
    assert_eq!(r.ui.refreshes.len(), 2);
}

#[test]
fn wheel_arms_set_rotation_angle() {
    let mut r = rig_with(stored(&[], 8), |_| {});
    r.line(ButtonEvent::Feed).press();
    r.tick();
    // 45 degrees
    assert_eq!(r.wheel_ticks(), 448);
}

// ── Startup ───────────────────────────────────────────────────

#[test]
fn missing_schedule_defaults_to_four_arms() {
    let mut r = rig();
    assert_eq!(r.service.scheduler().wheel_arms(), 4);
    assert_eq!(r.service.start(), Err(ScheduleError::NotFound));
}

// ── Commands ──────────────────────────────────────────────────

#[test]
fn add_command_rejects_duplicates() {
    let mut r = rig();
    let add = AppCommand::AddFeeding {
        hour: 9,
        minute: 30,
        portions: 1,
    };
    assert_eq!(r.service.handle_command(add), CommandOutcome::Done(Some(0)));
    assert_eq!(r.service.handle_command(add), CommandOutcome::Duplicate);
    assert_eq!(r.service.scheduler().active_count(), 1);
}

#[test]
fn modify_command_returns_new_index() {
    let mut r = rig_with(stored(&[(6, 0, 3), (12, 0, 1)], 4), |_| {});
    let outcome = r.service.handle_command(AppCommand::ModifyFeeding {
        index: 0,
        hour: 18,
        minute: 0,
    });
    assert_eq!(outcome, CommandOutcome::Done(Some(1)));
    assert_eq!(r.service.scheduler().portions(1), Some(3));

    let outcome = r.service.handle_command(AppCommand::ModifyFeeding {
        index: 0,
        hour: 18,
        minute: 0,
    });
    assert_eq!(outcome, CommandOutcome::Duplicate);
}

#[test]
fn modify_to_its_own_time_is_not_a_duplicate() {
    let mut r = rig_with(stored(&[(6, 0, 3), (12, 0, 1)], 4), |_| {});
    let outcome = r.service.handle_command(AppCommand::ModifyFeeding {
        index: 1,
        hour: 12,
        minute: 0,
    });
    assert_eq!(outcome, CommandOutcome::Done(Some(1)));
    assert_eq!(r.service.scheduler().active_count(), 2);
    assert_eq!(r.service.scheduler().portions(1), Some(1));
}

#[test]
fn remove_and_settings_commands() {
    let mut r = rig_with(stored(&[(6, 0, 3)], 4), |_| {});
    assert_eq!(
        r.service.handle_command(AppCommand::SetPortions { index: 0, portions: 5 }),
        CommandOutcome::Done(Some(0))
    );
    assert_eq!(
        r.service.handle_command(AppCommand::SetWheelArms { arms: 1 }),
        CommandOutcome::Rejected
    );
    assert_eq!(
        r.service.handle_command(AppCommand::RemoveFeeding { index: 3 }),
        CommandOutcome::Rejected
    );
    assert_eq!(
        r.service.handle_command(AppCommand::RemoveFeeding { index: 0 }),
        CommandOutcome::Done(None)
    );
    assert_eq!(r.service.scheduler().active_count(), 0);
}

#[test]
fn feed_now_command_reports_faults() {
    let mut r = rig_with(MemStore::default(), |m| m.block_positive = true);
    assert!(matches!(
        r.service.handle_command(AppCommand::FeedNow { portions: 1 }),
        CommandOutcome::Fault(MotorFault::BackoffExhausted { .. })
    ));
}
