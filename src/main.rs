//! PetFeeder Firmware: Main Entry Point
//!
//! Hexagonal architecture around a single cooperative main loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  FeederHardware      FileScheduleStore   SystemClock           │
//! │  (buttons, H-bridge, (SchedulePort)      (MonotonicClock)      │
//! │   encoder ISRs)      LogStatusUi         LocalWallClock        │
//! │                      (UiPort)            (WallClock)           │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            FeederService (pure logic)                  │    │
//! │  │  FeedingScheduler · MotorController · PID              │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::time::Duration;

use anyhow::{Context, Result};
use log::{info, warn};

use petfeeder::adapters::hardware;
use petfeeder::adapters::log_sink::init_logger;
use petfeeder::adapters::schedule_file::FileScheduleStore;
use petfeeder::adapters::status_ui::LogStatusUi;
use petfeeder::adapters::time::{LocalWallClock, SystemClock};
use petfeeder::app::service::FeederService;
use petfeeder::config::FeederConfig;
use petfeeder::control::motor::MotorController;
use petfeeder::error::Error;
use petfeeder::scheduler::FeedingScheduler;

fn main() -> Result<()> {
    // ── 1. Config + logger ────────────────────────────────────
    let (config, config_error) = match FeederConfig::from_env() {
        Ok(cfg) => (cfg, None),
        Err(e) => (FeederConfig::default(), Some(e)),
    };
    let log_file = init_logger(&config).context("Error during logger initialization")?;

    info!("PetFeeder v{}", env!("CARGO_PKG_VERSION"));
    if let Some(path) = log_file {
        info!("Logging to {}", path.display());
    }
    if let Some(e) = config_error {
        warn!("Config load failed ({}), using defaults", e);
    }

    // ── 2. Hardware (fatal on failure) ────────────────────────
    let hw = hardware::init(&config)
        .map_err(Error::from)
        .context("Error during hardware initialization")?;
    let mut buttons = hw.buttons;

    // ── 3. Domain objects ─────────────────────────────────────
    let clock = SystemClock::new();
    let motor = MotorController::new(hw.motor, hw.decoder, clock, &config);
    let store = FileScheduleStore::new(&config.schedule_path);
    info!("Feeding schedule file: {}", store.path().display());
    let scheduler = FeedingScheduler::new(store, config.default_wheel_arms);
    let mut service = FeederService::new(motor, scheduler, clock, LocalWallClock);
    let mut ui = LogStatusUi::new();

    // Schedule load failure is reported inside and never fatal.
    let _ = service.start();

    // ── 4. Main loop ──────────────────────────────────────────
    let tick = Duration::from_millis(u64::from(config.tick_interval_ms));
    loop {
        service.tick(&mut buttons, &mut ui);
        std::thread::sleep(tick);
    }
}
