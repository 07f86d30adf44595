//! System configuration parameters
//!
//! All tunable parameters for the feeder. Defaults match the stock
//! hardware build; a JSON file can override any subset of them.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::control::motor::MAX_BACKOFF_DEPTH;
use crate::error::Error;

/// Environment variable naming an optional JSON config file.
pub const CONFIG_ENV_VAR: &str = "PETFEEDER_CONFIG";

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeederConfig {
    // --- Inputs ---
    /// Button debounce window (milliseconds)
    pub debounce_ms: u32,

    // --- Motor / encoder ---
    /// Encoder counts per motor-shaft revolution
    pub encoder_counts_per_rev: u32,
    /// Gearbox reduction between motor shaft and feeding wheel
    pub gear_ratio: f32,

    // --- PID ---
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
    /// Target control-loop period (microseconds)
    pub control_period_us: u32,

    // --- Stall recovery ---
    /// Consecutive identical-error iterations that count as a stall
    pub stall_iterations: u32,
    /// Pause after a back-off before resuming (milliseconds)
    pub stall_settle_ms: u32,
    /// Stalls tolerated per rotation command before faulting
    pub max_stall_retries: u8,
    /// Maximum nesting of back-off rotations
    pub max_backoff_depth: u8,

    // --- Feeding ---
    /// Pause between dispensed portions (milliseconds)
    pub portion_pause_ms: u32,
    /// Wheel arm count used when no schedule file can be read
    pub default_wheel_arms: u8,
    /// Schedule file location
    pub schedule_path: String,

    // --- Timing ---
    /// Main loop sleep per tick (milliseconds)
    pub tick_interval_ms: u32,

    // --- Logging ---
    /// Also write `logger_<timestamp>.log` in `log_dir`
    pub log_to_file: bool,
    pub log_dir: String,
}

impl Default for FeederConfig {
    fn default() -> Self {
        Self {
            // Inputs
            debounce_ms: 20,

            // Motor: 48 CPR encoder on a 74.83:1 gearbox
            encoder_counts_per_rev: 48,
            gear_ratio: 74.83,

            // PID: proportional only
            kp: 5.0,
            ki: 0.0,
            kd: 0.0,
            control_period_us: 100,

            // Stall recovery
            stall_iterations: 150,
            stall_settle_ms: 1000,
            max_stall_retries: 4,
            max_backoff_depth: 2,

            // Feeding
            portion_pause_ms: 1000,
            default_wheel_arms: 4,
            schedule_path: "feeding.cfg".into(),

            // Timing
            tick_interval_ms: 10, // 100 Hz

            // Logging
            log_to_file: true,
            log_dir: ".".into(),
        }
    }
}

impl FeederConfig {
    /// Encoder ticks per degree of wheel rotation.
    pub fn ticks_per_degree(&self) -> f32 {
        self.encoder_counts_per_rev as f32 * self.gear_ratio / 360.0
    }

    /// Range-check every field that the control code divides by or loops on.
    pub fn validate(&self) -> Result<(), Error> {
        if self.encoder_counts_per_rev == 0 {
            return Err(Error::Config("encoder_counts_per_rev must be > 0"));
        }
        if !(self.gear_ratio.is_finite() && self.gear_ratio > 0.0) {
            return Err(Error::Config("gear_ratio must be a positive number"));
        }
        if ![self.kp, self.ki, self.kd].iter().all(|g| g.is_finite()) {
            return Err(Error::Config("PID gains must be finite"));
        }
        if self.stall_iterations == 0 {
            return Err(Error::Config("stall_iterations must be > 0"));
        }
        if self.max_backoff_depth > MAX_BACKOFF_DEPTH {
            return Err(Error::Config("max_backoff_depth must be <= 7"));
        }
        if self.default_wheel_arms < 2 {
            return Err(Error::Config("default_wheel_arms must be >= 2"));
        }
        if self.tick_interval_ms == 0 {
            return Err(Error::Config("tick_interval_ms must be > 0"));
        }
        if self.schedule_path.is_empty() {
            return Err(Error::Config("schedule_path must not be empty"));
        }
        Ok(())
    }

    /// Load from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)
            .map_err(|_| Error::Config("config file unreadable"))?;
        let cfg: Self =
            serde_json::from_str(&text).map_err(|_| Error::Config("config file is not valid JSON"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Resolve the startup configuration: the file named by
    /// `PETFEEDER_CONFIG` if set, defaults otherwise.
    ///
    /// Runs before the logger exists, so failures are returned rather than
    /// logged.
    pub fn from_env() -> Result<Self, Error> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::from_json_file(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }
}
