//! Closed-loop wheel positioning.
//!
//! [`MotorController::rotate_by`] turns the feeding wheel by a relative
//! angle using encoder feedback and a PID loop, with stall recovery:
//!
//! ```text
//!   rotate_by(D)
//!     │  reset encoder, target = D × ticks/°
//!     ▼
//!   ┌──────────────────────────────────────────────┐
//!   │ error = position + target                    │
//!   │ error unchanged for N iterations? ──▶ stall  │
//!   │ u = PID(error, dt), drive(u)                 │◀─┐
//!   │ u == 0 ──▶ segment done                      │  │
//!   └──────────────────────────────────────────────┘  │
//!     stall: stop, run back-off segment of −D/2 ──────┘
//!            wait, target += nominal back-off ticks, resume
//! ```
//!
//! Back-offs are segments on an explicit stack rather than recursive calls.
//! Each segment resets the encoder when it starts and carries its own PID
//! state; the parent's PID state survives its back-off. A finished back-off
//! extends its parent by the back-off's own nominal ticks, never by what
//! nested back-offs added to it.
//!
//! Three bounds stop the motor and return a [`MotorFault`]: too many stalls
//! in one command, back-offs nested too deep, and a back-off that would
//! bring the stalled segment's target to zero or past it. The last one is
//! a wheel jammed in one direction only, where further back-offs would just
//! drive it the wrong way.

use std::sync::Arc;

use embedded_hal::delay::DelayNs;
use log::{debug, error, info, warn};

use crate::app::ports::{MonotonicClock, MotorPort};
use crate::config::FeederConfig;
use crate::control::pid::{PidController, PidGains};
use crate::drivers::encoder::QuadratureDecoder;
use crate::error::MotorFault;

/// Deepest back-off nesting any configuration may ask for.
pub const MAX_BACKOFF_DEPTH: u8 = 7;

const MAX_SEGMENTS: usize = MAX_BACKOFF_DEPTH as usize + 1;

/// Outcome of a completed rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationReport {
    /// Commanded angle.
    pub degrees: i32,
    /// Stalls recovered from on the way.
    pub stalls: u8,
}

impl RotationReport {
    pub fn stalled(&self) -> bool {
        self.stalls > 0
    }
}

/// Tunables copied out of [`FeederConfig`].
#[derive(Debug, Clone, Copy)]
struct MotorTuning {
    gains: PidGains,
    ticks_per_degree: f32,
    control_period_us: u32,
    stall_iterations: u32,
    stall_settle_ms: u32,
    max_stall_retries: u8,
    max_backoff_depth: u8,
    portion_pause_ms: u32,
}

/// One rotation on the segment stack: the command itself or a back-off.
struct Segment {
    degrees: i32,
    /// Ticks for `degrees` alone.
    nominal: i32,
    target: i32,
    pid: PidController,
    last_error: i32,
    stagnant: u32,
    last_us: u64,
}

impl Segment {
    fn new(degrees: i32, tuning: &MotorTuning, now_us: u64) -> Self {
        let nominal = ticks_for(degrees, tuning.ticks_per_degree);
        Self {
            degrees,
            nominal,
            target: nominal,
            pid: PidController::new(tuning.gains),
            last_error: 0,
            stagnant: 0,
            last_us: now_us,
        }
    }
}

/// Degrees to whole encoder ticks, truncated toward zero.
fn ticks_for(degrees: i32, ticks_per_degree: f32) -> i32 {
    (degrees as f32 * ticks_per_degree) as i32
}

/// Whether `target` still points the way `nominal` did and is not zero.
fn keeps_direction(nominal: i32, target: i32) -> bool {
    target != 0 && target.signum() == nominal.signum()
}

/// What the loop does after one iteration of the top segment.
enum Step {
    Continue,
    Stalled,
    Reached,
}

pub struct MotorController<M, C> {
    motor: M,
    decoder: Arc<QuadratureDecoder>,
    clock: C,
    tuning: MotorTuning,
}

impl<M: MotorPort, C: MonotonicClock + DelayNs> MotorController<M, C> {
    pub fn new(motor: M, decoder: Arc<QuadratureDecoder>, clock: C, config: &FeederConfig) -> Self {
        Self {
            motor,
            decoder,
            clock,
            tuning: MotorTuning {
                gains: PidGains {
                    kp: config.kp,
                    ki: config.ki,
                    kd: config.kd,
                },
                ticks_per_degree: config.ticks_per_degree(),
                control_period_us: config.control_period_us,
                stall_iterations: config.stall_iterations,
                stall_settle_ms: config.stall_settle_ms,
                max_stall_retries: config.max_stall_retries,
                max_backoff_depth: config.max_backoff_depth.min(MAX_BACKOFF_DEPTH),
                portion_pause_ms: config.portion_pause_ms,
            },
        }
    }

    pub fn motor(&self) -> &M {
        &self.motor
    }

    pub fn decoder(&self) -> &Arc<QuadratureDecoder> {
        &self.decoder
    }

    /// Rotate the wheel by `degrees` relative to where it is now.
    ///
    /// Blocks until the control output reaches zero or the stall bounds
    /// are exhausted.
    pub fn rotate_by(&mut self, degrees: i32) -> Result<RotationReport, MotorFault> {
        info!("Rotating motor by {} degrees", degrees);

        let mut stack: heapless::Vec<Segment, MAX_SEGMENTS> = heapless::Vec::new();
        let mut stalls: u8 = 0;
        self.begin_segment(&mut stack, degrees);

        while !stack.is_empty() {
            match self.step(&mut stack) {
                Step::Continue => self.clock.delay_us(self.tuning.control_period_us),
                Step::Stalled => {
                    self.motor.stop();
                    stalls = stalls.saturating_add(1);
                    if stalls > self.tuning.max_stall_retries {
                        error!("Motor blocked {} times, giving up", stalls);
                        return Err(MotorFault::RetryLimit { stalls });
                    }
                    let depth = stack.len() as u8;
                    if depth > self.tuning.max_backoff_depth {
                        error!("Motor blocked during back-off at depth {}, giving up", depth - 1);
                        return Err(MotorFault::BackoffDepth {
                            depth: self.tuning.max_backoff_depth,
                        });
                    }
                    let Some(stalled) = stack.last() else { break };
                    let backoff = stalled.degrees / -2;
                    let extended = stalled
                        .target
                        .wrapping_add(ticks_for(backoff, self.tuning.ticks_per_degree));
                    if !keeps_direction(stalled.nominal, extended) {
                        error!(
                            "Motor blocked {} times, backing off again would reverse the move",
                            stalls
                        );
                        return Err(MotorFault::BackoffExhausted { stalls });
                    }
                    warn!("Motor blocked, backing off by {} degrees", backoff);
                    self.begin_segment(&mut stack, backoff);
                }
                Step::Reached => {
                    self.motor.stop();
                    let Some(done) = stack.pop() else { break };
                    if let Some(parent) = stack.last_mut() {
                        debug!("Back-off of {} degrees complete", done.degrees);
                        self.clock.delay_ms(self.tuning.stall_settle_ms);
                        parent.target = parent.target.wrapping_add(done.nominal);
                        parent.stagnant = 0;
                    }
                }
            }
        }

        self.motor.stop();
        let report = RotationReport { degrees, stalls };
        if report.stalled() {
            warn!(
                "Motor reached position. Motor rotated by {} degrees, but block happened",
                degrees
            );
        } else {
            info!("Motor reached position. Rotated by {} degrees", degrees);
        }
        Ok(report)
    }

    /// Dispense `portions` portions: one arm's worth of rotation each,
    /// with a pause after every portion.
    pub fn feed(&mut self, portions: u8, wheel_arms: u8) -> Result<(), MotorFault> {
        let degrees = 360 / i32::from(wheel_arms.max(1));
        for _ in 0..portions {
            self.rotate_by(degrees)?;
            self.clock.delay_ms(self.tuning.portion_pause_ms);
        }
        info!("Feed {} portions", portions);
        Ok(())
    }

    fn begin_segment(&mut self, stack: &mut heapless::Vec<Segment, MAX_SEGMENTS>, degrees: i32) {
        self.decoder.reset();
        let segment = Segment::new(degrees, &self.tuning, self.clock.micros());
        // Depth is checked against MAX_BACKOFF_DEPTH before every push.
        let _ = stack.push(segment);
    }

    /// One control iteration on the innermost segment.
    fn step(&mut self, stack: &mut heapless::Vec<Segment, MAX_SEGMENTS>) -> Step {
        let Some(seg) = stack.last_mut() else {
            return Step::Reached;
        };

        let now = self.clock.micros();
        let dt = now.saturating_sub(seg.last_us) as f32 / 1.0e6;
        seg.last_us = now;

        let error = self.decoder.position().wrapping_add(seg.target);
        if error == seg.last_error {
            seg.stagnant += 1;
        } else {
            seg.stagnant = 0;
        }
        if seg.stagnant >= self.tuning.stall_iterations {
            debug!(
                "Stall: error {} unchanged, integral {:.1}",
                seg.pid.prev_error(),
                seg.pid.integral()
            );
            seg.stagnant = 0;
            return Step::Stalled;
        }

        let u = seg.pid.compute(error as f32, dt);
        self.motor.drive(u as i32);
        seg.last_error = error;

        if u == 0.0 { Step::Reached } else { Step::Continue }
    }
}
