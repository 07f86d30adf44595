//! DC gear motor driver (two-input H-bridge).
//!
//! Signed speed control via two PWM inputs: positive duty drives IN2 with
//! IN1 held low, negative duty drives IN1 with IN2 held low, zero releases
//! both (coast).
//!
//! ## Dual-target design
//!
//! Generic over `embedded_hal::pwm::SetDutyCycle`, so the same driver runs
//! on the Pi's hardware PWM channels and on in-memory channels in tests.

use embedded_hal::pwm::{Error as _, SetDutyCycle};
use log::{debug, warn};

use crate::app::ports::MotorPort;

/// Duty units at 100 %. The controller's output range is ±this.
pub const DUTY_FULL_SCALE: i32 = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorState {
    Stopped,
    Running { duty: i32 },
}

pub struct HBridge<A, B> {
    in1: A,
    in2: B,
    state: MotorState,
}

impl<A: SetDutyCycle, B: SetDutyCycle> HBridge<A, B> {
    pub fn new(in1: A, in2: B) -> Self {
        let mut bridge = Self {
            in1,
            in2,
            state: MotorState::Running { duty: 0 },
        };
        bridge.drive(0);
        bridge
    }

    fn write(&mut self, in1: u16, in2: u16) {
        let full = DUTY_FULL_SCALE as u16;
        if let Err(e) = self.in1.set_duty_cycle_fraction(in1, full) {
            warn!("H-bridge IN1 duty write failed: {:?}", e.kind());
        }
        if let Err(e) = self.in2.set_duty_cycle_fraction(in2, full) {
            warn!("H-bridge IN2 duty write failed: {:?}", e.kind());
        }
    }
}

impl<A: SetDutyCycle, B: SetDutyCycle> MotorPort for HBridge<A, B> {
    fn drive(&mut self, duty: i32) {
        let duty = duty.clamp(-DUTY_FULL_SCALE, DUTY_FULL_SCALE);
        match duty {
            d if d > 0 => self.write(0, d as u16),
            d if d < 0 => self.write((-d) as u16, 0),
            _ => self.write(0, 0),
        }
        let next = if duty == 0 {
            MotorState::Stopped
        } else {
            MotorState::Running { duty }
        };
        match (self.state, next) {
            (MotorState::Running { .. }, MotorState::Stopped) => debug!("H-bridge released"),
            (MotorState::Stopped, MotorState::Running { duty }) => debug!("H-bridge driving at {}", duty),
            _ => {}
        }
        self.state = next;
    }
}
