//! PID controller for wheel positioning
//!
//! Works on a caller-supplied error term rather than a stored setpoint:
//! the motor loop defines its own error as `position + target` and simply
//! feeds it in each iteration. Output is unclamped; the H-bridge driver
//! saturates it to the duty range.

/// PID gains.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidGains {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
}

/// PID controller
#[derive(Debug, Clone)]
pub struct PidController {
    gains: PidGains,
    integral: f32,
    prev_error: f32,
}

impl PidController {
    pub fn new(gains: PidGains) -> Self {
        Self {
            gains,
            integral: 0.0,
            prev_error: 0.0,
        }
    }

    /// Compute the control output for `error` after `dt` seconds.
    pub fn compute(&mut self, error: f32, dt: f32) -> f32 {
        // Proportional
        let p = self.gains.kp * error;

        // Integral
        self.integral += error * dt;
        let i = self.gains.ki * self.integral;

        // Derivative
        let derivative = if dt > 0.0 {
            (error - self.prev_error) / dt
        } else {
            0.0
        };
        let d = self.gains.kd * derivative;

        self.prev_error = error;

        p + i + d
    }

    /// Error passed to the previous `compute` call.
    pub fn prev_error(&self) -> f32 {
        self.prev_error
    }

    pub fn integral(&self) -> f32 {
        self.integral
    }
}
