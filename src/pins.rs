//! GPIO / peripheral pin assignments for the feeder board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers. BCM numbering throughout.

// ---------------------------------------------------------------------------
// User buttons (active-low with internal pull-up)
// ---------------------------------------------------------------------------

pub const BUTTON_UP_GPIO: u8 = 5;
pub const BUTTON_DOWN_GPIO: u8 = 6;
pub const BUTTON_LEFT_GPIO: u8 = 19;
pub const BUTTON_RIGHT_GPIO: u8 = 26;
/// Manual feed: dispenses one portion.
pub const BUTTON_FEED_GPIO: u8 = 16;

// ---------------------------------------------------------------------------
// DC gear motor + quadrature encoder
// ---------------------------------------------------------------------------

/// Encoder channel A, both edges.
pub const ENCODER_A_GPIO: u8 = 23;
/// Encoder channel B, both edges.
pub const ENCODER_B_GPIO: u8 = 24;

/// H-bridge input 1, hardware PWM0 on the Pi header.
pub const MOTOR_IN1_GPIO: u8 = 12;
/// H-bridge input 2, hardware PWM1 on the Pi header.
pub const MOTOR_IN2_GPIO: u8 = 13;

/// Hardware PWM carrier frequency for the H-bridge.
pub const MOTOR_PWM_FREQ_HZ: f64 = 20_000.0;

