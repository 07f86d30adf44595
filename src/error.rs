//! Unified error types for the PetFeeder firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! top-level loop's error handling uniform. All variants are `Copy` so they
//! can be passed through the service and logged without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Pin, PWM or interrupt registration failed at startup. Fatal.
    HardwareInit(HwInitError),
    /// The persisted feeding schedule could not be read or written.
    Schedule(ScheduleError),
    /// The motor stayed blocked past the stall-recovery bound.
    Motor(MotorFault),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HardwareInit(e) => write!(f, "hardware init: {e}"),
            Self::Schedule(e) => write!(f, "schedule: {e}"),
            Self::Motor(e) => write!(f, "motor: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Hardware initialisation errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    /// The GPIO peripheral could not be opened (permissions, wrong board).
    GpioUnavailable,
    /// A BCM pin could not be claimed.
    PinUnavailable(u8),
    /// A hardware PWM channel could not be configured; carries the BCM pin.
    PwmUnavailable(u8),
    /// Edge-interrupt registration failed on the given BCM pin.
    InterruptSetupFailed(u8),
}

impl fmt::Display for HwInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioUnavailable => write!(f, "GPIO peripheral unavailable"),
            Self::PinUnavailable(pin) => write!(f, "GPIO{pin} unavailable"),
            Self::PwmUnavailable(pin) => write!(f, "PWM on GPIO{pin} unavailable"),
            Self::InterruptSetupFailed(pin) => {
                write!(f, "unable to set up interrupt for GPIO{pin}")
            }
        }
    }
}

impl From<HwInitError> for Error {
    fn from(e: HwInitError) -> Self {
        Self::HardwareInit(e)
    }
}

// ---------------------------------------------------------------------------
// Schedule persistence errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleError {
    /// No schedule file exists yet (first boot).
    NotFound,
    /// The file exists but holds no header line.
    Empty,
    /// Any other I/O failure from the backing store.
    Io(std::io::ErrorKind),
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "schedule file not found"),
            Self::Empty => write!(f, "schedule file is empty"),
            Self::Io(kind) => write!(f, "I/O error ({kind})"),
        }
    }
}

impl From<std::io::Error> for ScheduleError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound,
            kind => Self::Io(kind),
        }
    }
}

impl From<ScheduleError> for Error {
    fn from(e: ScheduleError) -> Self {
        Self::Schedule(e)
    }
}

// ---------------------------------------------------------------------------
// Motor faults
// ---------------------------------------------------------------------------

/// Terminal outcome of a rotation that could not be completed.
///
/// A stall is first handled by backing off and retrying; these variants are
/// reported only once the configured bounds are exhausted. The motor is
/// stopped before either is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorFault {
    /// More stalls than `max_stall_retries` within one command.
    RetryLimit { stalls: u8 },
    /// A back-off would nest deeper than `max_backoff_depth`.
    BackoffDepth { depth: u8 },
    /// Another back-off would zero or reverse the stalled move; the wheel
    /// only turns the wrong way.
    BackoffExhausted { stalls: u8 },
}

impl fmt::Display for MotorFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RetryLimit { stalls } => {
                write!(f, "stall retry limit reached after {stalls} stalls")
            }
            Self::BackoffDepth { depth } => {
                write!(f, "back-off nesting exceeded depth {depth}")
            }
            Self::BackoffExhausted { stalls } => {
                write!(f, "blocked in the commanded direction after {stalls} stalls")
            }
        }
    }
}

impl From<MotorFault> for Error {
    fn from(e: MotorFault) -> Self {
        Self::Motor(e)
    }
}
