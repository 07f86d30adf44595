//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (the menu, a
//! maintenance shell, tests) that the
//! [`FeederService`](super::service::FeederService) interprets and acts upon.

use crate::error::MotorFault;
use crate::scheduler::AddOutcome;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// Dispense now, outside the schedule.
    FeedNow { portions: u8 },

    /// Add a feeding time unless one already exists at that minute.
    AddFeeding { hour: u8, minute: u8, portions: u8 },

    /// Delete the feeding time at `index`.
    RemoveFeeding { index: usize },

    /// Move the feeding time at `index` to a new time, keeping its portions.
    ModifyFeeding { index: usize, hour: u8, minute: u8 },

    /// Change the portions of the feeding time at `index`.
    SetPortions { index: usize, portions: u8 },

    /// Change the feeding wheel's arm count.
    SetWheelArms { arms: u8 },
}

/// What a command did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Applied; carries the affected schedule index where there is one.
    Done(Option<usize>),
    /// The feeding time already exists.
    Duplicate,
    /// Rejected by the scheduler (full, out of range, or no such index).
    Rejected,
    /// The motor could not complete the feed.
    Fault(MotorFault),
}

impl From<AddOutcome> for CommandOutcome {
    fn from(outcome: AddOutcome) -> Self {
        match outcome {
            AddOutcome::Added(index) => Self::Done(Some(index)),
            AddOutcome::Full | AddOutcome::OutOfRange => Self::Rejected,
        }
    }
}
