//! Log-based stand-in for the menu display.
//!
//! Implements [`UiPort`] by writing navigation presses and the countdown
//! to the next feeding to the log. A display-driving adapter would
//! implement the same trait.

use log::{debug, info};

use crate::app::ports::{SchedulePort, UiPort};
use crate::drivers::button::ButtonEvent;
use crate::scheduler::{FeedingScheduler, NO_FEEDING};

/// Reports the next feeding whenever the minute count changes.
#[derive(Debug, Default)]
pub struct LogStatusUi {
    last_minutes: Option<u16>,
}

impl LogStatusUi {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UiPort for LogStatusUi {
    fn on_button<S: SchedulePort>(&mut self, event: ButtonEvent, scheduler: &mut FeedingScheduler<S>) {
        debug!(
            "Button {:?} ({} feeding times, {} arms)",
            event,
            scheduler.active_count(),
            scheduler.wheel_arms()
        );
    }

    fn refresh<S: SchedulePort>(&mut self, scheduler: &FeedingScheduler<S>, minutes_to_next: u16) {
        if self.last_minutes == Some(minutes_to_next) {
            return;
        }
        self.last_minutes = Some(minutes_to_next);
        if minutes_to_next == NO_FEEDING {
            info!("No feeding times scheduled");
        } else {
            info!(
                "Next feeding in {}h {:02}m ({} of {} times active)",
                minutes_to_next / 60,
                minutes_to_next % 60,
                scheduler.active_count(),
                crate::scheduler::MAX_FEEDING_TIMES
            );
        }
    }
}
