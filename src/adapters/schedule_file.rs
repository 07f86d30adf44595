//! Text-file schedule store.
//!
//! Implements [`SchedulePort`] on a small line-oriented file:
//!
//! ```text
//! arms: 4
//! 8:0 - 2
//! 18:30 - 1
//! ```
//!
//! The header carries the wheel arm count; each following line is one
//! feeding time as `hour:minute - portions`, unpadded, ascending. Done
//! flags are not stored.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::app::ports::SchedulePort;
use crate::error::ScheduleError;
use crate::scheduler::{
    DEFAULT_WHEEL_ARMS, FeedingEntry, FeedingSchedule, MAX_FEEDING_TIMES, MAX_PORTIONS,
    StoredSchedule, TimeOfDay,
};

pub struct FileScheduleStore {
    path: PathBuf,
}

impl FileScheduleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SchedulePort for FileScheduleStore {
    fn load(&self) -> Result<StoredSchedule, ScheduleError> {
        let text = std::fs::read_to_string(&self.path)?;
        decode(&text)
    }

    fn save(&mut self, schedule: &FeedingSchedule) -> Result<(), ScheduleError> {
        std::fs::write(&self.path, encode(schedule))?;
        Ok(())
    }
}

/// Render `schedule` in the file format.
pub fn encode(schedule: &FeedingSchedule) -> String {
    let mut out = String::with_capacity(16 + schedule.len() * 12);
    // Writing into a String cannot fail.
    let _ = writeln!(out, "arms: {}", schedule.wheel_arms());
    for e in schedule.entries() {
        let _ = writeln!(out, "{}:{} - {}", e.hour, e.minute, e.portions);
    }
    out
}

/// Parse the file format.
///
/// A missing header is [`ScheduleError::Empty`]. An unreadable or
/// out-of-range arm count falls back to [`DEFAULT_WHEEL_ARMS`]. Entry lines
/// that do not parse, are out of range, or repeat an earlier time are
/// skipped but still counted in `lines_consumed`. Reading stops once
/// [`MAX_FEEDING_TIMES`] entries are held.
pub fn decode(text: &str) -> Result<StoredSchedule, ScheduleError> {
    let mut lines = text.lines();
    let header = lines.next().ok_or(ScheduleError::Empty)?;

    let arms = match parse_arms(header) {
        Some(arms) => arms,
        None => {
            warn!(
                "Schedule header {:?} has no valid arm count, using {}",
                header, DEFAULT_WHEEL_ARMS
            );
            DEFAULT_WHEEL_ARMS
        }
    };

    let mut schedule = FeedingSchedule::new(arms);
    let mut lines_consumed = 0;
    for line in lines {
        if schedule.len() >= MAX_FEEDING_TIMES {
            break;
        }
        lines_consumed += 1;
        match parse_entry(line) {
            Some(entry) if !schedule.contains_time(entry.hour, entry.minute) => {
                // Capacity was checked at the top of the loop.
                let _ = schedule.insert_sorted(entry);
            }
            Some(entry) => debug!("Skipping duplicate schedule line {}:{}", entry.hour, entry.minute),
            None => debug!("Skipping malformed schedule line {:?}", line),
        }
    }

    Ok(StoredSchedule {
        schedule,
        lines_consumed,
    })
}

fn parse_arms(line: &str) -> Option<u8> {
    let arms: u8 = line.trim().strip_prefix("arms:")?.trim().parse().ok()?;
    (arms >= 2).then_some(arms)
}

fn parse_entry(line: &str) -> Option<FeedingEntry> {
    let (time, portions) = line.split_once('-')?;
    let (hour, minute) = time.split_once(':')?;
    let hour: u8 = hour.trim().parse().ok()?;
    let minute: u8 = minute.trim().parse().ok()?;
    let portions: u8 = portions.trim().parse().ok()?;

    TimeOfDay::new(hour, minute)?;
    if !(1..=MAX_PORTIONS).contains(&portions) {
        return None;
    }
    Some(FeedingEntry::new(hour, minute, portions))
}
