//! Time-of-day feeding scheduler.
//!
//! Holds up to [`MAX_FEEDING_TIMES`] daily feeding times, sorted by time,
//! and fires each one once when the wall clock reaches it. The scheduler
//! notifies a [`FeedDelegate`] instead of driving the motor itself; the
//! service implements the delegate on top of the motor controller.
//!
//! ```text
//!   WallClock ──▶ handle_feeding() ──▶ FeedDelegate::feed(portions)
//!                       │
//!   UI mutators ────────┴──▶ SchedulePort::save()  (every mutation)
//! ```
//!
//! Every mutation is persisted immediately through the [`SchedulePort`].
//! Persistence failures are logged and never roll back the in-memory state.

use log::{error, info, warn};

use crate::app::ports::{FeedDelegate, SchedulePort};
use crate::error::ScheduleError;

// ═══════════════════════════════════════════════════════════════
//  Schedule types
// ═══════════════════════════════════════════════════════════════

/// Maximum number of feeding times per day.
pub const MAX_FEEDING_TIMES: usize = 10;

/// Wheel arm count used when nothing valid was loaded.
pub const DEFAULT_WHEEL_ARMS: u8 = 4;

/// Returned by [`FeedingScheduler::minutes_to_next_feeding`] for an empty schedule.
pub const NO_FEEDING: u16 = u16::MAX;

pub const MAX_PORTIONS: u8 = 10;

/// Hour and minute of the local wall clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay {
    pub hour: u8,
    pub minute: u8,
}

impl TimeOfDay {
    /// `None` unless `hour < 24` and `minute < 60`.
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(Self { hour, minute })
    }
}

impl core::fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// One daily feeding time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedingEntry {
    pub hour: u8,
    pub minute: u8,
    pub portions: u8,
    /// Set when the entry fires; cleared again shortly before it is due
    /// the next day. Never persisted.
    pub done: bool,
}

impl FeedingEntry {
    pub fn new(hour: u8, minute: u8, portions: u8) -> Self {
        Self {
            hour,
            minute,
            portions,
            done: false,
        }
    }

    pub fn time(&self) -> TimeOfDay {
        TimeOfDay {
            hour: self.hour,
            minute: self.minute,
        }
    }

    /// Strictly later in the day than `t`.
    fn is_after(&self, t: TimeOfDay) -> bool {
        self.time() > t
    }
}

/// The full schedule: sorted feeding times plus the wheel geometry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedingSchedule {
    entries: heapless::Vec<FeedingEntry, MAX_FEEDING_TIMES>,
    wheel_arms: u8,
}

impl Default for FeedingSchedule {
    fn default() -> Self {
        Self::new(DEFAULT_WHEEL_ARMS)
    }
}

impl FeedingSchedule {
    pub fn new(wheel_arms: u8) -> Self {
        Self {
            entries: heapless::Vec::new(),
            wheel_arms,
        }
    }

    /// Active entries, ascending by time.
    pub fn entries(&self) -> &[FeedingEntry] {
        &self.entries
    }

    pub fn wheel_arms(&self) -> u8 {
        self.wheel_arms
    }

    pub fn set_wheel_arms(&mut self, arms: u8) {
        self.wheel_arms = arms;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.is_full()
    }

    pub fn get(&self, index: usize) -> Option<&FeedingEntry> {
        self.entries.get(index)
    }

    pub fn contains_time(&self, hour: u8, minute: u8) -> bool {
        self.entries
            .iter()
            .any(|e| e.hour == hour && e.minute == minute)
    }

    /// Insert before the first entry strictly later than `entry`, or at the
    /// end. Returns the index used, or the entry back if the schedule is full.
    pub fn insert_sorted(&mut self, entry: FeedingEntry) -> Result<usize, FeedingEntry> {
        if self.entries.is_full() {
            return Err(entry);
        }
        let index = self
            .entries
            .iter()
            .position(|e| e.is_after(entry.time()))
            .unwrap_or(self.entries.len());
        self.entries.insert(index, entry)?;
        Ok(index)
    }

    /// Remove and shift the tail left. `None` if `index` is out of range.
    pub fn remove(&mut self, index: usize) -> Option<FeedingEntry> {
        (index < self.entries.len()).then(|| self.entries.remove(index))
    }

    fn get_mut(&mut self, index: usize) -> Option<&mut FeedingEntry> {
        self.entries.get_mut(index)
    }
}

/// A schedule as read back from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSchedule {
    pub schedule: FeedingSchedule,
    /// Entry lines read after the header, malformed ones included.
    pub lines_consumed: usize,
}

/// Result of [`FeedingScheduler::add_feeding_time`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// Inserted at this index and persisted.
    Added(usize),
    /// Already [`MAX_FEEDING_TIMES`] entries; nothing changed.
    Full,
    /// Hour, minute or portions out of range; nothing changed.
    OutOfRange,
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler
// ═══════════════════════════════════════════════════════════════

pub struct FeedingScheduler<S> {
    schedule: FeedingSchedule,
    store: S,
    default_arms: u8,
}

impl<S: SchedulePort> FeedingScheduler<S> {
    /// Empty schedule with `default_arms`; call [`load`](Self::load) to
    /// pick up the persisted one.
    pub fn new(store: S, default_arms: u8) -> Self {
        Self {
            schedule: FeedingSchedule::new(default_arms),
            store,
            default_arms,
        }
    }

    /// Replace the in-memory schedule with the stored one.
    ///
    /// On failure the schedule is left empty with the default arm count and
    /// the error is returned for the caller to report; the feeder keeps
    /// running either way. Returns the number of entries loaded.
    pub fn load(&mut self) -> Result<usize, ScheduleError> {
        match self.store.load() {
            Ok(stored) => {
                self.schedule = stored.schedule;
                info!(
                    "Loaded feeding schedule with {} active feedings times from {} lines. \
                     Feeding wheel configured with {} arms",
                    self.schedule.len(),
                    stored.lines_consumed,
                    self.schedule.wheel_arms()
                );
                Ok(self.schedule.len())
            }
            Err(e) => {
                self.schedule = FeedingSchedule::new(self.default_arms);
                error!("Error during feeding schedule loading: {}", e);
                Err(e)
            }
        }
    }

    fn persist(&mut self) {
        match self.store.save(&self.schedule) {
            Ok(()) => info!(
                "Saved feeding schedule with {} active feedings times. \
                 Feeding wheel configured with {} arms",
                self.schedule.len(),
                self.schedule.wheel_arms()
            ),
            Err(e) => error!("Error during feeding schedule saving: {}", e),
        }
    }

    // ── Mutators ─────────────────────────────────────────────────

    /// Insert a feeding time in sort order and persist.
    ///
    /// Does not reject duplicates; callers check
    /// [`is_feeding_time_duplicate`](Self::is_feeding_time_duplicate) first.
    pub fn add_feeding_time(&mut self, hour: u8, minute: u8, portions: u8) -> AddOutcome {
        if TimeOfDay::new(hour, minute).is_none() || !(1..=MAX_PORTIONS).contains(&portions) {
            warn!(
                "Rejected feeding time {}:{} with {} portions: out of range",
                hour, minute, portions
            );
            return AddOutcome::OutOfRange;
        }
        match self
            .schedule
            .insert_sorted(FeedingEntry::new(hour, minute, portions))
        {
            Ok(index) => {
                info!("Added feeding time with index: {}", index);
                self.persist();
                AddOutcome::Added(index)
            }
            Err(_) => {
                warn!(
                    "Feeding schedule full ({} times), {}:{} not added",
                    MAX_FEEDING_TIMES, hour, minute
                );
                AddOutcome::Full
            }
        }
    }

    /// Remove the entry at `index` and persist.
    pub fn remove_feeding_time(&mut self, index: usize) -> Option<FeedingEntry> {
        let Some(removed) = self.schedule.remove(index) else {
            warn!(
                "Remove ignored: no feeding time at index {} ({} active)",
                index,
                self.schedule.len()
            );
            return None;
        };
        info!("Removed feeding time with index: {}", index);
        self.persist();
        Some(removed)
    }

    /// Move the entry at `index` to `hour:minute`, keeping its portions.
    ///
    /// Implemented as remove + add, so the entry may land at a different
    /// index; the new one is returned.
    pub fn save_modified_feeding_time(&mut self, index: usize, hour: u8, minute: u8) -> Option<usize> {
        if TimeOfDay::new(hour, minute).is_none() {
            warn!("Modify ignored: {}:{} is not a valid time", hour, minute);
            return None;
        }
        let portions = self.schedule.get(index)?.portions;
        self.remove_feeding_time(index)?;
        let AddOutcome::Added(new_index) = self.add_feeding_time(hour, minute, portions) else {
            return None;
        };
        info!(
            "Feeding time index {} modified. New time {}:{}",
            index, hour, minute
        );
        Some(new_index)
    }

    /// Set the portions of the entry at `index` and persist.
    pub fn set_portions(&mut self, index: usize, portions: u8) -> bool {
        if !(1..=MAX_PORTIONS).contains(&portions) {
            warn!("Rejected portions {}: must be 1..={}", portions, MAX_PORTIONS);
            return false;
        }
        let Some(entry) = self.schedule.get_mut(index) else {
            warn!("Set portions ignored: no feeding time at index {}", index);
            return false;
        };
        entry.portions = portions;
        info!(
            "Set portions for feeding time index {} to {}",
            index, portions
        );
        self.persist();
        true
    }

    /// Set the feeding wheel's arm count and persist.
    pub fn set_wheel_arms(&mut self, arms: u8) -> bool {
        if arms < 2 {
            warn!("Rejected feeding wheel arms {}: need at least 2", arms);
            return false;
        }
        self.schedule.set_wheel_arms(arms);
        info!("Set feeding wheel arms to {}", arms);
        self.persist();
        true
    }

    // ── Queries ─────────────────────────────────────────────────

    pub fn is_feeding_time_duplicate(&self, hour: u8, minute: u8) -> bool {
        self.schedule.contains_time(hour, minute)
    }

    /// Minutes from `now` until the next feeding, wrapping to the first
    /// entry tomorrow. [`NO_FEEDING`] if the schedule is empty.
    pub fn minutes_to_next_feeding(&self, now: TimeOfDay) -> u16 {
        let entries = self.schedule.entries();
        let Some(first) = entries.first() else {
            return NO_FEEDING;
        };

        let (mut hours, mut minutes) = match entries.iter().find(|e| e.is_after(now)) {
            Some(next) => (
                i16::from(next.hour) - i16::from(now.hour),
                i16::from(next.minute) - i16::from(now.minute),
            ),
            None => (
                24 - i16::from(now.hour) + i16::from(first.hour),
                i16::from(first.minute) - i16::from(now.minute),
            ),
        };

        if minutes < 0 {
            minutes += 60;
            hours -= 1;
        }
        if hours < 0 {
            hours += 24;
        }
        (hours * 60 + minutes) as u16
    }

    /// Call once per tick. Fires at most one due entry through `delegate`,
    /// then re-arms a fired entry whose time is one minute ahead of `now`
    /// within the same hour. Returns whether a feeding happened.
    pub fn handle_feeding<D: FeedDelegate + ?Sized>(&mut self, now: TimeOfDay, delegate: &mut D) -> bool {
        let mut fed = false;

        if let Some(entry) = self
            .schedule
            .entries
            .iter_mut()
            .find(|e| e.time() == now && !e.done)
        {
            info!("Feeding time {} reached, {} portions", now, entry.portions);
            delegate.feed(entry.portions);
            entry.done = true;
            fed = true;
        }

        let rearm_minute = u16::from(now.minute) + 1;
        if let Some(entry) = self
            .schedule
            .entries
            .iter_mut()
            .find(|e| e.done && e.hour == now.hour && u16::from(e.minute) == rearm_minute)
        {
            entry.done = false;
        }

        fed
    }

    // ── Accessors for the menu ──────────────────────────────────

    pub fn hour(&self, index: usize) -> Option<u8> {
        self.schedule.get(index).map(|e| e.hour)
    }

    pub fn minute(&self, index: usize) -> Option<u8> {
        self.schedule.get(index).map(|e| e.minute)
    }

    pub fn portions(&self, index: usize) -> Option<u8> {
        self.schedule.get(index).map(|e| e.portions)
    }

    pub fn active_count(&self) -> usize {
        self.schedule.len()
    }

    pub fn wheel_arms(&self) -> u8 {
        self.schedule.wheel_arms()
    }

    pub fn schedule(&self) -> &FeedingSchedule {
        &self.schedule
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
