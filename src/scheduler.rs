//! Wall-clock feeding scheduler.
//!
//! Polled every control tick with the current local wall clock.  Each
//! [`ScheduleEntry`] fires at most once per calendar day, when the clock
//! reads its `(hour, minute)`.
//!
//! ```text
//!   ClockPort::wall_clock() ──▶ Scheduler::tick ──▶ Option<ScheduleFireRequest>
//!                                    │                        │
//!                      (same reading → skip)                  ▼
//!                      (already fired today → skip)   RunController::
//!                                                     request_scheduled_start
//! ```
//!
//! Two layers stop an entry from firing twice:
//!
//! - The scheduler only evaluates entries when the wall-clock reading
//!   (day, hour, minute) differs from the previous call, so repeated polls
//!   inside one minute are cheap.  Any table change forgets that reading.
//! - Each entry remembers the day-of-year it last fired.  This is the real
//!   guarantee: it also covers a clock that steps backwards into an
//!   already-served minute.
//!
//! Without a wall clock (not yet synced) the tick is a no-op and nothing is
//! mutated; scheduling resumes once time is available.

use heapless::Vec;
use log::{info, warn};

use crate::config::{MAX_SCHEDULES, ScheduleSlot, validate_slot};
use crate::error::{Error, Result};

// ═══════════════════════════════════════════════════════════════
//  Schedule types
// ═══════════════════════════════════════════════════════════════

/// Local wall-clock reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallClock {
    /// 0–23
    pub hour: u8,
    /// 0–59
    pub minute: u8,
    /// 0-based day of the year (0–365)
    pub day_of_year: u16,
}

/// A configured daily feeding time plus its fire guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleEntry {
    pub hour: u8,
    pub minute: u8,
    pub steps_required: u32,
    /// Day-of-year this entry last fired, `None` if never.
    pub last_triggered_day: Option<u16>,
}

impl From<ScheduleSlot> for ScheduleEntry {
    fn from(slot: ScheduleSlot) -> Self {
        Self {
            hour: slot.hour,
            minute: slot.minute,
            steps_required: slot.steps,
            last_triggered_day: None,
        }
    }
}

impl ScheduleEntry {
    fn matches(&self, now: WallClock) -> bool {
        self.hour == now.hour && self.minute == now.minute
    }
}

/// Request to start a scheduled run for slot `index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleFireRequest {
    pub index: usize,
    pub steps_required: u32,
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

pub struct Scheduler {
    entries: Vec<ScheduleEntry, MAX_SCHEDULES>,
    /// Reading observed on the previous evaluated tick.
    last_seen: Option<WallClock>,
    /// Global enable flag.
    enabled: bool,
}

impl Scheduler {
    pub fn new(slots: &[ScheduleSlot]) -> Self {
        let mut sched = Self {
            entries: Vec::new(),
            last_seen: None,
            enabled: true,
        };
        sched.load(slots);
        sched
    }

    /// Replace the whole table.  Fire guards are reset.
    pub fn load(&mut self, slots: &[ScheduleSlot]) {
        self.entries = slots
            .iter()
            .take(MAX_SCHEDULES)
            .map(|&s| ScheduleEntry::from(s))
            .collect();
        self.last_seen = None;
        info!("Scheduler: loaded {} entries", self.entries.len());
    }

    /// Re-time one slot.  Its fire guard is cleared so the new time can
    /// fire today.
    pub fn set_entry(&mut self, index: usize, slot: ScheduleSlot) -> Result<()> {
        validate_slot(&slot)?;
        let entry = self
            .entries
            .get_mut(index)
            .ok_or(Error::InvalidScheduleIndex(index))?;
        *entry = ScheduleEntry::from(slot);
        self.last_seen = None;
        info!(
            "Scheduler: slot {} set to {:02}:{:02} ({} steps)",
            index, slot.hour, slot.minute, slot.steps
        );
        Ok(())
    }

    /// Enable or disable the entire scheduler.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Evaluate the table against the current wall clock.
    ///
    /// Every entry matching the current minute that has not fired today
    /// is marked fired.  The first of them is returned; any others due in
    /// the same minute are dropped, as the controller could not run them
    /// concurrently anyway.
    pub fn tick(&mut self, now: Option<WallClock>) -> Option<ScheduleFireRequest> {
        let now = now?;
        if !self.enabled || self.last_seen == Some(now) {
            return None;
        }
        self.last_seen = Some(now);

        let mut request = None;
        for (index, entry) in self.entries.iter_mut().enumerate() {
            if !entry.matches(now) || entry.last_triggered_day == Some(now.day_of_year) {
                continue;
            }
            entry.last_triggered_day = Some(now.day_of_year);

            if request.is_none() {
                info!(
                    "Scheduler: slot {} fired at {:02}:{:02} (day {})",
                    index, now.hour, now.minute, now.day_of_year
                );
                request = Some(ScheduleFireRequest {
                    index,
                    steps_required: entry.steps_required,
                });
            } else {
                warn!(
                    "Scheduler: slot {} shares {:02}:{:02} with an earlier slot, skipped",
                    index, now.hour, now.minute
                );
            }
        }
        request
    }

    /// Look up a slot, for runs started on demand.
    pub fn entry(&self, index: usize) -> Result<&ScheduleEntry> {
        self.entries
            .get(index)
            .ok_or(Error::InvalidScheduleIndex(index))
    }

    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
