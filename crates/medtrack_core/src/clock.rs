//! Fixed-offset wall clock and calendar helpers.
//!
//! # Responsibility
//! - Produce "now" at the fixed household offset (UTC+05:30), never the host timezone.
//! - Derive calendar dates and `HH:MM` time-of-day strings from that instant.
//!
//! # Invariants
//! - Day boundaries are computed in the fixed offset, so a dose slot's `date` never
//!   depends on where the process runs.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Timelike, Utc};
use once_cell::sync::Lazy;
use std::cell::Cell;

/// Offset of household local time from UTC.
pub const LOCAL_UTC_OFFSET_MINUTES: i32 = 330;

static LOCAL_OFFSET: Lazy<FixedOffset> = Lazy::new(|| {
    FixedOffset::east_opt(LOCAL_UTC_OFFSET_MINUTES * 60).expect("offset within +-24h")
});

/// Returns the fixed household offset.
pub fn local_offset() -> FixedOffset {
    *LOCAL_OFFSET
}

/// Source of the current instant.
pub trait Clock {
    /// Current instant expressed in the fixed household offset.
    fn now(&self) -> DateTime<FixedOffset>;

    /// Current household calendar date.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Host system clock projected to the household offset.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&local_offset())
    }
}

/// Clock pinned to an explicit instant; can be advanced manually.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Cell<DateTime<FixedOffset>>,
}

impl FixedClock {
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self {
            now: Cell::new(now.with_timezone(&local_offset())),
        }
    }

    /// Builds a clock from household-local wall time parts.
    ///
    /// Returns `None` when the parts do not form a valid date/time.
    pub fn at_local(date: NaiveDate, hour: u32, minute: u32, second: u32) -> Option<Self> {
        let naive = date.and_hms_opt(hour, minute, second)?;
        let local = naive.and_local_timezone(local_offset()).single()?;
        Some(Self::new(local))
    }

    pub fn set(&self, now: DateTime<FixedOffset>) {
        self.now.set(now.with_timezone(&local_offset()));
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<FixedOffset> {
        (**self).now()
    }
}

/// Formats the wall-clock minute as `HH:MM`.
pub fn hhmm(instant: &DateTime<FixedOffset>) -> String {
    format!("{:02}:{:02}", instant.hour(), instant.minute())
}

/// Formats a calendar date as `YYYY-MM-DD`.
pub fn iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Suggests a dose time for a new schedule entry.
///
/// Rounds the minute up to the next multiple of five; `:56`..`:59` roll into the
/// next hour, and `23:5x` wraps to `00:00`.
pub fn suggest_dose_time(instant: &DateTime<FixedOffset>) -> String {
    let minute = instant.minute();
    let rounded = minute.div_ceil(5) * 5;
    let (hour, minute) = if rounded >= 60 {
        ((instant.hour() + 1) % 24, rounded - 60)
    } else {
        (instant.hour(), rounded)
    };
    format!("{hour:02}:{minute:02}")
}
