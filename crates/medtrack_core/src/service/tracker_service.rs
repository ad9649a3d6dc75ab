//! Adherence summary for one member.

use crate::clock::Clock;
use crate::repo::collections::CollectionStore;
use crate::repo::kv_repo::KeyValueRepository;
use crate::schedule::dose_times_on;
use crate::service::error::{ServiceError, ServiceResult};
use chrono::{Days, NaiveDate};

/// Length of the trailing daily series.
pub const TRACKER_WINDOW_DAYS: u64 = 7;

/// Adherence of one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayAdherence {
    pub date: NaiveDate,
    pub scheduled: usize,
    pub taken: usize,
    /// Rounded `taken / scheduled` in percent; 0 when nothing was scheduled.
    pub percent: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerSummary {
    /// Every taken event recorded for the member.
    pub taken_total: usize,
    /// Sum of daily dose counts over the member's medicines.
    pub daily_doses_total: usize,
    /// Oldest first, ending today. Empty when the member has no medicines.
    pub days: Vec<DayAdherence>,
}

pub struct TrackerService<R: KeyValueRepository, C: Clock> {
    store: CollectionStore<R>,
    clock: C,
}

impl<R: KeyValueRepository, C: Clock> TrackerService<R, C> {
    pub fn new(repo: R, clock: C) -> Self {
        Self {
            store: CollectionStore::new(repo),
            clock,
        }
    }

    /// Running totals and the trailing seven-day series for `member_id`.
    ///
    /// Events of medicines deleted since still count toward taken numbers.
    pub fn summary(&self, member_id: &str) -> ServiceResult<TrackerSummary> {
        let snapshot = self.store.load_snapshot()?;
        if snapshot.member(member_id).is_none() {
            return Err(ServiceError::MemberNotFound(member_id.to_string()));
        }

        let medicines: Vec<_> = snapshot
            .medicines
            .iter()
            .filter(|medicine| medicine.family_member_id == member_id)
            .collect();
        let taken_events: Vec<_> = snapshot
            .adherence
            .iter()
            .filter(|event| event.family_member_id == member_id && event.taken)
            .collect();

        let taken_total = taken_events.len();
        let daily_doses_total = medicines.iter().map(|medicine| medicine.times.len()).sum();
        if medicines.is_empty() {
            return Ok(TrackerSummary {
                taken_total,
                daily_doses_total,
                days: Vec::new(),
            });
        }

        let today = self.clock.today();
        let days = (0..TRACKER_WINDOW_DAYS)
            .rev()
            .filter_map(|back| today.checked_sub_days(Days::new(back)))
            .map(|date| {
                let scheduled = medicines
                    .iter()
                    .map(|medicine| dose_times_on(medicine, date).len())
                    .sum();
                let taken = taken_events.iter().filter(|event| event.date == date).count();
                DayAdherence {
                    date,
                    scheduled,
                    taken,
                    percent: percent(taken, scheduled),
                }
            })
            .collect();

        Ok(TrackerSummary {
            taken_total,
            daily_doses_total,
            days,
        })
    }
}

/// `round(taken * 100 / scheduled)` with halves rounded up.
fn percent(taken: usize, scheduled: usize) -> u32 {
    if scheduled == 0 {
        return 0;
    }
    let value = (taken * 200 + scheduled) / (scheduled * 2);
    u32::try_from(value).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::percent;

    #[test]
    fn percent_rounds_half_up() {
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(1, 8), 13);
        assert_eq!(percent(3, 3), 100);
    }

    #[test]
    fn percent_is_zero_without_schedule() {
        assert_eq!(percent(2, 0), 0);
    }
}
