//! Schedule evaluation for a medicine on a calendar date.
//!
//! # Responsibility
//! - Decide whether a medicine is active on a date (inclusive start/end bounds).
//! - Return the dose times that apply on that date.
//!
//! # Invariants
//! - Pure: no storage access, no clock reads.
//! - Only an absent bound is unbounded. A stored bound that is not a valid
//!   `YYYY-MM-DD` date is compared as text against the ISO date, so it still
//!   restricts the window instead of being ignored.

use crate::clock::iso_date;
use crate::model::medicine::{parse_date_bound, Medicine};
use chrono::NaiveDate;
use std::cmp::Ordering;

/// Returns whether `medicine` is inside its start/end window on `date`.
pub fn is_active_on(medicine: &Medicine, date: NaiveDate) -> bool {
    if let Some(start) = medicine.start_date.as_deref() {
        if compare_bound(start, date) == Ordering::Greater {
            return false;
        }
    }
    if let Some(end) = medicine.end_date.as_deref() {
        if compare_bound(end, date) == Ordering::Less {
            return false;
        }
    }
    true
}

/// Dose times for `date` in schedule order; empty when inactive.
pub fn dose_times_on(medicine: &Medicine, date: NaiveDate) -> &[String] {
    if is_active_on(medicine, date) {
        &medicine.times
    } else {
        &[]
    }
}

/// Returns whether `time` is one of `medicine`'s slots on `date`.
pub fn is_scheduled(medicine: &Medicine, date: NaiveDate, time: &str) -> bool {
    dose_times_on(medicine, date).iter().any(|t| t == time)
}

/// Orders a stored bound against `date`.
fn compare_bound(bound: &str, date: NaiveDate) -> Ordering {
    match parse_date_bound(bound) {
        Some(bound_date) => bound_date.cmp(&date),
        None => bound.cmp(iso_date(date).as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::{dose_times_on, is_active_on, is_scheduled};
    use crate::model::medicine::{Medicine, MedicineDraft};
    use chrono::{NaiveDate, Utc};

    fn date(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
    }

    fn medicine(start: Option<&str>, end: Option<&str>) -> Medicine {
        let draft = MedicineDraft {
            name: "Amlodipine".to_string(),
            times: vec!["08:00".to_string(), "20:00".to_string()],
            ..MedicineDraft::default()
        };
        let mut med = Medicine::from_draft("u_1", draft, Utc::now()).unwrap();
        med.start_date = start.map(str::to_string);
        med.end_date = end.map(str::to_string);
        med
    }

    #[test]
    fn inclusive_window_bounds() {
        let med = medicine(Some("2024-06-10"), Some("2024-06-20"));

        assert!(dose_times_on(&med, date("2024-06-09")).is_empty());
        assert!(dose_times_on(&med, date("2024-06-21")).is_empty());
        for day in 10..=20 {
            let target = date(&format!("2024-06-{day}"));
            assert_eq!(dose_times_on(&med, target), ["08:00", "20:00"]);
        }
    }

    #[test]
    fn absent_bounds_are_unbounded() {
        let med = medicine(None, None);
        assert!(is_active_on(&med, date("1999-01-01")));
        assert!(is_active_on(&med, date("2999-12-31")));
    }

    #[test]
    fn malformed_bound_still_restricts_lexically() {
        // "2024-6-15" sorts after every "2024-MM-DD" as text.
        let med = medicine(Some("2024-6-15"), None);
        assert!(!is_active_on(&med, date("2024-06-30")));
        assert!(!is_active_on(&med, date("2024-12-31")));
        assert!(is_active_on(&med, date("2025-01-01")));
    }

    #[test]
    fn scheduled_time_must_be_in_list() {
        let med = medicine(None, None);
        assert!(is_scheduled(&med, date("2024-06-10"), "08:00"));
        assert!(!is_scheduled(&med, date("2024-06-10"), "09:00"));
    }
}
