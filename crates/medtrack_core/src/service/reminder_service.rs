//! Dose reminder polling.
//!
//! # Responsibility
//! - On each tick, fire one reminder per active medicine whose dose time equals
//!   the current local `HH:MM`.
//! - Debounce repeated firings per `medicineId#HH:MM` through the notification ledger.
//!
//! # Invariants
//! - A key fires again only when its last firing is more than
//!   `REMINDER_DEBOUNCE_SECS` in the past.
//! - Minutes that fall between two ticks are missed; there is no catch-up.
//! - A failed tick is logged and the loop keeps going.

use crate::clock::{hhmm, Clock};
use crate::model::notification::{reminder_key, upsert_record};
use crate::notify::{deliver, Delivery, NotificationSink};
use crate::repo::collections::CollectionStore;
use crate::repo::kv_repo::KeyValueRepository;
use crate::schedule::is_scheduled;
use crate::service::error::ServiceResult;
use chrono::{Duration as ChronoDuration, Utc};
use log::{error, info};
use std::time::Duration;

/// Minimum gap between two firings of the same key.
pub const REMINDER_DEBOUNCE_SECS: i64 = 60;

/// One reminder fired by a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiredReminder {
    pub medicine_id: String,
    pub scheduled_time: String,
    pub title: String,
    pub body: String,
    pub delivery: Delivery,
}

pub struct ReminderService<R: KeyValueRepository, C: Clock> {
    store: CollectionStore<R>,
    clock: C,
}

impl<R: KeyValueRepository, C: Clock> ReminderService<R, C> {
    pub fn new(repo: R, clock: C) -> Self {
        Self {
            store: CollectionStore::new(repo),
            clock,
        }
    }

    /// Evaluates one poll tick and delivers due reminders through `sink`.
    pub fn tick(&self, sink: &dyn NotificationSink) -> ServiceResult<Vec<FiredReminder>> {
        let now = self.clock.now();
        let now_utc = now.with_timezone(&Utc);
        let today = now.date_naive();
        let current_time = hhmm(&now);
        let debounce = ChronoDuration::seconds(REMINDER_DEBOUNCE_SECS);

        let members = self.store.load_members()?;
        let medicines = self.store.load_medicines()?;
        let mut records = self.store.load_notifications()?;

        let mut fired = Vec::new();
        for medicine in medicines
            .iter()
            .filter(|medicine| is_scheduled(medicine, today, &current_time))
        {
            let key = reminder_key(&medicine.id, &current_time);
            let due = records
                .iter()
                .find(|record| record.key == key)
                .map_or(true, |record| now_utc - record.ts > debounce);
            if !due {
                continue;
            }

            let owner_name = members
                .iter()
                .find(|member| member.id == medicine.family_member_id)
                .map_or("", |member| member.name.as_str());
            let title = format!("Medicine Reminder: {}", medicine.name);
            let body = format!("{owner_name} • {} • {current_time}", medicine.dosage);

            sink.play_chime();
            let delivery = deliver(sink, &title, &body);
            upsert_record(&mut records, key, now_utc);

            info!(
                "event=reminder_fire module=service status=ok medicine_id={} time={} delivery={:?}",
                medicine.id, current_time, delivery
            );
            fired.push(FiredReminder {
                medicine_id: medicine.id.clone(),
                scheduled_time: current_time.clone(),
                title,
                body,
                delivery,
            });
        }

        if !fired.is_empty() {
            self.store.save_notifications(&records)?;
        }
        Ok(fired)
    }
}

/// Fixed-period driver for `ReminderService::tick`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderPoller {
    interval: Duration,
}

impl ReminderPoller {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Ticks immediately, then once per interval, until `max_ticks` is reached.
    ///
    /// `wait` is called between ticks with the interval; pass `std::thread::sleep`
    /// for real time. With `max_ticks == None` the loop never returns.
    /// Returns the number of reminders fired.
    pub fn run<R, C, W>(
        &self,
        service: &ReminderService<R, C>,
        sink: &dyn NotificationSink,
        max_ticks: Option<u64>,
        mut wait: W,
    ) -> u64
    where
        R: KeyValueRepository,
        C: Clock,
        W: FnMut(Duration),
    {
        info!(
            "event=reminder_poll module=service status=start interval_secs={} max_ticks={}",
            self.interval.as_secs(),
            max_ticks.map_or_else(|| "unbounded".to_string(), |n| n.to_string())
        );

        let mut ticks = 0_u64;
        let mut fired_total = 0_u64;
        loop {
            match service.tick(sink) {
                Ok(fired) => fired_total += fired.len() as u64,
                Err(err) => error!(
                    "event=reminder_tick module=service status=error tick={} error={}",
                    ticks, err
                ),
            }
            ticks += 1;
            if max_ticks.is_some_and(|limit| ticks >= limit) {
                break;
            }
            wait(self.interval);
        }

        info!(
            "event=reminder_poll module=service status=ok ticks={} fired={}",
            ticks, fired_total
        );
        fired_total
    }
}

#[cfg(test)]
mod tests {
    use super::{ReminderPoller, ReminderService};
    use crate::clock::FixedClock;
    use crate::model::medicine::{Medicine, MedicineDraft};
    use crate::model::member::Member;
    use crate::notify::{NotificationPermission, RecordingSink};
    use crate::repo::collections::CollectionStore;
    use crate::repo::kv_repo::MemoryKeyValueRepository;
    use chrono::{Duration, NaiveDate, Utc};

    fn seed(repo: &MemoryKeyValueRepository) -> Medicine {
        let store = CollectionStore::new(repo);
        let member = Member::new("Asha", "Mother", None).unwrap();
        let draft = MedicineDraft {
            name: "Metformin".to_string(),
            dosage: "500mg".to_string(),
            times: vec!["08:00".to_string()],
            ..MedicineDraft::default()
        };
        let medicine = Medicine::from_draft(member.id.clone(), draft, Utc::now()).unwrap();
        store.save_members(&[member]).unwrap();
        store.save_medicines(&[medicine.clone()]).unwrap();
        medicine
    }

    fn clock_at(hour: u32, minute: u32, second: u32) -> FixedClock {
        FixedClock::at_local(NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(), hour, minute, second)
            .unwrap()
    }

    #[test]
    fn fires_with_owner_and_dosage_in_body() {
        let repo = MemoryKeyValueRepository::new();
        let medicine = seed(&repo);
        let clock = clock_at(8, 0, 5);
        let sink = RecordingSink::new(NotificationPermission::Granted);

        let fired = ReminderService::new(&repo, &clock).tick(&sink).unwrap();
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].medicine_id, medicine.id);
        assert_eq!(fired[0].title, "Medicine Reminder: Metformin");
        assert_eq!(fired[0].body, "Asha • 500mg • 08:00");
        assert_eq!(sink.chimes(), 1);
    }

    #[test]
    fn same_minute_does_not_fire_twice() {
        let repo = MemoryKeyValueRepository::new();
        seed(&repo);
        let clock = clock_at(8, 0, 0);
        let sink = RecordingSink::new(NotificationPermission::Denied);
        let service = ReminderService::new(&repo, &clock);

        assert_eq!(service.tick(&sink).unwrap().len(), 1);
        clock.advance(Duration::seconds(20));
        assert!(service.tick(&sink).unwrap().is_empty());
        clock.advance(Duration::seconds(20));
        assert!(service.tick(&sink).unwrap().is_empty());
        assert_eq!(sink.delivered().len(), 1);
    }

    #[test]
    fn non_matching_minute_fires_nothing_and_writes_nothing() {
        let repo = MemoryKeyValueRepository::new();
        seed(&repo);
        let clock = clock_at(8, 1, 0);
        let sink = RecordingSink::new(NotificationPermission::Granted);

        assert!(ReminderService::new(&repo, &clock).tick(&sink).unwrap().is_empty());
        assert!(CollectionStore::new(&repo).load_notifications().unwrap().is_empty());
    }

    #[test]
    fn bounded_poller_ticks_and_waits_between() {
        let repo = MemoryKeyValueRepository::new();
        seed(&repo);
        let clock = clock_at(8, 0, 0);
        let sink = RecordingSink::new(NotificationPermission::Granted);
        let service = ReminderService::new(&repo, &clock);
        let poller = ReminderPoller::new(std::time::Duration::from_secs(20));

        let mut waits = 0;
        let fired = poller.run(&service, &sink, Some(3), |interval| {
            waits += 1;
            clock.advance(Duration::from_std(interval).unwrap());
        });
        assert_eq!(fired, 1);
        assert_eq!(waits, 2);
    }
}
