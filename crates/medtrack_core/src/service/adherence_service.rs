//! Adherence bookkeeping: taken/skipped outcomes, undo, and stock.
//!
//! # Responsibility
//! - Move dose slots between Pending, Taken and Skipped.
//! - Keep `stock_qty` in step with recorded taken doses.
//! - Build the per-member dose list for a day with slot states.
//!
//! # Invariants
//! - At most one event per slot: recording onto a resolved slot is rejected.
//! - Marking taken decrements stock floored at 0; undoing a taken dose adds 1
//!   unconditionally. From stock 0, take + undo therefore leaves stock at 1;
//!   this asymmetry is kept on purpose until product decides otherwise.
//! - Adherence and medicine collections are committed together.

use crate::clock::Clock;
use crate::model::adherence::{slot_state, AdherenceEvent, SlotKey, SlotState};
use crate::repo::collections::{Collection, CollectionStore};
use crate::repo::kv_repo::KeyValueRepository;
use crate::schedule::{dose_times_on, is_scheduled};
use crate::service::error::{ServiceError, ServiceResult};
use chrono::NaiveDate;
use log::info;

/// One dose slot of a member's day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledDose {
    pub slot: SlotKey,
    pub medicine_name: String,
    pub dosage: String,
    pub notes: String,
    pub state: SlotState,
}

pub struct AdherenceService<R: KeyValueRepository, C: Clock> {
    store: CollectionStore<R>,
    clock: C,
}

impl<R: KeyValueRepository, C: Clock> AdherenceService<R, C> {
    pub fn new(repo: R, clock: C) -> Self {
        Self {
            store: CollectionStore::new(repo),
            clock,
        }
    }

    /// Records "taken" for today's `scheduled_time` slot.
    pub fn mark_taken(&self, medicine_id: &str, scheduled_time: &str) -> ServiceResult<AdherenceEvent> {
        self.record(&self.today_slot(medicine_id, scheduled_time), true)
    }

    /// Records "skipped" for today's `scheduled_time` slot.
    pub fn mark_skipped(
        &self,
        medicine_id: &str,
        scheduled_time: &str,
    ) -> ServiceResult<AdherenceEvent> {
        self.record(&self.today_slot(medicine_id, scheduled_time), false)
    }

    /// Reverts today's `scheduled_time` slot to Pending.
    pub fn undo(&self, medicine_id: &str, scheduled_time: &str) -> ServiceResult<Option<AdherenceEvent>> {
        self.undo_slot(&self.today_slot(medicine_id, scheduled_time))
    }

    /// Records the outcome of a Pending slot.
    ///
    /// # Errors
    /// - `MedicineNotFound` when the medicine is gone.
    /// - `SlotNotScheduled` when the time is not a dose time on that date.
    /// - `SlotAlreadyResolved` when an outcome already exists; nothing is written.
    pub fn record(&self, slot: &SlotKey, taken: bool) -> ServiceResult<AdherenceEvent> {
        let mut snapshot = self.store.load_snapshot()?;

        let medicine = snapshot
            .medicine(&slot.medicine_id)
            .ok_or_else(|| ServiceError::MedicineNotFound(slot.medicine_id.clone()))?;
        if !is_scheduled(medicine, slot.date, &slot.scheduled_time) {
            return Err(ServiceError::SlotNotScheduled(slot.clone()));
        }
        let owner_id = medicine.family_member_id.clone();

        let state = slot_state(&snapshot.adherence, slot);
        if state != SlotState::Pending {
            info!(
                "event=adherence_record module=service status=skip medicine_id={} date={} time={} reason=already_{}",
                slot.medicine_id,
                slot.date,
                slot.scheduled_time,
                state.label().to_ascii_lowercase()
            );
            return Err(ServiceError::SlotAlreadyResolved {
                slot: slot.clone(),
                state,
            });
        }

        let event = AdherenceEvent::new(slot, owner_id, taken, self.clock.now());
        snapshot.adherence.push(event.clone());

        let mut touched = vec![Collection::Adherence];
        let mut stock_after = None;
        if taken {
            if let Some(medicine) = snapshot.medicine_mut(&slot.medicine_id) {
                medicine.stock_qty = medicine.stock_qty.saturating_sub(1);
                stock_after = Some(medicine.stock_qty);
                touched.push(Collection::Medicines);
            }
        }

        self.store.commit(&snapshot, &touched)?;
        info!(
            "event=adherence_record module=service status=ok medicine_id={} date={} time={} taken={} stock_after={}",
            slot.medicine_id,
            slot.date,
            slot.scheduled_time,
            taken,
            stock_after.map_or_else(|| "unchanged".to_string(), |qty| qty.to_string())
        );
        Ok(event)
    }

    /// Deletes the slot's event, restoring one dose of stock if it was taken.
    ///
    /// Returns the removed event, or `None` when the slot was already Pending.
    pub fn undo_slot(&self, slot: &SlotKey) -> ServiceResult<Option<AdherenceEvent>> {
        let mut snapshot = self.store.load_snapshot()?;

        let Some(index) = snapshot.adherence.iter().position(|event| event.matches(slot)) else {
            info!(
                "event=adherence_undo module=service status=skip medicine_id={} date={} time={} reason=pending",
                slot.medicine_id, slot.date, slot.scheduled_time
            );
            return Ok(None);
        };
        let removed = snapshot.adherence.remove(index);

        let mut touched = vec![Collection::Adherence];
        if removed.taken {
            // Stock of a deleted medicine cannot be restored; the event still goes.
            if let Some(medicine) = snapshot.medicine_mut(&removed.medicine_id) {
                medicine.stock_qty = medicine.stock_qty.saturating_add(1);
                touched.push(Collection::Medicines);
            }
        }

        self.store.commit(&snapshot, &touched)?;
        info!(
            "event=adherence_undo module=service status=ok medicine_id={} date={} time={} was_taken={}",
            slot.medicine_id, slot.date, slot.scheduled_time, removed.taken
        );
        Ok(Some(removed))
    }

    pub fn slot_state(&self, slot: &SlotKey) -> ServiceResult<SlotState> {
        let events = self.store.load_adherence()?;
        Ok(slot_state(&events, slot))
    }

    /// Today's doses for `member_id`.
    pub fn today(&self, member_id: &str) -> ServiceResult<Vec<ScheduledDose>> {
        self.doses_on(member_id, self.clock.today())
    }

    /// Doses of `member_id`'s active medicines on `date`, medicine order then time order.
    pub fn doses_on(&self, member_id: &str, date: NaiveDate) -> ServiceResult<Vec<ScheduledDose>> {
        let snapshot = self.store.load_snapshot()?;
        if snapshot.member(member_id).is_none() {
            return Err(ServiceError::MemberNotFound(member_id.to_string()));
        }

        let mut doses = Vec::new();
        for medicine in snapshot
            .medicines
            .iter()
            .filter(|medicine| medicine.family_member_id == member_id)
        {
            for time in dose_times_on(medicine, date) {
                let slot = SlotKey::new(medicine.id.clone(), date, time.clone());
                let state = slot_state(&snapshot.adherence, &slot);
                doses.push(ScheduledDose {
                    slot,
                    medicine_name: medicine.name.clone(),
                    dosage: medicine.dosage.clone(),
                    notes: medicine.notes.clone(),
                    state,
                });
            }
        }
        Ok(doses)
    }

    fn today_slot(&self, medicine_id: &str, scheduled_time: &str) -> SlotKey {
        SlotKey::new(medicine_id, self.clock.today(), scheduled_time.trim())
    }
}
