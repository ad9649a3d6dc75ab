//! Adherence history records and slot identity.
//!
//! # Invariants
//! - An event is never mutated after creation; undo deletes it.
//! - At most one event exists per `SlotKey`.

use crate::model::medicine::MedicineId;
use crate::model::member::MemberId;
use crate::model::new_id;
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

/// One (medicine, calendar date, scheduled time) unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlotKey {
    pub medicine_id: MedicineId,
    pub date: NaiveDate,
    pub scheduled_time: String,
}

impl SlotKey {
    pub fn new(
        medicine_id: impl Into<MedicineId>,
        date: NaiveDate,
        scheduled_time: impl Into<String>,
    ) -> Self {
        Self {
            medicine_id: medicine_id.into(),
            date,
            scheduled_time: scheduled_time.into(),
        }
    }
}

/// Resolution state of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Pending,
    Taken,
    Skipped,
}

impl SlotState {
    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Taken => "Taken",
            Self::Skipped => "Skipped",
        }
    }
}

/// Persisted outcome of one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdherenceEvent {
    pub id: String,
    pub medicine_id: MedicineId,
    /// Copied from the medicine when the event is recorded.
    pub family_member_id: MemberId,
    pub taken: bool,
    pub taken_at: DateTime<FixedOffset>,
    pub scheduled_time: String,
    pub date: NaiveDate,
}

impl AdherenceEvent {
    pub fn new(
        slot: &SlotKey,
        family_member_id: impl Into<MemberId>,
        taken: bool,
        taken_at: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            id: new_id("e_"),
            medicine_id: slot.medicine_id.clone(),
            family_member_id: family_member_id.into(),
            taken,
            taken_at,
            scheduled_time: slot.scheduled_time.clone(),
            date: slot.date,
        }
    }

    pub fn matches(&self, slot: &SlotKey) -> bool {
        self.medicine_id == slot.medicine_id
            && self.date == slot.date
            && self.scheduled_time == slot.scheduled_time
    }

    pub fn state(&self) -> SlotState {
        if self.taken {
            SlotState::Taken
        } else {
            SlotState::Skipped
        }
    }
}

/// State of `slot` within an event list.
pub fn slot_state(events: &[AdherenceEvent], slot: &SlotKey) -> SlotState {
    events
        .iter()
        .find(|event| event.matches(slot))
        .map_or(SlotState::Pending, AdherenceEvent::state)
}
