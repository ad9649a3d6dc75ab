//! Reminder debounce ledger entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Last firing time for one `medicineId#HH:MM` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub key: String,
    pub ts: DateTime<Utc>,
}

/// Ledger key for a medicine's dose time.
pub fn reminder_key(medicine_id: &str, scheduled_time: &str) -> String {
    format!("{medicine_id}#{scheduled_time}")
}

/// Replaces any record for `key` with a fresh one stamped `ts`.
pub fn upsert_record(records: &mut Vec<NotificationRecord>, key: String, ts: DateTime<Utc>) {
    records.retain(|record| record.key != key);
    records.push(NotificationRecord { key, ts });
}
