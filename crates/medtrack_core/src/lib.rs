//! Core domain logic for MedTrack.
//! This crate is the single source of truth for medication bookkeeping invariants.

pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod notify;
pub mod repo;
pub mod schedule;
pub mod service;

pub use clock::{Clock, FixedClock, SystemClock, LOCAL_UTC_OFFSET_MINUTES};
pub use config::{AppConfig, ConfigError};
pub use db::{open_db, open_db_in_memory, DbError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::adherence::{AdherenceEvent, SlotKey, SlotState};
pub use model::medicine::{Medicine, MedicineDraft, MedicineType, StockEstimate};
pub use model::member::Member;
pub use model::validation::ValidationError;
pub use notify::{Delivery, NotificationPermission, NotificationSink};
pub use repo::kv_repo::{
    KeyValueRepository, MemoryKeyValueRepository, RepoError, RepoResult,
    SqliteKeyValueRepository,
};
pub use service::adherence_service::{AdherenceService, ScheduledDose};
pub use service::error::{ServiceError, ServiceResult};
pub use service::medicine_service::{MedicineListQuery, MedicineService, MedicineSummary};
pub use service::member_service::{MemberDeletion, MemberService};
pub use service::reminder_service::{
    FiredReminder, ReminderPoller, ReminderService, REMINDER_DEBOUNCE_SECS,
};
pub use service::tracker_service::{DayAdherence, TrackerService, TrackerSummary};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
