//! Service-level error taxonomy.

use crate::model::adherence::{SlotKey, SlotState};
use crate::model::validation::ValidationError;
use crate::repo::kv_repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// User-reportable failure of a service call.
#[derive(Debug)]
pub enum ServiceError {
    /// Input rejected before any write.
    Validation(ValidationError),
    MemberNotFound(String),
    MedicineNotFound(String),
    /// The slot already has a recorded outcome; undo it first.
    SlotAlreadyResolved { slot: SlotKey, state: SlotState },
    /// The time is not a dose time of the medicine on that date.
    SlotNotScheduled(SlotKey),
    /// Storage transport failure.
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::MemberNotFound(id) => write!(f, "member not found: {id}"),
            Self::MedicineNotFound(id) => write!(f, "medicine not found: {id}"),
            Self::SlotAlreadyResolved { slot, state } => write!(
                f,
                "dose {} on {} for medicine {} is already {}; undo it first",
                slot.scheduled_time,
                slot.date,
                slot.medicine_id,
                state.label().to_ascii_lowercase()
            ),
            Self::SlotNotScheduled(slot) => write!(
                f,
                "medicine {} has no dose at {} on {}",
                slot.medicine_id, slot.scheduled_time, slot.date
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}
