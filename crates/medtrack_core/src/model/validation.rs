//! Field validation failures for member and medicine saves.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// A save was rejected before anything was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Member name is empty after trimming.
    EmptyMemberName,
    /// Medicine name is empty after trimming.
    EmptyMedicineName,
    /// Owner id is empty.
    MissingOwner,
    /// No usable dose time remained after cleanup.
    NoDoseTimes,
    /// A dose time is not `HH:MM` on a 24h clock.
    InvalidDoseTime(String),
    /// A start/end bound is not `YYYY-MM-DD`.
    InvalidDate { field: &'static str, value: String },
    /// Medicine type is not one of the supported kinds.
    UnknownMedicineType(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyMemberName => write!(f, "member name is required"),
            Self::EmptyMedicineName => write!(f, "medicine name is required"),
            Self::MissingOwner => write!(f, "medicine must belong to a family member"),
            Self::NoDoseTimes => write!(f, "at least one dose time is required"),
            Self::InvalidDoseTime(value) => {
                write!(f, "invalid dose time `{value}`; expected HH:MM")
            }
            Self::InvalidDate { field, value } => {
                write!(f, "invalid {field} `{value}`; expected YYYY-MM-DD")
            }
            Self::UnknownMedicineType(value) => write!(
                f,
                "unknown medicine type `{value}`; expected Tablet|Capsule|Syrup|Injection"
            ),
        }
    }
}

impl Error for ValidationError {}
