//! Medicine model, schedule fields and stock derivations.
//!
//! # Responsibility
//! - Define the persisted medicine record and the editable draft used on save.
//! - Normalize and validate dose times and date bounds.
//! - Derive the frequency label and the days-of-stock-remaining estimate.
//!
//! # Invariants
//! - A saved medicine has a non-empty name and at least one `HH:MM` time.
//! - `times` keeps insertion order and holds no duplicates.
//! - `stock_qty` never goes negative.

use crate::model::member::MemberId;
use crate::model::new_id;
use crate::model::validation::ValidationError;
use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

pub type MedicineId = String;

static DOSE_TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[01]\d|2[0-3]):[0-5]\d$").expect("valid dose time regex"));

/// Dosage form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MedicineType {
    #[default]
    Tablet,
    Capsule,
    Syrup,
    Injection,
}

impl Display for MedicineType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Tablet => "Tablet",
            Self::Capsule => "Capsule",
            Self::Syrup => "Syrup",
            Self::Injection => "Injection",
        };
        f.write_str(label)
    }
}

impl FromStr for MedicineType {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "tablet" => Ok(Self::Tablet),
            "capsule" => Ok(Self::Capsule),
            "syrup" => Ok(Self::Syrup),
            "injection" => Ok(Self::Injection),
            _ => Err(ValidationError::UnknownMedicineType(value.to_string())),
        }
    }
}

/// Persisted medicine record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medicine {
    pub id: MedicineId,
    pub family_member_id: MemberId,
    pub name: String,
    #[serde(default)]
    pub dosage: String,
    #[serde(rename = "type", default)]
    pub kind: MedicineType,
    #[serde(default)]
    pub times: Vec<String>,
    /// Inclusive `YYYY-MM-DD` lower bound; kept as stored text.
    #[serde(default, deserialize_with = "deserialize_bound")]
    pub start_date: Option<String>,
    /// Inclusive `YYYY-MM-DD` upper bound; kept as stored text.
    #[serde(default, deserialize_with = "deserialize_bound")]
    pub end_date: Option<String>,
    #[serde(default, deserialize_with = "deserialize_stock")]
    pub stock_qty: u32,
    #[serde(default)]
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

/// Editable medicine fields, replaced wholesale on save.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MedicineDraft {
    pub name: String,
    pub dosage: String,
    pub kind: MedicineType,
    pub times: Vec<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub stock_qty: u32,
    pub notes: String,
}

impl MedicineDraft {
    /// Trims text fields, cleans the time list and checks every rule.
    ///
    /// Empty time entries are dropped and repeated times keep their first position.
    pub fn normalized(self) -> Result<Self, ValidationError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::EmptyMedicineName);
        }

        let mut times: Vec<String> = Vec::with_capacity(self.times.len());
        for raw in self.times {
            let time = raw.trim();
            if time.is_empty() {
                continue;
            }
            if !is_dose_time(time) {
                return Err(ValidationError::InvalidDoseTime(time.to_string()));
            }
            if !times.iter().any(|existing| existing == time) {
                times.push(time.to_string());
            }
        }
        if times.is_empty() {
            return Err(ValidationError::NoDoseTimes);
        }

        Ok(Self {
            name,
            dosage: self.dosage.trim().to_string(),
            kind: self.kind,
            times,
            start_date: normalize_bound("start date", self.start_date)?,
            end_date: normalize_bound("end date", self.end_date)?,
            stock_qty: self.stock_qty,
            notes: self.notes.trim().to_string(),
        })
    }
}

impl Medicine {
    /// Builds a new medicine owned by `member_id` from a validated draft.
    pub fn from_draft(
        member_id: impl Into<MemberId>,
        draft: MedicineDraft,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let family_member_id = member_id.into();
        if family_member_id.trim().is_empty() {
            return Err(ValidationError::MissingOwner);
        }
        let draft = draft.normalized()?;
        Ok(Self {
            id: new_id("m_"),
            family_member_id,
            name: draft.name,
            dosage: draft.dosage,
            kind: draft.kind,
            times: draft.times,
            start_date: draft.start_date,
            end_date: draft.end_date,
            stock_qty: draft.stock_qty,
            notes: draft.notes,
            created_at,
        })
    }

    /// Replaces every editable field; id, owner and creation time are kept.
    pub fn apply_draft(&mut self, draft: MedicineDraft) -> Result<(), ValidationError> {
        let draft = draft.normalized()?;
        self.name = draft.name;
        self.dosage = draft.dosage;
        self.kind = draft.kind;
        self.times = draft.times;
        self.start_date = draft.start_date;
        self.end_date = draft.end_date;
        self.stock_qty = draft.stock_qty;
        self.notes = draft.notes;
        Ok(())
    }

    /// Current editable fields as a draft.
    pub fn to_draft(&self) -> MedicineDraft {
        MedicineDraft {
            name: self.name.clone(),
            dosage: self.dosage.clone(),
            kind: self.kind,
            times: self.times.clone(),
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
            stock_qty: self.stock_qty,
            notes: self.notes.clone(),
        }
    }

    pub fn doses_per_day(&self) -> usize {
        self.times.len()
    }

    pub fn frequency_label(&self) -> String {
        frequency_label(self.doses_per_day())
    }

    /// Full days the current stock covers, `None` without a schedule.
    pub fn days_remaining(&self) -> Option<u32> {
        days_remaining(self.stock_qty, self.doses_per_day())
    }

    pub fn stock_estimate(&self) -> StockEstimate {
        match self.days_remaining() {
            Some(days) => StockEstimate::Days(days),
            None => StockEstimate::Unavailable,
        }
    }
}

/// Human label for a daily dose count.
pub fn frequency_label(doses_per_day: usize) -> String {
    match doses_per_day {
        0 => "No schedule".to_string(),
        1 => "Once daily".to_string(),
        2 => "Twice daily".to_string(),
        n => format!("{n} times daily"),
    }
}

/// `floor(stock / doses_per_day)`, or `None` when nothing is scheduled.
pub fn days_remaining(stock_qty: u32, doses_per_day: usize) -> Option<u32> {
    if doses_per_day == 0 {
        return None;
    }
    let per_day = u32::try_from(doses_per_day).unwrap_or(u32::MAX);
    Some(stock_qty / per_day)
}

/// Stock coverage shown next to a medicine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockEstimate {
    Days(u32),
    Unavailable,
}

impl Display for StockEstimate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Days(1) => write!(f, "~1 day remaining"),
            Self::Days(days) => write!(f, "~{days} days remaining"),
            Self::Unavailable => write!(f, "Estimate unavailable"),
        }
    }
}

/// Returns whether `value` is a 24h `HH:MM` time.
pub fn is_dose_time(value: &str) -> bool {
    DOSE_TIME_RE.is_match(value)
}

/// Parses a stored `YYYY-MM-DD` bound; `None` for anything else.
pub fn parse_date_bound(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

fn normalize_bound(
    field: &'static str,
    value: Option<String>,
) -> Result<Option<String>, ValidationError> {
    let Some(value) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    match parse_date_bound(&value) {
        Some(date) => Ok(Some(date.format("%Y-%m-%d").to_string())),
        None => Err(ValidationError::InvalidDate { field, value }),
    }
}

fn deserialize_bound<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.trim().is_empty()))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StockRepr {
    Integer(i64),
    Float(f64),
    Text(String),
}

/// Older records may hold a float, a negative number or a numeric string.
fn deserialize_stock<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match Option::<StockRepr>::deserialize(deserializer)? {
        Some(StockRepr::Integer(value)) => value,
        Some(StockRepr::Float(value)) if value.is_finite() => value.trunc() as i64,
        Some(StockRepr::Text(text)) => text.trim().parse::<i64>().unwrap_or(0),
        Some(StockRepr::Float(_)) | None => 0,
    };
    Ok(u32::try_from(raw.max(0)).unwrap_or(u32::MAX))
}
