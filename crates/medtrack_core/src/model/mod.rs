//! Household medication domain model.
//!
//! # Responsibility
//! - Define the persisted records (members, medicines, adherence events,
//!   reminder ledger entries) and their wire shape.
//! - Own field validation and pure derivations (frequency label, stock estimate).
//!
//! # Invariants
//! - Identifiers are opaque strings; they are generated once and never reused.
//! - Records serialize with camelCase field names.

pub mod adherence;
pub mod medicine;
pub mod member;
pub mod notification;
pub mod validation;

use uuid::Uuid;

/// Generates a new opaque identifier with a short kind prefix (`u_`, `m_`, `e_`).
pub fn new_id(prefix: &str) -> String {
    format!("{prefix}{}", Uuid::new_v4().simple())
}
