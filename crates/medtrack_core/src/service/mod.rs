//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate snapshot load, in-memory mutation and full-collection commit.
//! - Keep adapters (CLI, UI bridges) decoupled from storage details.
//!
//! # Invariants
//! - Every mutating call reloads the collections it touches before mutating.
//! - A failed validation or lookup writes nothing.

pub mod adherence_service;
pub mod error;
pub mod medicine_service;
pub mod member_service;
pub mod reminder_service;
pub mod tracker_service;
