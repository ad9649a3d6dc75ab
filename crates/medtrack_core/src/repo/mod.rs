//! Repository layer over the key-value substrate.
//!
//! # Responsibility
//! - Define the key-value contract (`KeyValueRepository`) and its SQLite and
//!   in-memory implementations.
//! - Map the four named collections to typed, whole-collection load/save.
//!
//! # Invariants
//! - A collection is always written in full; there are no partial writes.
//! - Missing or unparseable collections load as empty, never as errors.

pub mod collections;
pub mod kv_repo;
