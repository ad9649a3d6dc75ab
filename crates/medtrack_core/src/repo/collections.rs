//! Typed access to the four persisted collections.
//!
//! # Responsibility
//! - Encode/decode each collection as one JSON array under its storage key.
//! - Load consistent in-memory snapshots and commit touched collections together.
//!
//! # Invariants
//! - Decode failures are swallowed: the collection is treated as empty and a
//!   `warn` event is logged.
//! - Commits replace whole collections in a single `set_many` call.

use crate::model::adherence::AdherenceEvent;
use crate::model::medicine::Medicine;
use crate::model::member::Member;
use crate::model::notification::NotificationRecord;
use crate::repo::kv_repo::{KeyValueRepository, RepoResult};
use log::warn;
use serde::de::DeserializeOwned;

/// Named collection and its storage key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Members,
    Medicines,
    Adherence,
    Notifications,
}

impl Collection {
    pub fn key(self) -> &'static str {
        match self {
            Self::Members => "medtrack_users_v1",
            Self::Medicines => "medtrack_meds_v1",
            Self::Adherence => "medtrack_adherence_v1",
            Self::Notifications => "medtrack_lastnotified_v1",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Members => "members",
            Self::Medicines => "medicines",
            Self::Adherence => "adherence",
            Self::Notifications => "notifications",
        }
    }
}

/// In-memory copy of every collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub members: Vec<Member>,
    pub medicines: Vec<Medicine>,
    pub adherence: Vec<AdherenceEvent>,
    pub notifications: Vec<NotificationRecord>,
}

impl Snapshot {
    pub fn member(&self, id: &str) -> Option<&Member> {
        self.members.iter().find(|member| member.id == id)
    }

    pub fn medicine(&self, id: &str) -> Option<&Medicine> {
        self.medicines.iter().find(|medicine| medicine.id == id)
    }

    pub fn medicine_mut(&mut self, id: &str) -> Option<&mut Medicine> {
        self.medicines.iter_mut().find(|medicine| medicine.id == id)
    }
}

/// Collection-level store over any key-value repository.
#[derive(Debug, Clone, Copy)]
pub struct CollectionStore<R> {
    repo: R,
}

impl<R: KeyValueRepository> CollectionStore<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn load_members(&self) -> RepoResult<Vec<Member>> {
        self.load(Collection::Members)
    }

    pub fn load_medicines(&self) -> RepoResult<Vec<Medicine>> {
        self.load(Collection::Medicines)
    }

    pub fn load_adherence(&self) -> RepoResult<Vec<AdherenceEvent>> {
        self.load(Collection::Adherence)
    }

    pub fn load_notifications(&self) -> RepoResult<Vec<NotificationRecord>> {
        self.load(Collection::Notifications)
    }

    pub fn save_members(&self, members: &[Member]) -> RepoResult<()> {
        self.repo
            .set(Collection::Members.key(), serde_json::to_string(members)?)
    }

    pub fn save_medicines(&self, medicines: &[Medicine]) -> RepoResult<()> {
        self.repo
            .set(Collection::Medicines.key(), serde_json::to_string(medicines)?)
    }

    pub fn save_notifications(&self, records: &[NotificationRecord]) -> RepoResult<()> {
        self.repo
            .set(Collection::Notifications.key(), serde_json::to_string(records)?)
    }

    /// Loads every collection.
    pub fn load_snapshot(&self) -> RepoResult<Snapshot> {
        Ok(Snapshot {
            members: self.load_members()?,
            medicines: self.load_medicines()?,
            adherence: self.load_adherence()?,
            notifications: self.load_notifications()?,
        })
    }

    /// Writes the listed collections from `snapshot` in one atomic batch.
    pub fn commit(&self, snapshot: &Snapshot, touched: &[Collection]) -> RepoResult<()> {
        let mut entries: Vec<(&str, String)> = Vec::with_capacity(touched.len());
        for collection in touched {
            let encoded = match collection {
                Collection::Members => serde_json::to_string(&snapshot.members)?,
                Collection::Medicines => serde_json::to_string(&snapshot.medicines)?,
                Collection::Adherence => serde_json::to_string(&snapshot.adherence)?,
                Collection::Notifications => serde_json::to_string(&snapshot.notifications)?,
            };
            entries.push((collection.key(), encoded));
        }
        if entries.is_empty() {
            return Ok(());
        }
        self.repo.set_many(&entries)
    }

    fn load<T: DeserializeOwned>(&self, collection: Collection) -> RepoResult<Vec<T>> {
        let Some(raw) = self.repo.get(collection.key())? else {
            return Ok(Vec::new());
        };
        Ok(decode_collection(collection, &raw))
    }
}

/// Decodes a stored array; `null` and garbage both yield an empty list.
fn decode_collection<T: DeserializeOwned>(collection: Collection, raw: &str) -> Vec<T> {
    match serde_json::from_str::<Option<Vec<T>>>(raw) {
        Ok(items) => items.unwrap_or_default(),
        Err(err) => {
            warn!(
                "event=collection_load module=repo status=error collection={} error_code=corrupt_data action=treat_as_empty error={}",
                collection.label(),
                err
            );
            Vec::new()
        }
    }
}
