//! Household member use-cases.
//!
//! # Responsibility
//! - Add, edit, list and delete members.
//! - Seed the default `Me`/`Self` member when the household is empty.
//!
//! # Invariants
//! - Deleting a member deletes every medicine it owns in the same commit.
//! - Adherence history of deleted medicines is left in place.

use crate::model::member::Member;
use crate::repo::collections::{Collection, CollectionStore};
use crate::repo::kv_repo::KeyValueRepository;
use crate::service::error::{ServiceError, ServiceResult};
use log::info;

/// Result of a cascading member delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberDeletion {
    pub member: Member,
    pub removed_medicine_ids: Vec<String>,
}

pub struct MemberService<R: KeyValueRepository> {
    store: CollectionStore<R>,
}

impl<R: KeyValueRepository> MemberService<R> {
    pub fn new(repo: R) -> Self {
        Self {
            store: CollectionStore::new(repo),
        }
    }

    pub fn list_members(&self) -> ServiceResult<Vec<Member>> {
        Ok(self.store.load_members()?)
    }

    pub fn get_member(&self, id: &str) -> ServiceResult<Option<Member>> {
        Ok(self
            .store
            .load_members()?
            .into_iter()
            .find(|member| member.id == id))
    }

    /// Creates the default member when none exist.
    ///
    /// Returns the created member, or `None` when the household already has members.
    pub fn ensure_default_member(&self) -> ServiceResult<Option<Member>> {
        let mut members = self.store.load_members()?;
        if !members.is_empty() {
            return Ok(None);
        }
        let member = Member::default_self();
        members.push(member.clone());
        self.store.save_members(&members)?;
        info!(
            "event=member_seed module=service status=ok member_id={}",
            member.id
        );
        Ok(Some(member))
    }

    pub fn add_member(
        &self,
        name: &str,
        relationship: &str,
        age: Option<String>,
    ) -> ServiceResult<Member> {
        let member = Member::new(name, relationship, age)?;
        let mut members = self.store.load_members()?;
        members.push(member.clone());
        self.store.save_members(&members)?;
        info!(
            "event=member_add module=service status=ok member_id={}",
            member.id
        );
        Ok(member)
    }

    /// Replaces name and relationship of an existing member.
    pub fn update_member(&self, id: &str, name: &str, relationship: &str) -> ServiceResult<Member> {
        let mut members = self.store.load_members()?;
        let member = members
            .iter_mut()
            .find(|member| member.id == id)
            .ok_or_else(|| ServiceError::MemberNotFound(id.to_string()))?;

        let mut updated = member.clone();
        updated.name = name.trim().to_string();
        updated.relationship = relationship.trim().to_string();
        updated.validate()?;
        *member = updated.clone();

        self.store.save_members(&members)?;
        info!(
            "event=member_update module=service status=ok member_id={}",
            updated.id
        );
        Ok(updated)
    }

    /// Deletes a member and every medicine it owns.
    pub fn delete_member(&self, id: &str) -> ServiceResult<MemberDeletion> {
        let mut snapshot = self.store.load_snapshot()?;
        let index = snapshot
            .members
            .iter()
            .position(|member| member.id == id)
            .ok_or_else(|| ServiceError::MemberNotFound(id.to_string()))?;
        let member = snapshot.members.remove(index);

        let mut removed_medicine_ids = Vec::new();
        snapshot.medicines.retain(|medicine| {
            if medicine.family_member_id == member.id {
                removed_medicine_ids.push(medicine.id.clone());
                false
            } else {
                true
            }
        });

        self.store
            .commit(&snapshot, &[Collection::Members, Collection::Medicines])?;
        info!(
            "event=member_delete module=service status=ok member_id={} medicines_removed={}",
            member.id,
            removed_medicine_ids.len()
        );
        Ok(MemberDeletion {
            member,
            removed_medicine_ids,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::MemberService;
    use crate::model::member::{DEFAULT_MEMBER_NAME, DEFAULT_MEMBER_RELATIONSHIP};
    use crate::repo::kv_repo::MemoryKeyValueRepository;
    use crate::service::error::ServiceError;

    #[test]
    fn default_member_is_seeded_once() {
        let repo = MemoryKeyValueRepository::new();
        let service = MemberService::new(&repo);

        let seeded = service.ensure_default_member().unwrap().unwrap();
        assert_eq!(seeded.name, DEFAULT_MEMBER_NAME);
        assert_eq!(seeded.relationship, DEFAULT_MEMBER_RELATIONSHIP);
        assert!(service.ensure_default_member().unwrap().is_none());
        assert_eq!(service.list_members().unwrap().len(), 1);
    }

    #[test]
    fn update_rejects_blank_name_without_writing() {
        let repo = MemoryKeyValueRepository::new();
        let service = MemberService::new(&repo);
        let member = service.add_member("Asha", "Mother", None).unwrap();

        let err = service.update_member(&member.id, " ", "Mother").unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(service.get_member(&member.id).unwrap().unwrap().name, "Asha");
    }

    #[test]
    fn unknown_member_is_a_lookup_failure() {
        let repo = MemoryKeyValueRepository::new();
        let service = MemberService::new(&repo);
        assert!(matches!(
            service.delete_member("u_missing").unwrap_err(),
            ServiceError::MemberNotFound(_)
        ));
    }
}
