//! Medicine use-cases.
//!
//! # Responsibility
//! - Add, edit (full replacement), delete, get and list medicines.
//! - Attach owner name and stock derivations for display.
//!
//! # Invariants
//! - A medicine can only be added for an existing member.
//! - Edits never change id, owner or creation time.

use crate::clock::Clock;
use crate::model::medicine::{Medicine, MedicineDraft, StockEstimate};
use crate::model::member::Member;
use crate::repo::collections::CollectionStore;
use crate::repo::kv_repo::KeyValueRepository;
use crate::service::error::{ServiceError, ServiceResult};
use chrono::Utc;
use log::info;

/// Filter for medicine listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MedicineListQuery {
    /// Only medicines owned by this member.
    pub member_id: Option<String>,
    /// Case-insensitive substring of the medicine name.
    pub name_contains: Option<String>,
}

/// Medicine plus the owner name it is shown with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MedicineSummary {
    pub medicine: Medicine,
    /// `None` when the owner no longer exists.
    pub owner_name: Option<String>,
}

impl MedicineSummary {
    pub fn frequency_label(&self) -> String {
        self.medicine.frequency_label()
    }

    pub fn stock_estimate(&self) -> StockEstimate {
        self.medicine.stock_estimate()
    }
}

pub struct MedicineService<R: KeyValueRepository, C: Clock> {
    store: CollectionStore<R>,
    clock: C,
}

impl<R: KeyValueRepository, C: Clock> MedicineService<R, C> {
    pub fn new(repo: R, clock: C) -> Self {
        Self {
            store: CollectionStore::new(repo),
            clock,
        }
    }

    /// Validates `draft` and saves it as a new medicine of `member_id`.
    pub fn add_medicine(&self, member_id: &str, draft: MedicineDraft) -> ServiceResult<Medicine> {
        let members = self.store.load_members()?;
        if !members.iter().any(|member| member.id == member_id) {
            return Err(ServiceError::MemberNotFound(member_id.to_string()));
        }

        let created_at = self.clock.now().with_timezone(&Utc);
        let medicine = Medicine::from_draft(member_id, draft, created_at)?;

        let mut medicines = self.store.load_medicines()?;
        medicines.push(medicine.clone());
        self.store.save_medicines(&medicines)?;
        info!(
            "event=medicine_add module=service status=ok medicine_id={} member_id={} doses_per_day={}",
            medicine.id,
            medicine.family_member_id,
            medicine.doses_per_day()
        );
        Ok(medicine)
    }

    /// Replaces every editable field of an existing medicine.
    pub fn update_medicine(&self, id: &str, draft: MedicineDraft) -> ServiceResult<Medicine> {
        let mut medicines = self.store.load_medicines()?;
        let medicine = medicines
            .iter_mut()
            .find(|medicine| medicine.id == id)
            .ok_or_else(|| ServiceError::MedicineNotFound(id.to_string()))?;

        let mut updated = medicine.clone();
        updated.apply_draft(draft)?;
        *medicine = updated.clone();

        self.store.save_medicines(&medicines)?;
        info!(
            "event=medicine_update module=service status=ok medicine_id={} doses_per_day={} stock_qty={}",
            updated.id,
            updated.doses_per_day(),
            updated.stock_qty
        );
        Ok(updated)
    }

    pub fn delete_medicine(&self, id: &str) -> ServiceResult<Medicine> {
        let mut medicines = self.store.load_medicines()?;
        let index = medicines
            .iter()
            .position(|medicine| medicine.id == id)
            .ok_or_else(|| ServiceError::MedicineNotFound(id.to_string()))?;
        let removed = medicines.remove(index);
        self.store.save_medicines(&medicines)?;
        info!(
            "event=medicine_delete module=service status=ok medicine_id={}",
            removed.id
        );
        Ok(removed)
    }

    pub fn get_medicine(&self, id: &str) -> ServiceResult<Option<MedicineSummary>> {
        let members = self.store.load_members()?;
        Ok(self
            .store
            .load_medicines()?
            .into_iter()
            .find(|medicine| medicine.id == id)
            .map(|medicine| summarize(medicine, &members)))
    }

    /// Lists medicines in stored order, filtered by `query`.
    pub fn list_medicines(&self, query: &MedicineListQuery) -> ServiceResult<Vec<MedicineSummary>> {
        let members = self.store.load_members()?;
        let needle = query
            .name_contains
            .as_deref()
            .map(|value| value.trim().to_lowercase())
            .filter(|value| !value.is_empty());

        let items = self
            .store
            .load_medicines()?
            .into_iter()
            .filter(|medicine| {
                query
                    .member_id
                    .as_deref()
                    .map_or(true, |owner| medicine.family_member_id == owner)
            })
            .filter(|medicine| {
                needle
                    .as_deref()
                    .map_or(true, |needle| medicine.name.to_lowercase().contains(needle))
            })
            .map(|medicine| summarize(medicine, &members))
            .collect();
        Ok(items)
    }
}

fn summarize(medicine: Medicine, members: &[Member]) -> MedicineSummary {
    let owner_name = members
        .iter()
        .find(|member| member.id == medicine.family_member_id)
        .map(|member| member.name.clone());
    MedicineSummary {
        medicine,
        owner_name,
    }
}

#[cfg(test)]
mod tests {
    use super::{MedicineListQuery, MedicineService};
    use crate::clock::FixedClock;
    use crate::model::medicine::MedicineDraft;
    use crate::repo::kv_repo::MemoryKeyValueRepository;
    use crate::service::error::ServiceError;
    use crate::service::member_service::MemberService;
    use chrono::NaiveDate;

    fn clock() -> FixedClock {
        FixedClock::at_local(NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(), 9, 0, 0).unwrap()
    }

    fn draft(name: &str) -> MedicineDraft {
        MedicineDraft {
            name: name.to_string(),
            times: vec!["08:00".to_string(), "20:00".to_string()],
            stock_qty: 9,
            ..MedicineDraft::default()
        }
    }

    #[test]
    fn add_requires_existing_member() {
        let repo = MemoryKeyValueRepository::new();
        let service = MedicineService::new(&repo, clock());
        assert!(matches!(
            service.add_medicine("u_missing", draft("Metformin")).unwrap_err(),
            ServiceError::MemberNotFound(_)
        ));
    }

    #[test]
    fn list_filters_by_owner_and_name() {
        let repo = MemoryKeyValueRepository::new();
        let members = MemberService::new(&repo);
        let asha = members.add_member("Asha", "Mother", None).unwrap();
        let ravi = members.add_member("Ravi", "Father", None).unwrap();
        let service = MedicineService::new(&repo, clock());
        service.add_medicine(&asha.id, draft("Metformin")).unwrap();
        service.add_medicine(&asha.id, draft("Vitamin D")).unwrap();
        service.add_medicine(&ravi.id, draft("Metoprolol")).unwrap();

        let asha_only = service
            .list_medicines(&MedicineListQuery {
                member_id: Some(asha.id.clone()),
                name_contains: None,
            })
            .unwrap();
        assert_eq!(asha_only.len(), 2);

        let named = service
            .list_medicines(&MedicineListQuery {
                member_id: None,
                name_contains: Some("MET".to_string()),
            })
            .unwrap();
        let names: Vec<_> = named.iter().map(|item| item.medicine.name.as_str()).collect();
        assert_eq!(names, vec!["Metformin", "Metoprolol"]);
        assert_eq!(named[1].owner_name.as_deref(), Some("Ravi"));
        assert_eq!(named[0].frequency_label(), "Twice daily");
        assert_eq!(named[0].stock_estimate().to_string(), "~4 days remaining");
    }

    #[test]
    fn update_keeps_identity_and_replaces_fields() {
        let repo = MemoryKeyValueRepository::new();
        let member = MemberService::new(&repo).add_member("Asha", "Mother", None).unwrap();
        let service = MedicineService::new(&repo, clock());
        let created = service.add_medicine(&member.id, draft("Metformin")).unwrap();

        let mut edit = created.to_draft();
        edit.times = vec!["07:30".to_string()];
        edit.notes = "after food".to_string();
        let updated = service.update_medicine(&created.id, edit).unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.times, vec!["07:30"]);
        assert_eq!(
            service.get_medicine(&created.id).unwrap().unwrap().medicine,
            updated
        );
    }

    #[test]
    fn delete_of_unknown_medicine_is_a_lookup_failure() {
        let repo = MemoryKeyValueRepository::new();
        let service = MedicineService::new(&repo, clock());
        assert!(matches!(
            service.delete_medicine("m_missing").unwrap_err(),
            ServiceError::MedicineNotFound(_)
        ));
    }
}
