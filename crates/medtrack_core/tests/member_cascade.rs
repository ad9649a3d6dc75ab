use chrono::NaiveDate;
use medtrack_core::db::open_db_in_memory;
use medtrack_core::repo::collections::CollectionStore;
use medtrack_core::{
    AdherenceService, FixedClock, MedicineDraft, MedicineListQuery, MedicineService,
    MemberService, ServiceError, SqliteKeyValueRepository,
};

fn draft(name: &str) -> MedicineDraft {
    MedicineDraft {
        name: name.to_string(),
        times: vec!["08:00".to_string()],
        stock_qty: 3,
        ..MedicineDraft::default()
    }
}

#[test]
fn deleting_member_removes_only_their_medicines() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKeyValueRepository::new(&conn);
    let clock = FixedClock::at_local(NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(), 8, 0, 0)
        .unwrap();
    let members = MemberService::new(repo);
    let medicines = MedicineService::new(repo, &clock);

    let asha = members.add_member("Asha", "Mother", Some("62".to_string())).unwrap();
    let ravi = members.add_member("Ravi", "Father", None).unwrap();
    let a1 = medicines.add_medicine(&asha.id, draft("Metformin")).unwrap();
    let a2 = medicines.add_medicine(&asha.id, draft("Vitamin D")).unwrap();
    let r1 = medicines.add_medicine(&ravi.id, draft("Aspirin")).unwrap();

    AdherenceService::new(repo, &clock)
        .mark_taken(&a1.id, "08:00")
        .unwrap();

    let deletion = members.delete_member(&asha.id).unwrap();
    assert_eq!(deletion.member.id, asha.id);
    assert_eq!(deletion.removed_medicine_ids, vec![a1.id.clone(), a2.id.clone()]);

    let remaining = medicines
        .list_medicines(&MedicineListQuery::default())
        .unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].medicine.id, r1.id);
    assert_eq!(members.list_members().unwrap(), vec![ravi]);

    // History of the removed medicines stays in the store.
    let events = CollectionStore::new(repo).load_adherence().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].medicine_id, a1.id);
}

#[test]
fn default_member_is_created_only_for_an_empty_household() {
    let conn = open_db_in_memory().unwrap();
    let members = MemberService::new(SqliteKeyValueRepository::new(&conn));

    let seeded = members.ensure_default_member().unwrap().unwrap();
    assert_eq!((seeded.name.as_str(), seeded.relationship.as_str()), ("Me", "Self"));

    members.delete_member(&seeded.id).unwrap();
    members.add_member("Ravi", "Father", None).unwrap();
    assert!(members.ensure_default_member().unwrap().is_none());
}

#[test]
fn blank_member_name_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let members = MemberService::new(SqliteKeyValueRepository::new(&conn));

    assert!(matches!(
        members.add_member("   ", "Self", None).unwrap_err(),
        ServiceError::Validation(_)
    ));
    assert!(members.list_members().unwrap().is_empty());
}
