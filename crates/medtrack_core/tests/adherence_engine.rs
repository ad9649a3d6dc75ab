use chrono::NaiveDate;
use medtrack_core::db::open_db_in_memory;
use medtrack_core::{
    AdherenceService, FixedClock, Medicine, MedicineDraft, MedicineService, MemberService,
    ServiceError, SlotKey, SlotState, SqliteKeyValueRepository,
};

fn june(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
}

fn clock_on(day: u32, hour: u32, minute: u32) -> FixedClock {
    FixedClock::at_local(june(day), hour, minute, 0).unwrap()
}

fn seed_medicine(
    repo: SqliteKeyValueRepository<'_>,
    clock: &FixedClock,
    times: &[&str],
    stock_qty: u32,
) -> Medicine {
    let member = MemberService::new(repo)
        .add_member("Asha", "Mother", None)
        .unwrap();
    let draft = MedicineDraft {
        name: "Metformin".to_string(),
        dosage: "500mg".to_string(),
        times: times.iter().map(|t| t.to_string()).collect(),
        stock_qty,
        ..MedicineDraft::default()
    };
    MedicineService::new(repo, clock)
        .add_medicine(&member.id, draft)
        .unwrap()
}

fn stock_of(repo: SqliteKeyValueRepository<'_>, clock: &FixedClock, id: &str) -> u32 {
    MedicineService::new(repo, clock)
        .get_medicine(id)
        .unwrap()
        .unwrap()
        .medicine
        .stock_qty
}

#[test]
fn take_then_undo_restores_stock_and_pending() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKeyValueRepository::new(&conn);
    let clock = clock_on(10, 8, 2);
    let medicine = seed_medicine(repo, &clock, &["08:00", "20:00"], 10);
    let service = AdherenceService::new(repo, &clock);

    let event = service.mark_taken(&medicine.id, "08:00").unwrap();
    assert!(event.taken);
    assert_eq!(event.date, june(10));
    assert_eq!(event.family_member_id, medicine.family_member_id);
    assert_eq!(stock_of(repo, &clock, &medicine.id), 9);

    let slot = SlotKey::new(medicine.id.clone(), june(10), "08:00");
    assert_eq!(service.slot_state(&slot).unwrap(), SlotState::Taken);

    let undone = service.undo(&medicine.id, "08:00").unwrap().unwrap();
    assert_eq!(undone.id, event.id);
    assert_eq!(stock_of(repo, &clock, &medicine.id), 10);
    assert_eq!(service.slot_state(&slot).unwrap(), SlotState::Pending);
}

#[test]
fn take_at_zero_stock_stays_zero_and_undo_adds_one() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKeyValueRepository::new(&conn);
    let clock = clock_on(10, 8, 0);
    let medicine = seed_medicine(repo, &clock, &["08:00"], 0);
    let service = AdherenceService::new(repo, &clock);

    service.mark_taken(&medicine.id, "08:00").unwrap();
    assert_eq!(stock_of(repo, &clock, &medicine.id), 0);

    service.undo(&medicine.id, "08:00").unwrap();
    assert_eq!(stock_of(repo, &clock, &medicine.id), 1);
}

#[test]
fn skip_records_outcome_without_touching_stock() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKeyValueRepository::new(&conn);
    let clock = clock_on(10, 20, 5);
    let medicine = seed_medicine(repo, &clock, &["08:00", "20:00"], 4);
    let service = AdherenceService::new(repo, &clock);

    let event = service.mark_skipped(&medicine.id, "20:00").unwrap();
    assert!(!event.taken);
    assert_eq!(stock_of(repo, &clock, &medicine.id), 4);

    service.undo(&medicine.id, "20:00").unwrap();
    assert_eq!(stock_of(repo, &clock, &medicine.id), 4);
}

#[test]
fn resolved_slot_rejects_second_outcome() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKeyValueRepository::new(&conn);
    let clock = clock_on(10, 8, 0);
    let medicine = seed_medicine(repo, &clock, &["08:00"], 5);
    let service = AdherenceService::new(repo, &clock);

    service.mark_skipped(&medicine.id, "08:00").unwrap();
    let err = service.mark_taken(&medicine.id, "08:00").unwrap_err();
    match err {
        ServiceError::SlotAlreadyResolved { state, .. } => assert_eq!(state, SlotState::Skipped),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(stock_of(repo, &clock, &medicine.id), 5);
}

#[test]
fn undo_of_pending_slot_is_a_no_op() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKeyValueRepository::new(&conn);
    let clock = clock_on(10, 8, 0);
    let medicine = seed_medicine(repo, &clock, &["08:00"], 5);
    let service = AdherenceService::new(repo, &clock);

    assert!(service.undo(&medicine.id, "08:00").unwrap().is_none());
    assert_eq!(stock_of(repo, &clock, &medicine.id), 5);
}

#[test]
fn unknown_or_unscheduled_slots_are_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKeyValueRepository::new(&conn);
    let clock = clock_on(10, 8, 0);
    let medicine = seed_medicine(repo, &clock, &["08:00"], 5);
    let service = AdherenceService::new(repo, &clock);

    assert!(matches!(
        service.mark_taken("m_missing", "08:00").unwrap_err(),
        ServiceError::MedicineNotFound(_)
    ));
    assert!(matches!(
        service.mark_taken(&medicine.id, "09:00").unwrap_err(),
        ServiceError::SlotNotScheduled(_)
    ));
    assert_eq!(stock_of(repo, &clock, &medicine.id), 5);
}

#[test]
fn slots_outside_the_date_window_are_not_scheduled() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKeyValueRepository::new(&conn);
    let clock = clock_on(10, 8, 0);
    let medicine = seed_medicine(repo, &clock, &["08:00"], 5);

    let medicines = MedicineService::new(repo, &clock);
    let mut draft = medicine.to_draft();
    draft.start_date = Some("2024-06-12".to_string());
    draft.end_date = Some("2024-06-20".to_string());
    medicines.update_medicine(&medicine.id, draft).unwrap();

    let service = AdherenceService::new(repo, &clock);
    let before = SlotKey::new(medicine.id.clone(), june(11), "08:00");
    assert!(matches!(
        service.record(&before, true).unwrap_err(),
        ServiceError::SlotNotScheduled(_)
    ));

    let last_day = SlotKey::new(medicine.id.clone(), june(20), "08:00");
    service.record(&last_day, true).unwrap();
    assert_eq!(stock_of(repo, &clock, &medicine.id), 4);
}

#[test]
fn undo_after_medicine_delete_removes_event_only() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKeyValueRepository::new(&conn);
    let clock = clock_on(10, 8, 0);
    let medicine = seed_medicine(repo, &clock, &["08:00"], 5);
    let service = AdherenceService::new(repo, &clock);

    service.mark_taken(&medicine.id, "08:00").unwrap();
    MedicineService::new(repo, &clock)
        .delete_medicine(&medicine.id)
        .unwrap();

    let removed = service.undo(&medicine.id, "08:00").unwrap();
    assert!(removed.is_some());
    let slot = SlotKey::new(medicine.id.clone(), june(10), "08:00");
    assert_eq!(service.slot_state(&slot).unwrap(), SlotState::Pending);
}

#[test]
fn today_lists_doses_in_medicine_then_time_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKeyValueRepository::new(&conn);
    let clock = clock_on(10, 8, 0);
    let first = seed_medicine(repo, &clock, &["20:00", "08:00"], 5);

    let second_draft = MedicineDraft {
        name: "Vitamin D".to_string(),
        times: vec!["13:00".to_string()],
        notes: "with lunch".to_string(),
        ..MedicineDraft::default()
    };
    let second = MedicineService::new(repo, &clock)
        .add_medicine(&first.family_member_id, second_draft)
        .unwrap();

    let service = AdherenceService::new(repo, &clock);
    service.mark_taken(&first.id, "08:00").unwrap();

    let doses = service.today(&first.family_member_id).unwrap();
    let rows: Vec<_> = doses
        .iter()
        .map(|dose| (dose.slot.medicine_id.as_str(), dose.slot.scheduled_time.as_str(), dose.state))
        .collect();
    assert_eq!(
        rows,
        vec![
            (first.id.as_str(), "20:00", SlotState::Pending),
            (first.id.as_str(), "08:00", SlotState::Taken),
            (second.id.as_str(), "13:00", SlotState::Pending),
        ]
    );
    assert_eq!(doses[2].notes, "with lunch");
}

#[test]
fn next_local_day_starts_fresh_slots() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKeyValueRepository::new(&conn);
    let clock = clock_on(10, 23, 59);
    let medicine = seed_medicine(repo, &clock, &["08:00"], 5);
    let service = AdherenceService::new(repo, &clock);

    service.mark_taken(&medicine.id, "08:00").unwrap();
    clock.advance(chrono::Duration::minutes(2));
    assert_eq!(
        service.today(&medicine.family_member_id).unwrap()[0].state,
        SlotState::Pending
    );
    service.mark_taken(&medicine.id, "08:00").unwrap();
    assert_eq!(stock_of(repo, &clock, &medicine.id), 3);
}
