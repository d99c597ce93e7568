//! Patient service integration tests against an in-memory SQLite store.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use hms_core::{
    Database, FixedClock, Gender, Patient, PatientRepository, PatientService, SharedClock,
    ValidationError,
};
use hms_core::error::PatientError;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

const TODAY: (i32, u32, u32) = (2026, 10, 18);

fn clock() -> SharedClock {
    Arc::new(FixedClock::at_date(date(TODAY.0, TODAY.1, TODAY.2)))
}

fn service() -> PatientService<Database> {
    let clock = clock();
    let db = Database::open_in_memory_with_clock(clock.clone()).unwrap();
    PatientService::new(db, clock)
}

fn make_patient(first: &str, last: &str, dob: NaiveDate, gender: Gender) -> Patient {
    Patient::new(first, last, dob, gender)
}

fn assert_views_agree(service: &PatientService<Database>) {
    let cache = service.cache();
    assert!(cache.is_consistent());

    let listed: HashSet<i64> = service.get_all().iter().map(|p| p.patient_id).collect();
    assert_eq!(listed.len(), cache.len());
    for id in &listed {
        assert!(cache.contains(*id));
        assert_eq!(service.get(*id).unwrap().patient_id, *id);
    }
}

#[test]
fn test_ann_lee_scenario() {
    let mut service = service();

    let ann = make_patient("Ann", "Lee", date(2000, 1, 1), Gender::Female);
    let id = service.add(ann).unwrap();
    assert_eq!(id, 1);

    let stored = service.repository_mut().get_by_id(1).unwrap().unwrap();
    assert_eq!(stored.first_name, "Ann");
    assert_eq!(stored.last_name, "Lee");
    assert_eq!(stored.date_of_birth, Some(date(2000, 1, 1)));
    assert_eq!(stored.gender, Some(Gender::Female));

    assert_eq!(service.get_all().len(), 1);
    assert_views_agree(&service);
}

#[test]
fn test_round_trip_preserves_fields() {
    let mut service = service();

    let mut input = make_patient("Maria", "Lopez", date(1985, 7, 4), Gender::Other);
    input.phone = Some("555-0199".into());
    input.email = Some("maria@example.com".into());
    input.address = Some("12 Elm Road".into());
    input.emergency_contact = Some("Luis Lopez".into());
    input.emergency_phone = Some("555-0198".into());
    input.blood_type = Some("B-".into());
    input.created_by = Some(1);

    let id = service.add(input.clone()).unwrap();
    let stored = service.repository_mut().get_by_id(id).unwrap().unwrap();

    assert_eq!(stored.first_name, input.first_name);
    assert_eq!(stored.last_name, input.last_name);
    assert_eq!(stored.date_of_birth, input.date_of_birth);
    assert_eq!(stored.gender, input.gender);
    assert_eq!(stored.phone, input.phone);
    assert_eq!(stored.email, input.email);
    assert_eq!(stored.address, input.address);
    assert_eq!(stored.emergency_contact, input.emergency_contact);
    assert_eq!(stored.emergency_phone, input.emergency_phone);
    assert_eq!(stored.blood_type, input.blood_type);
    assert_eq!(stored.created_by, input.created_by);
    assert!(stored.registration_date.is_some());

    // Cache and store agree on the assigned registration date
    assert_eq!(
        service.get(id).unwrap().registration_date,
        stored.registration_date
    );
}

#[test]
fn test_load_is_idempotent_and_ordered() {
    let mut service = service();
    for (first, last) in [("Zoe", "Park"), ("Bob", "Lee"), ("Ann", "Park"), ("Ann", "Lee")] {
        service
            .add(make_patient(first, last, date(1990, 1, 1), Gender::Female))
            .unwrap();
    }

    service.load();
    let first = service.get_all();
    service.load();
    let second = service.get_all();

    let names = |patients: &[Patient]| -> Vec<String> {
        patients.iter().map(Patient::full_name).collect()
    };
    assert_eq!(names(&first), names(&second));
    assert_eq!(
        first.iter().map(|p| p.patient_id).collect::<Vec<_>>(),
        second.iter().map(|p| p.patient_id).collect::<Vec<_>>()
    );
    assert_eq!(names(&first), vec!["Ann Lee", "Bob Lee", "Ann Park", "Zoe Park"]);
}

#[test]
fn test_update_with_id_zero_fails_validation_without_mutation() {
    let mut service = service();
    service
        .add(make_patient("Ann", "Lee", date(2000, 1, 1), Gender::Female))
        .unwrap();

    let unsaved = make_patient("Ann", "Changed", date(2000, 1, 1), Gender::Female);
    let err = service.update(unsaved).unwrap_err();

    assert!(matches!(
        err,
        PatientError::Validation(ValidationError::MissingPatientId)
    ));
    assert_eq!(service.get(1).unwrap().last_name, "Lee");
    assert_views_agree(&service);
}

#[test]
fn test_filter_by_age_range_is_inclusive() {
    let mut service = service();
    // 17 until tomorrow
    service
        .add(make_patient("Teen", "Young", date(2008, 10, 19), Gender::Male))
        .unwrap();
    // 64 today
    service
        .add(make_patient("Sixty", "Four", date(1962, 10, 18), Gender::Female))
        .unwrap();
    // 65 today
    service
        .add(make_patient("Sixty", "Five", date(1961, 10, 18), Gender::Other))
        .unwrap();

    let adults: Vec<String> = service
        .filter_by_age_range(18, 64)
        .iter()
        .map(Patient::full_name)
        .collect();
    assert_eq!(adults, vec!["Sixty Four"]);
}

#[test]
fn test_search_is_case_insensitive() {
    let mut service = service();
    service
        .add(make_patient("Ann", "Lee", date(2000, 1, 1), Gender::Female))
        .unwrap();
    service
        .add(make_patient("Ann", "Park", date(2000, 1, 1), Gender::Female))
        .unwrap();

    let found: Vec<String> = service.search("lee").iter().map(Patient::full_name).collect();
    assert_eq!(found, vec!["Ann Lee"]);
}

#[test]
fn test_delete_missing_id_leaves_views() {
    let mut service = service();
    service
        .add(make_patient("Ann", "Lee", date(2000, 1, 1), Gender::Female))
        .unwrap();
    let before: Vec<i64> = service.cache().ids();

    assert!(!service.delete(404).unwrap());
    assert_eq!(service.cache().ids(), before);
    assert_views_agree(&service);
}

#[test]
fn test_orphaned_creator_is_rejected_without_mutation() {
    let mut service = service();
    service
        .add(make_patient("Bob", "Adams", date(1970, 3, 3), Gender::Male))
        .unwrap();
    service
        .add(make_patient("Cy", "Young", date(1988, 5, 5), Gender::Other))
        .unwrap();
    let before_ids = service.cache().ids();
    let before: Vec<String> = service.get_all().iter().map(|p| format!("{:?}", p)).collect();

    let mut patient = make_patient("Ann", "Lee", date(2000, 1, 1), Gender::Female);
    patient.created_by = Some(4242);
    let err = service.add(patient).unwrap_err();

    assert!(err.is_storage());
    assert_eq!(service.cache().ids(), before_ids);
    let after: Vec<String> = service.get_all().iter().map(|p| format!("{:?}", p)).collect();
    assert_eq!(after, before);
    assert_views_agree(&service);
}

#[test]
fn test_age_of_exact_birthday() {
    let service = service();
    let patient = make_patient("Bday", "Today", date(1996, 10, 18), Gender::Male);
    assert_eq!(service.age_of(&patient), 30);

    let mut unknown = patient.clone();
    unknown.date_of_birth = None;
    assert_eq!(service.age_of(&unknown), 0);
}

#[test]
fn test_get_all_returns_detached_copy() {
    let mut service = service();
    service
        .add(make_patient("Ann", "Lee", date(2000, 1, 1), Gender::Female))
        .unwrap();

    let mut copy = service.get_all();
    copy[0].first_name = "Mutated".into();
    copy.push(make_patient("Extra", "Row", date(2000, 1, 1), Gender::Male));

    assert_eq!(service.len(), 1);
    assert_eq!(service.get_all()[0].first_name, "Ann");
}
