use bravepath_core::db::open_db_in_memory;
use bravepath_core::store::SqliteDocumentStore;
use bravepath_core::{
    ChildDraft, ChildService, Collection, FixedClock, IdentityToken, ScheduleService,
    SchemaValidator, ServiceError, ValidationLimits,
};
use serde_json::json;

const NOW: i64 = 1_700_000_000_000;

fn child_draft(age: i64) -> ChildDraft {
    serde_json::from_value(json!({
        "familyId": "family_u1",
        "name": "Mia",
        "age": age,
        "diagnosis": "adhd",
        "strengths": ["music"],
        "challenges": ["focus"]
    }))
    .unwrap()
}

fn age_fault(err: &ServiceError) -> bool {
    match err {
        ServiceError::Validation(validation) => {
            validation.faults.iter().any(|fault| fault.field == "age")
        }
        _ => false,
    }
}

#[test]
fn child_age_within_bounds_is_accepted() {
    let conn = open_db_in_memory().unwrap();
    let service = ChildService::new(SqliteDocumentStore::new(&conn), FixedClock::new(NOW));

    let child = service
        .create_child(&IdentityToken::signed_in("u1"), child_draft(8))
        .unwrap();
    assert_eq!(child.age, 8);
}

#[test]
fn child_age_out_of_bounds_fails_validation() {
    let conn = open_db_in_memory().unwrap();
    let service = ChildService::new(SqliteDocumentStore::new(&conn), FixedClock::new(NOW));
    let token = IdentityToken::signed_in("u1");

    for age in [-5, 0, 26, 30] {
        let err = service.create_child(&token, child_draft(age)).unwrap_err();
        assert!(age_fault(&err), "age {age} should fail on the age field");
    }
}

#[test]
fn age_ceiling_is_configuration_not_a_constant() {
    let conn = open_db_in_memory().unwrap();
    let validator = SchemaValidator::new(ValidationLimits {
        min_child_age: 1,
        max_child_age: 30,
    });
    let service = ChildService::new(SqliteDocumentStore::new(&conn), FixedClock::new(NOW))
        .with_validator(validator);

    let child = service
        .create_child(&IdentityToken::signed_in("u1"), child_draft(30))
        .unwrap();
    assert_eq!(child.age, 30);
}

#[test]
fn adventure_win_type_must_be_in_the_closed_enum() {
    let validator = SchemaValidator::default();
    let adventure = |win_type: &str| {
        json!({
            "childId": "c1",
            "skillId": "s1",
            "text": "kept trying",
            "winType": win_type
        })
    };

    assert!(validator
        .validate(Collection::Adventures, "a1", &adventure("made-progress"))
        .is_ok());

    let err = validator
        .validate(Collection::Adventures, "a1", &adventure("total-failure"))
        .unwrap_err();
    assert!(err.faults.iter().any(|fault| fault.field == "winType"));
}

#[test]
fn event_end_before_start_fails_validation() {
    let conn = open_db_in_memory().unwrap();
    let service = ScheduleService::new(SqliteDocumentStore::new(&conn), FixedClock::new(NOW));
    let token = IdentityToken::signed_in("u1");

    let draft = |start: i64, end: i64| {
        serde_json::from_value(json!({
            "familyId": "family_u1",
            "createdBy": "u1",
            "title": "swim class",
            "startTime": start,
            "endTime": end,
            "category": "sports"
        }))
        .unwrap()
    };

    let event = service.create_event(&token, draft(NOW, NOW + 3_600_000)).unwrap();
    assert_eq!(event.start_time, NOW);

    let err = service.create_event(&token, draft(NOW, NOW - 1)).unwrap_err();
    match err {
        ServiceError::Validation(validation) => {
            assert!(validation.faults.iter().any(|fault| fault.field == "endTime"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn user_profile_uid_must_equal_document_key() {
    let validator = SchemaValidator::default();
    let profile = json!({
        "uid": "u1",
        "email": "pat@example.com",
        "firstName": "Pat",
        "lastName": "Lee",
        "createdAt": NOW
    });

    assert!(validator.validate(Collection::Users, "u1", &profile).is_ok());

    let err = validator
        .validate(Collection::Users, "someone-else", &profile)
        .unwrap_err();
    assert!(err.faults.iter().any(|fault| fault.field == "uid"));
}

#[test]
fn validation_reports_all_offending_fields_at_once() {
    let validator = SchemaValidator::default();
    let err = validator
        .validate(
            Collection::Children,
            "c1",
            &json!({"name": "Mia", "age": 99}),
        )
        .unwrap_err();

    let fields: Vec<&str> = err.faults.iter().map(|fault| fault.field.as_str()).collect();
    for expected in ["age", "diagnosis", "familyId", "strengths", "challenges"] {
        assert!(fields.contains(&expected), "missing fault for {expected}");
    }
}
