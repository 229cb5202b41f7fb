//! Structural validation rules, one row per collection.
//!
//! # Responsibility
//! - Check candidate payloads against required fields and value constraints
//!   before any write is attempted.
//! - Report every offending field, not just the first.
//!
//! # Invariants
//! - Validation is purely structural; it knows nothing about the caller.
//!   Ownership is the guard's job.
//! - Rules run against the JSON document shape, so the same table holds no
//!   matter which store executes the write.

use crate::model::adventure::{parse_win_type, supported_win_type_strings};
use crate::policy::Collection;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

// Intentionally loose: the auth provider has already verified the address,
// this only catches obviously broken profile payloads.
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex"));

/// Configurable numeric bounds used by the rules table.
///
/// The child age ceiling is configuration, not a hard-coded constant: the
/// product forms and the rule suite disagree on the exact upper bound, so the
/// deployment decides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationLimits {
    pub min_child_age: i64,
    pub max_child_age: i64,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            min_child_age: 1,
            max_child_age: 25,
        }
    }
}

/// One offending field with a caller-correctable reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFault {
    pub field: String,
    pub reason: String,
}

impl FieldFault {
    fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }

    fn missing(field: &str) -> Self {
        Self::new(field, "required field is missing")
    }
}

/// Structural validation failure carrying the full offending-field set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub collection: Collection,
    pub faults: Vec<FieldFault>,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "validation failed for collection {}:",
            self.collection.as_str()
        )?;
        for fault in &self.faults {
            write!(f, " [{}: {}]", fault.field, fault.reason)?;
        }
        Ok(())
    }
}

impl Error for ValidationError {}

pub type ValidationResult = Result<(), ValidationError>;

/// Per-collection structural validator.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaValidator {
    limits: ValidationLimits,
}

impl SchemaValidator {
    pub fn new(limits: ValidationLimits) -> Self {
        Self { limits }
    }

    /// Validates a candidate payload for the target collection.
    ///
    /// `doc_key` is the key the document will be stored under; only the
    /// `users` row constrains it (uid must equal the key).
    ///
    /// # Errors
    /// Returns `ValidationError` with one `FieldFault` per offending field.
    pub fn validate(
        &self,
        collection: Collection,
        doc_key: &str,
        payload: &Value,
    ) -> ValidationResult {
        let mut faults = Vec::new();

        if !payload.is_object() {
            faults.push(FieldFault::new("$", "payload must be a JSON object"));
            return Err(ValidationError { collection, faults });
        }

        match collection {
            Collection::Users => self.check_user(doc_key, payload, &mut faults),
            Collection::Children => self.check_child(payload, &mut faults),
            Collection::Journeys => self.check_journey(payload, &mut faults),
            Collection::Adventures => self.check_adventure(payload, &mut faults),
            Collection::Events => self.check_event(payload, &mut faults),
            Collection::AiStories => self.check_story(payload, &mut faults),
        }

        if faults.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { collection, faults })
        }
    }

    fn check_user(&self, doc_key: &str, payload: &Value, faults: &mut Vec<FieldFault>) {
        for field in ["uid", "email", "firstName", "lastName"] {
            require_non_empty_string(payload, field, faults);
        }
        require_integer(payload, "createdAt", faults);

        if let Some(uid) = str_field(payload, "uid") {
            if uid != doc_key {
                faults.push(FieldFault::new("uid", "uid must equal the document key"));
            }
        }
        if let Some(email) = str_field(payload, "email") {
            if !EMAIL_RE.is_match(email) {
                faults.push(FieldFault::new("email", "email format is invalid"));
            }
        }
    }

    fn check_child(&self, payload: &Value, faults: &mut Vec<FieldFault>) {
        for field in ["name", "diagnosis", "familyId"] {
            require_non_empty_string(payload, field, faults);
        }
        for field in ["strengths", "challenges"] {
            if payload.get(field).map_or(true, |value| !value.is_array()) {
                faults.push(FieldFault::new(field, "must be an array of strings"));
            }
        }
        match payload.get("age").and_then(Value::as_i64) {
            None => faults.push(FieldFault::new("age", "must be an integer")),
            Some(age) => {
                if age < self.limits.min_child_age || age > self.limits.max_child_age {
                    faults.push(FieldFault::new(
                        "age",
                        format!(
                            "must be between {} and {}",
                            self.limits.min_child_age, self.limits.max_child_age
                        ),
                    ));
                }
            }
        }
    }

    fn check_journey(&self, payload: &Value, faults: &mut Vec<FieldFault>) {
        require_non_empty_string(payload, "childId", faults);

        let Some(skill_data) = payload.get("skillData") else {
            faults.push(FieldFault::missing("skillData"));
            return;
        };
        if !skill_data.is_object() {
            faults.push(FieldFault::new("skillData", "must be an object"));
            return;
        }
        for field in ["id", "name"] {
            if str_field(skill_data, field).map_or(true, str::is_empty) {
                faults.push(FieldFault::new(
                    format!("skillData.{field}"),
                    "must be a non-empty string",
                ));
            }
        }
    }

    fn check_adventure(&self, payload: &Value, faults: &mut Vec<FieldFault>) {
        for field in ["childId", "skillId", "text"] {
            require_non_empty_string(payload, field, faults);
        }
        match str_field(payload, "winType") {
            None => faults.push(FieldFault::missing("winType")),
            Some(value) => {
                if parse_win_type(value).is_err() {
                    faults.push(FieldFault::new(
                        "winType",
                        format!("must be one of {}", supported_win_type_strings().join(", ")),
                    ));
                }
            }
        }
    }

    fn check_event(&self, payload: &Value, faults: &mut Vec<FieldFault>) {
        for field in ["familyId", "createdBy", "title", "category"] {
            require_non_empty_string(payload, field, faults);
        }
        let start = payload.get("startTime").and_then(Value::as_i64);
        let end = payload.get("endTime").and_then(Value::as_i64);
        if start.is_none() {
            faults.push(FieldFault::new("startTime", "must be an integer"));
        }
        if end.is_none() {
            faults.push(FieldFault::new("endTime", "must be an integer"));
        }
        if let (Some(start), Some(end)) = (start, end) {
            if end < start {
                faults.push(FieldFault::new(
                    "endTime",
                    "must not be earlier than startTime",
                ));
            }
        }
    }

    fn check_story(&self, payload: &Value, faults: &mut Vec<FieldFault>) {
        for field in ["childId", "title", "content"] {
            require_non_empty_string(payload, field, faults);
        }
    }
}

fn str_field<'v>(payload: &'v Value, field: &str) -> Option<&'v str> {
    payload.get(field).and_then(Value::as_str)
}

fn require_non_empty_string(payload: &Value, field: &str, faults: &mut Vec<FieldFault>) {
    match payload.get(field) {
        None => faults.push(FieldFault::missing(field)),
        Some(value) => match value.as_str() {
            Some(text) if !text.is_empty() => {}
            _ => faults.push(FieldFault::new(field, "must be a non-empty string")),
        },
    }
}

fn require_integer(payload: &Value, field: &str, faults: &mut Vec<FieldFault>) {
    if payload.get(field).and_then(Value::as_i64).is_none() {
        faults.push(FieldFault::new(field, "must be an integer"));
    }
}

#[cfg(test)]
mod tests {
    use super::{SchemaValidator, ValidationLimits};
    use crate::policy::Collection;
    use serde_json::json;

    #[test]
    fn reports_every_offending_field() {
        let validator = SchemaValidator::default();
        let err = validator
            .validate(Collection::Children, "c1", &json!({"name": "Mia"}))
            .unwrap_err();
        let fields: Vec<&str> = err.faults.iter().map(|fault| fault.field.as_str()).collect();
        for expected in ["diagnosis", "familyId", "strengths", "challenges", "age"] {
            assert!(fields.contains(&expected), "missing fault for {expected}");
        }
    }

    #[test]
    fn age_bounds_come_from_limits() {
        let validator = SchemaValidator::new(ValidationLimits {
            min_child_age: 3,
            max_child_age: 10,
        });
        let child = |age: i64| {
            json!({
                "name": "Mia", "age": age, "diagnosis": "none",
                "familyId": "family_u1", "strengths": [], "challenges": []
            })
        };
        assert!(validator.validate(Collection::Children, "c1", &child(3)).is_ok());
        assert!(validator.validate(Collection::Children, "c1", &child(11)).is_err());
    }

    #[test]
    fn user_uid_must_equal_document_key() {
        let validator = SchemaValidator::default();
        let profile = json!({
            "uid": "u1", "email": "p@example.com",
            "firstName": "Pat", "lastName": "Lee", "createdAt": 1
        });
        assert!(validator.validate(Collection::Users, "u1", &profile).is_ok());

        let err = validator
            .validate(Collection::Users, "other", &profile)
            .unwrap_err();
        assert!(err.faults.iter().any(|fault| fault.field == "uid"));
    }

    #[test]
    fn user_email_must_look_like_an_address() {
        let validator = SchemaValidator::default();
        let profile = json!({
            "uid": "u1", "email": "not-an-address",
            "firstName": "Pat", "lastName": "Lee", "createdAt": 1
        });
        let err = validator.validate(Collection::Users, "u1", &profile).unwrap_err();
        assert!(err.faults.iter().any(|fault| fault.field == "email"));
    }

    #[test]
    fn event_end_must_not_precede_start() {
        let validator = SchemaValidator::default();
        let event = |start: i64, end: i64| {
            json!({
                "familyId": "family_u1", "createdBy": "u1", "title": "swim",
                "startTime": start, "endTime": end, "category": "sports"
            })
        };
        assert!(validator.validate(Collection::Events, "e1", &event(10, 10)).is_ok());
        assert!(validator.validate(Collection::Events, "e1", &event(10, 9)).is_err());
    }

    #[test]
    fn non_object_payload_is_rejected_outright() {
        let validator = SchemaValidator::default();
        let err = validator
            .validate(Collection::Adventures, "a1", &json!("just a string"))
            .unwrap_err();
        assert_eq!(err.faults.len(), 1);
        assert_eq!(err.faults[0].field, "$");
    }
}
