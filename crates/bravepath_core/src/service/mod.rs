//! Use-case services over the guarded document store.
//!
//! # Responsibility
//! - Orchestrate principal resolution, validation, authorization, and store
//!   access into caller-facing operations.
//! - Define the single error taxonomy callers see.
//!
//! # Invariants
//! - Every entry point resolves the principal first; an unresolvable identity
//!   denies the operation before anything else happens.
//! - Writes validate before they authorize, and authorize before they touch
//!   the store.
//! - `Forbidden` and `NotFound` render the same text so foreign-tenant record
//!   existence never leaks.

use crate::policy::GuardError;
use crate::schema::ValidationError;
use crate::store::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::thread;
use std::time::Duration;

pub mod child_service;
pub mod journey_service;
pub mod profile_service;
pub mod schedule_service;

pub use child_service::ChildService;
pub use journey_service::JourneyService;
pub use profile_service::ProfileService;
pub use schedule_service::ScheduleService;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Caller-facing error taxonomy. All errors are local to one operation.
#[derive(Debug)]
pub enum ServiceError {
    /// No resolvable principal. Fatal, not retried.
    Unauthenticated,
    /// Ownership check failed. Fatal; rendered like not-found.
    Forbidden,
    /// Structural validation failed; carries the offending fields.
    Validation(ValidationError),
    /// Referenced record (child, journey, ...) is absent.
    NotFound(String),
    /// Create targeted a key that already holds a document.
    AlreadyExists(String),
    /// Concurrent-writer conflict persisted through the bounded retry loop.
    /// Retriable by the caller after a delay.
    ConflictRetryExhausted { attempts: u32 },
    /// Transient store outage; caller may retry with backoff.
    StoreUnavailable(String),
    /// Residual store/transport failure.
    Store(StoreError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "no authenticated identity present"),
            // Same wording on purpose: existence of foreign records must not leak.
            Self::Forbidden | Self::NotFound(_) => {
                write!(f, "requested record was not found or is not accessible")
            }
            Self::Validation(err) => write!(f, "{err}"),
            Self::AlreadyExists(what) => write!(f, "record already exists: {what}"),
            Self::ConflictRetryExhausted { attempts } => write!(
                f,
                "write conflict persisted after {attempts} attempts; retry later"
            ),
            Self::StoreUnavailable(reason) => write!(f, "store unavailable: {reason}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<crate::auth::AuthError> for ServiceError {
    fn from(_: crate::auth::AuthError) -> Self {
        Self::Unauthenticated
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<GuardError> for ServiceError {
    fn from(value: GuardError) -> Self {
        match value {
            GuardError::Unauthenticated => Self::Unauthenticated,
            GuardError::Forbidden => Self::Forbidden,
            GuardError::ChildNotFound => Self::NotFound("child".to_string()),
            GuardError::Store(err) => err.into(),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Unavailable(reason) => Self::StoreUnavailable(reason),
            StoreError::KeyExists { collection, key } => {
                Self::AlreadyExists(format!("{}/{key}", collection.as_str()))
            }
            other => Self::Store(other),
        }
    }
}

/// Bounded retry settings for optimistic-concurrency conflicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_backoff_ms: 10,
        }
    }
}

impl RetryPolicy {
    /// Exponential backoff delay before the next attempt.
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        Duration::from_millis(self.base_backoff_ms.saturating_mul(1 << shift))
    }
}

/// Runs `op` until it stops failing with a commit-time conflict, sleeping the
/// policy's backoff between attempts, then surfaces `ConflictRetryExhausted`.
pub(crate) fn retry_conflicts<T, F>(policy: &RetryPolicy, mut op: F) -> ServiceResult<T>
where
    F: FnMut() -> ServiceResult<T>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op() {
            Err(ServiceError::Store(StoreError::Conflict { .. }))
                if attempt < policy.max_attempts =>
            {
                thread::sleep(policy.backoff_after(attempt));
            }
            Err(ServiceError::Store(StoreError::Conflict { .. })) => {
                return Err(ServiceError::ConflictRetryExhausted { attempts: attempt });
            }
            other => return other,
        }
    }
}

/// Serializes a typed record into a document body.
pub(crate) fn to_body<T: serde::Serialize>(record: &T) -> ServiceResult<serde_json::Value> {
    serde_json::to_value(record)
        .map_err(|err| ServiceError::Store(StoreError::InvalidData(err.to_string())))
}

/// Deserializes a stored document body into a typed record.
pub(crate) fn from_body<T: serde::de::DeserializeOwned>(
    document: &crate::store::Document,
) -> ServiceResult<T> {
    serde_json::from_value(document.body.clone()).map_err(|err| {
        ServiceError::Store(StoreError::InvalidData(format!(
            "document {}/{} does not match its schema: {err}",
            document.collection.as_str(),
            document.key
        )))
    })
}

#[cfg(test)]
mod tests {
    use super::{retry_conflicts, RetryPolicy, ServiceError};
    use crate::policy::Collection;
    use crate::store::StoreError;
    use std::time::Duration;

    fn conflict() -> ServiceError {
        ServiceError::Store(StoreError::Conflict {
            collection: Collection::Journeys,
            key: "k".to_string(),
        })
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_backoff_ms: 10,
        };
        assert_eq!(policy.backoff_after(1), Duration::from_millis(10));
        assert_eq!(policy.backoff_after(2), Duration::from_millis(20));
        assert_eq!(policy.backoff_after(3), Duration::from_millis(40));
    }

    #[test]
    fn retry_stops_after_max_attempts() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_backoff_ms: 0,
        };
        let mut calls = 0;
        let result: Result<(), _> = retry_conflicts(&policy, || {
            calls += 1;
            Err(conflict())
        });
        assert_eq!(calls, 3);
        assert!(matches!(
            result,
            Err(ServiceError::ConflictRetryExhausted { attempts: 3 })
        ));
    }

    #[test]
    fn retry_passes_through_first_success() {
        let policy = RetryPolicy::default();
        let mut calls = 0;
        let result = retry_conflicts(&policy, || {
            calls += 1;
            if calls < 2 {
                Err(conflict())
            } else {
                Ok(calls)
            }
        });
        assert_eq!(result.unwrap(), 2);
    }

    #[test]
    fn retry_does_not_swallow_other_errors() {
        let policy = RetryPolicy::default();
        let result: Result<(), _> = retry_conflicts(&policy, || Err(ServiceError::Forbidden));
        assert!(matches!(result, Err(ServiceError::Forbidden)));
    }

    #[test]
    fn forbidden_and_not_found_render_identically() {
        let forbidden = ServiceError::Forbidden.to_string();
        let not_found = ServiceError::NotFound("child".to_string()).to_string();
        assert_eq!(forbidden, not_found);
    }
}
