//! Ownership guard: the authorization decision procedure.
//!
//! # Responsibility
//! - Decide Allow/Deny for every operation against a family-rooted or
//!   child-rooted collection.
//! - Resolve transitive scope by looking up the referenced child.
//!
//! # Invariants
//! - `decide` is pure: it never touches the store. The store read needed for
//!   transitive scope happens in [`OwnershipGuard`] before delegation.
//! - Structural validation is not this module's job; services run the schema
//!   validator before asking for a write decision.
//! - Denials for foreign-family records render identically to not-found.

use crate::auth::Principal;
use crate::policy::scope::{scope_of, Collection, CollectionScope};
use crate::store::{DocumentStore, StoreError};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Operation classes the policy distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Create,
    Update,
    Delete,
}

/// Outcome of the decision procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

/// Why a request was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// No resolvable principal.
    Unauthenticated,
    /// No family relationship with the target record.
    Forbidden,
    /// Transitive scope could not be resolved: the referenced child is absent.
    MissingChild,
}

/// One authorization question, fully materialized.
///
/// `owning_child` is the resolved child document for transitively-scoped
/// targets; callers that already deserialized it can hand it in directly.
#[derive(Debug, Clone, Copy)]
pub struct AccessRequest<'a> {
    pub principal: Option<&'a Principal>,
    pub operation: Operation,
    pub collection: Collection,
    pub document_key: &'a str,
    pub existing: Option<&'a Value>,
    pub payload: Option<&'a Value>,
    pub owning_child: Option<&'a Value>,
}

fn str_field<'v>(doc: &'v Value, field: &str) -> Option<&'v str> {
    doc.get(field).and_then(Value::as_str)
}

/// Pure decision function over (principal, operation, collection, documents).
///
/// Enforceable identically from a server-side gatekeeper or replicated into a
/// store's native rule language; nothing here depends on where it runs.
pub fn decide(request: &AccessRequest<'_>) -> Decision {
    let Some(principal) = request.principal else {
        return Decision::Deny(DenyReason::Unauthenticated);
    };

    if request.collection.is_append_only()
        && matches!(request.operation, Operation::Update | Operation::Delete)
    {
        return Decision::Deny(DenyReason::Forbidden);
    }

    match scope_of(request.collection) {
        CollectionScope::SelfScoped => decide_self_scoped(principal, request),
        CollectionScope::Direct => decide_direct(principal, request),
        CollectionScope::Transitive => decide_transitive(principal, request),
    }
}

fn decide_self_scoped(principal: &Principal, request: &AccessRequest<'_>) -> Decision {
    if request.document_key != principal.uid() {
        return Decision::Deny(DenyReason::Forbidden);
    }
    if request.operation == Operation::Create {
        // The stored uid field must match the key, or another account could be
        // impersonated through a mismatched payload.
        let payload_uid = request.payload.and_then(|payload| str_field(payload, "uid"));
        if payload_uid != Some(request.document_key) {
            return Decision::Deny(DenyReason::Forbidden);
        }
    }
    Decision::Allow
}

fn decide_direct(principal: &Principal, request: &AccessRequest<'_>) -> Decision {
    let family = principal.family_id();

    match request.operation {
        Operation::Create => {
            let payload_family = request
                .payload
                .and_then(|payload| str_field(payload, "familyId"));
            if payload_family != Some(family.as_str()) {
                return Decision::Deny(DenyReason::Forbidden);
            }
            Decision::Allow
        }
        Operation::Read | Operation::Update | Operation::Delete => {
            let existing_family = request
                .existing
                .and_then(|existing| str_field(existing, "familyId"));
            if existing_family != Some(family.as_str()) {
                return Decision::Deny(DenyReason::Forbidden);
            }
            if request.operation == Operation::Update {
                // A write may not move a record into another family.
                if let Some(payload_family) =
                    request.payload.and_then(|payload| str_field(payload, "familyId"))
                {
                    if payload_family != family.as_str() {
                        return Decision::Deny(DenyReason::Forbidden);
                    }
                }
            }
            Decision::Allow
        }
    }
}

fn decide_transitive(principal: &Principal, request: &AccessRequest<'_>) -> Decision {
    let Some(child) = request.owning_child else {
        return Decision::Deny(DenyReason::MissingChild);
    };
    let family = principal.family_id();
    if str_field(child, "familyId") != Some(family.as_str()) {
        return Decision::Deny(DenyReason::Forbidden);
    }
    Decision::Allow
}

/// Guard failures surfaced to services.
#[derive(Debug)]
pub enum GuardError {
    Unauthenticated,
    Forbidden,
    /// The referenced child does not exist.
    ChildNotFound,
    Store(StoreError),
}

impl Display for GuardError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "no authenticated identity present"),
            // Same wording for both: existence of foreign records must not leak.
            Self::Forbidden | Self::ChildNotFound => {
                write!(f, "requested record was not found or is not accessible")
            }
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for GuardError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for GuardError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Decision point wrapper that resolves transitive scope from the store.
pub struct OwnershipGuard<'s, S: DocumentStore> {
    store: &'s S,
}

impl<'s, S: DocumentStore> OwnershipGuard<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    /// Authorizes one document-level operation.
    ///
    /// For transitively-scoped collections the owning child is looked up by
    /// the `childId` of the payload (creates) or the stored document (reads,
    /// updates, deletes).
    ///
    /// # Errors
    /// - `Unauthenticated` when no principal is supplied.
    /// - `ChildNotFound` when a transitive target references an absent child.
    /// - `Forbidden` for every other denial.
    pub fn authorize(
        &self,
        principal: Option<&Principal>,
        operation: Operation,
        collection: Collection,
        document_key: &str,
        existing: Option<&Value>,
        payload: Option<&Value>,
    ) -> Result<(), GuardError> {
        let owning_child = if scope_of(collection) == CollectionScope::Transitive {
            // Deny before the lookup so anonymous callers learn nothing.
            if principal.is_none() {
                return Err(GuardError::Unauthenticated);
            }
            self.resolve_owning_child(operation, existing, payload)?
        } else {
            None
        };

        let request = AccessRequest {
            principal,
            operation,
            collection,
            document_key,
            existing,
            payload,
            owning_child: owning_child.as_ref(),
        };
        match decide(&request) {
            Decision::Allow => Ok(()),
            Decision::Deny(DenyReason::Unauthenticated) => Err(GuardError::Unauthenticated),
            Decision::Deny(DenyReason::Forbidden) => Err(GuardError::Forbidden),
            Decision::Deny(DenyReason::MissingChild) => Err(GuardError::ChildNotFound),
        }
    }

    /// Authorizes access to an entire child scope (journey/adventure queries).
    pub fn authorize_child_scope(
        &self,
        principal: Option<&Principal>,
        child_id: &str,
    ) -> Result<(), GuardError> {
        let Some(principal) = principal else {
            return Err(GuardError::Unauthenticated);
        };
        let child = self
            .store
            .get(Collection::Children, child_id)?
            .ok_or(GuardError::ChildNotFound)?;
        if str_field(&child.body, "familyId") != Some(principal.family_id().as_str()) {
            return Err(GuardError::Forbidden);
        }
        Ok(())
    }

    fn resolve_owning_child(
        &self,
        operation: Operation,
        existing: Option<&Value>,
        payload: Option<&Value>,
    ) -> Result<Option<Value>, GuardError> {
        let source = match operation {
            Operation::Create => payload,
            _ => existing,
        };
        let Some(child_id) = source.and_then(|doc| str_field(doc, "childId")) else {
            // No resolvable scope; indistinguishable from a foreign record.
            return Err(GuardError::Forbidden);
        };
        let child = self
            .store
            .get(Collection::Children, child_id)?
            .ok_or(GuardError::ChildNotFound)?;
        Ok(Some(child.body))
    }
}

#[cfg(test)]
mod tests {
    use super::{decide, AccessRequest, Decision, DenyReason, Operation};
    use crate::auth::{resolve_principal, IdentityToken};
    use crate::policy::scope::Collection;
    use serde_json::json;

    fn request<'a>(
        principal: Option<&'a crate::auth::Principal>,
        operation: Operation,
        collection: Collection,
        document_key: &'a str,
    ) -> AccessRequest<'a> {
        AccessRequest {
            principal,
            operation,
            collection,
            document_key,
            existing: None,
            payload: None,
            owning_child: None,
        }
    }

    #[test]
    fn anonymous_caller_is_denied_everywhere() {
        for collection in crate::policy::scope::ALL_COLLECTIONS {
            let decision = decide(&request(None, Operation::Read, *collection, "any"));
            assert_eq!(decision, Decision::Deny(DenyReason::Unauthenticated));
        }
    }

    #[test]
    fn direct_read_requires_family_match() {
        let principal = resolve_principal(&IdentityToken::signed_in("u1")).unwrap();
        let own = json!({"familyId": "family_u1"});
        let foreign = json!({"familyId": "family_u2"});

        let mut req = request(Some(&principal), Operation::Read, Collection::Children, "c1");
        req.existing = Some(&own);
        assert_eq!(decide(&req), Decision::Allow);

        req.existing = Some(&foreign);
        assert_eq!(decide(&req), Decision::Deny(DenyReason::Forbidden));
    }

    #[test]
    fn direct_update_may_not_change_family() {
        let principal = resolve_principal(&IdentityToken::signed_in("u1")).unwrap();
        let existing = json!({"familyId": "family_u1"});
        let moved = json!({"familyId": "family_u2"});

        let mut req = request(Some(&principal), Operation::Update, Collection::Children, "c1");
        req.existing = Some(&existing);
        req.payload = Some(&moved);
        assert_eq!(decide(&req), Decision::Deny(DenyReason::Forbidden));
    }

    #[test]
    fn transitive_decision_follows_owning_child() {
        let principal = resolve_principal(&IdentityToken::signed_in("u1")).unwrap();
        let own_child = json!({"id": "x", "familyId": "family_u1"});
        let foreign_child = json!({"id": "x", "familyId": "family_u2"});

        let mut req = request(Some(&principal), Operation::Read, Collection::Journeys, "x_s");
        req.owning_child = Some(&own_child);
        assert_eq!(decide(&req), Decision::Allow);

        req.owning_child = Some(&foreign_child);
        assert_eq!(decide(&req), Decision::Deny(DenyReason::Forbidden));

        req.owning_child = None;
        assert_eq!(decide(&req), Decision::Deny(DenyReason::MissingChild));
    }

    #[test]
    fn adventures_reject_update_and_delete_even_for_owner() {
        let principal = resolve_principal(&IdentityToken::signed_in("u1")).unwrap();
        let own_child = json!({"id": "x", "familyId": "family_u1"});

        for operation in [Operation::Update, Operation::Delete] {
            let mut req = request(Some(&principal), operation, Collection::Adventures, "a1");
            req.owning_child = Some(&own_child);
            assert_eq!(decide(&req), Decision::Deny(DenyReason::Forbidden));
        }
    }

    #[test]
    fn self_scope_requires_key_and_uid_match() {
        let principal = resolve_principal(&IdentityToken::signed_in("u1")).unwrap();

        let mut req = request(Some(&principal), Operation::Read, Collection::Users, "u1");
        assert_eq!(decide(&req), Decision::Allow);

        req.document_key = "u2";
        assert_eq!(decide(&req), Decision::Deny(DenyReason::Forbidden));

        let matching = json!({"uid": "u1"});
        let mismatched = json!({"uid": "u2"});
        let mut create = request(Some(&principal), Operation::Create, Collection::Users, "u1");
        create.payload = Some(&matching);
        assert_eq!(decide(&create), Decision::Allow);
        create.payload = Some(&mismatched);
        assert_eq!(decide(&create), Decision::Deny(DenyReason::Forbidden));
    }
}
