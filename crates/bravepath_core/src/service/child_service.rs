//! Child profile use-case service.
//!
//! # Responsibility
//! - Provide guarded CRUD entry points for the directly-scoped `children`
//!   collection.
//!
//! # Invariants
//! - Every write validates the payload and passes the ownership guard before
//!   the store is touched.
//! - `familyId` never changes after creation.
//! - Deleting a child does not cascade: linked journeys and adventures stay in
//!   the store but become unreachable through the guard.

use crate::auth::{resolve_principal, IdentityToken};
use crate::clock::Clock;
use crate::model::child::{Child, ChildDraft, ChildId, ChildUpdate};
use crate::policy::{Collection, Operation, OwnershipGuard};
use crate::schema::SchemaValidator;
use crate::service::{from_body, retry_conflicts, to_body, RetryPolicy, ServiceError, ServiceResult};
use crate::store::{DocumentStore, WriteBatch};
use log::{info, warn};
use serde_json::json;

/// Guarded CRUD service for child profiles.
pub struct ChildService<S: DocumentStore, C: Clock> {
    store: S,
    validator: SchemaValidator,
    clock: C,
    retry: RetryPolicy,
}

impl<S: DocumentStore, C: Clock> ChildService<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self {
            store,
            validator: SchemaValidator::default(),
            clock,
            retry: RetryPolicy::default(),
        }
    }

    /// Overrides the structural validator (configurable age bounds).
    pub fn with_validator(mut self, validator: SchemaValidator) -> Self {
        self.validator = validator;
        self
    }

    fn guard(&self) -> OwnershipGuard<'_, S> {
        OwnershipGuard::new(&self.store)
    }

    /// Creates a child profile owned by the caller's family.
    ///
    /// # Errors
    /// - `Forbidden` when the draft names a family other than the caller's.
    /// - `Validation` when required fields are missing or the age is out of
    ///   the configured bounds.
    pub fn create_child(&self, token: &IdentityToken, draft: ChildDraft) -> ServiceResult<Child> {
        let principal = resolve_principal(token)?;
        let child = Child::from_draft(draft, self.clock.now_epoch_ms());
        let key = child.id.to_string();
        let payload = to_body(&child)?;

        self.validator.validate(Collection::Children, &key, &payload)?;
        self.guard().authorize(
            Some(&principal),
            Operation::Create,
            Collection::Children,
            &key,
            None,
            Some(&payload),
        )?;
        self.store.put_new(Collection::Children, &key, payload)?;

        info!(
            "event=child_create module=service status=ok family={} child={key}",
            principal.family_id()
        );
        Ok(child)
    }

    /// Reads one child profile by id.
    pub fn get_child(&self, token: &IdentityToken, child_id: ChildId) -> ServiceResult<Child> {
        let principal = resolve_principal(token)?;
        let key = child_id.to_string();
        let document = self
            .store
            .get(Collection::Children, &key)?
            .ok_or_else(|| ServiceError::NotFound(format!("children/{key}")))?;

        self.guard().authorize(
            Some(&principal),
            Operation::Read,
            Collection::Children,
            &key,
            Some(&document.body),
            None,
        )?;
        from_body(&document)
    }

    /// Lists the caller's family's children, newest first.
    pub fn list_children(&self, token: &IdentityToken) -> ServiceResult<Vec<Child>> {
        let principal = resolve_principal(token)?;
        let documents = self.store.query(
            Collection::Children,
            &[("familyId", json!(principal.family_id().as_str()))],
        )?;
        documents.iter().map(from_body).collect()
    }

    /// Applies a partial update to a child profile.
    ///
    /// Retries the single-document write on commit-time conflicts with
    /// another writer of the same profile.
    pub fn update_child(
        &self,
        token: &IdentityToken,
        child_id: ChildId,
        update: ChildUpdate,
    ) -> ServiceResult<Child> {
        let principal = resolve_principal(token)?;
        let key = child_id.to_string();

        let result = retry_conflicts(&self.retry, || {
            let document = self
                .store
                .get(Collection::Children, &key)?
                .ok_or_else(|| ServiceError::NotFound(format!("children/{key}")))?;

            let mut child: Child = from_body(&document)?;
            update.clone().apply_to(&mut child, self.clock.now_epoch_ms());
            let payload = to_body(&child)?;

            self.validator.validate(Collection::Children, &key, &payload)?;
            self.guard().authorize(
                Some(&principal),
                Operation::Update,
                Collection::Children,
                &key,
                Some(&document.body),
                Some(&payload),
            )?;
            self.store.commit(WriteBatch::new().update(
                Collection::Children,
                key.clone(),
                document.version,
                payload,
            ))?;
            Ok(child)
        });

        match &result {
            Ok(_) => info!(
                "event=child_update module=service status=ok family={} child={key}",
                principal.family_id()
            ),
            Err(err) => warn!(
                "event=child_update module=service status=error child={key} error={err}"
            ),
        }
        result
    }

    /// Deletes a child profile. No cascade to linked records.
    pub fn delete_child(&self, token: &IdentityToken, child_id: ChildId) -> ServiceResult<()> {
        let principal = resolve_principal(token)?;
        let key = child_id.to_string();

        let result = retry_conflicts(&self.retry, || {
            let document = self
                .store
                .get(Collection::Children, &key)?
                .ok_or_else(|| ServiceError::NotFound(format!("children/{key}")))?;

            self.guard().authorize(
                Some(&principal),
                Operation::Delete,
                Collection::Children,
                &key,
                Some(&document.body),
                None,
            )?;
            self.store.commit(WriteBatch::new().delete(
                Collection::Children,
                key.clone(),
                document.version,
            ))?;
            Ok(())
        });

        if result.is_ok() {
            info!(
                "event=child_delete module=service status=ok family={} child={key}",
                principal.family_id()
            );
        }
        result
    }
}
