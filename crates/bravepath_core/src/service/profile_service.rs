//! Account profile use-case service.
//!
//! # Invariants
//! - Profiles are self-scoped: the document key, the stored `uid`, and the
//!   caller's uid all match or the operation is denied.
//! - The signup write happens once; profiles are never deleted.

use crate::auth::{resolve_principal, IdentityToken};
use crate::clock::Clock;
use crate::model::user::{UserDraft, UserProfile};
use crate::policy::{Collection, Operation, OwnershipGuard};
use crate::schema::SchemaValidator;
use crate::service::{from_body, to_body, ServiceError, ServiceResult};
use crate::store::DocumentStore;
use log::info;

/// Guarded service for the `users/{uid}` collection.
pub struct ProfileService<S: DocumentStore, C: Clock> {
    store: S,
    validator: SchemaValidator,
    clock: C,
}

impl<S: DocumentStore, C: Clock> ProfileService<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self {
            store,
            validator: SchemaValidator::default(),
            clock,
        }
    }

    fn guard(&self) -> OwnershipGuard<'_, S> {
        OwnershipGuard::new(&self.store)
    }

    /// One-time signup profile write for the calling principal.
    ///
    /// # Errors
    /// - `AlreadyExists` when the profile was created before.
    pub fn create_profile(
        &self,
        token: &IdentityToken,
        draft: UserDraft,
    ) -> ServiceResult<UserProfile> {
        let principal = resolve_principal(token)?;
        let profile =
            UserProfile::from_draft(principal.uid(), draft, self.clock.now_epoch_ms());
        let payload = to_body(&profile)?;

        self.validator
            .validate(Collection::Users, principal.uid(), &payload)?;
        self.guard().authorize(
            Some(&principal),
            Operation::Create,
            Collection::Users,
            principal.uid(),
            None,
            Some(&payload),
        )?;
        self.store
            .put_new(Collection::Users, principal.uid(), payload)?;

        info!(
            "event=profile_create module=service status=ok family={}",
            principal.family_id()
        );
        Ok(profile)
    }

    /// Reads one profile; only the owner may read their own document.
    pub fn get_profile(&self, token: &IdentityToken, uid: &str) -> ServiceResult<UserProfile> {
        let principal = resolve_principal(token)?;

        // Self-scope needs no stored document to decide, so deny before the read.
        self.guard().authorize(
            Some(&principal),
            Operation::Read,
            Collection::Users,
            uid,
            None,
            None,
        )?;

        let document = self
            .store
            .get(Collection::Users, uid)?
            .ok_or_else(|| ServiceError::NotFound(format!("users/{uid}")))?;
        from_body(&document)
    }
}
