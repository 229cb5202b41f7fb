//! Family schedule use-case service.
//!
//! Directly-scoped like `children`: records carry `familyId` themselves.

use crate::auth::{resolve_principal, IdentityToken};
use crate::clock::Clock;
use crate::model::schedule::{EventId, ScheduleEvent, ScheduleEventDraft};
use crate::policy::{Collection, Operation, OwnershipGuard};
use crate::schema::SchemaValidator;
use crate::service::{from_body, retry_conflicts, to_body, RetryPolicy, ServiceError, ServiceResult};
use crate::store::{DocumentStore, WriteBatch};
use log::info;
use serde_json::json;

/// Guarded service for the `events` collection.
pub struct ScheduleService<S: DocumentStore, C: Clock> {
    store: S,
    validator: SchemaValidator,
    clock: C,
    retry: RetryPolicy,
}

impl<S: DocumentStore, C: Clock> ScheduleService<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self {
            store,
            validator: SchemaValidator::default(),
            clock,
            retry: RetryPolicy::default(),
        }
    }

    fn guard(&self) -> OwnershipGuard<'_, S> {
        OwnershipGuard::new(&self.store)
    }

    /// Creates a schedule event owned by the caller's family.
    pub fn create_event(
        &self,
        token: &IdentityToken,
        draft: ScheduleEventDraft,
    ) -> ServiceResult<ScheduleEvent> {
        let principal = resolve_principal(token)?;
        let event = ScheduleEvent::from_draft(draft, self.clock.now_epoch_ms());
        let key = event.id.to_string();
        let payload = to_body(&event)?;

        self.validator.validate(Collection::Events, &key, &payload)?;
        self.guard().authorize(
            Some(&principal),
            Operation::Create,
            Collection::Events,
            &key,
            None,
            Some(&payload),
        )?;
        self.store.put_new(Collection::Events, &key, payload)?;

        info!(
            "event=event_create module=service status=ok family={} schedule_event={key}",
            principal.family_id()
        );
        Ok(event)
    }

    /// Lists the caller's family's events, newest first.
    pub fn list_events(&self, token: &IdentityToken) -> ServiceResult<Vec<ScheduleEvent>> {
        let principal = resolve_principal(token)?;
        let documents = self.store.query(
            Collection::Events,
            &[("familyId", json!(principal.family_id().as_str()))],
        )?;
        documents.iter().map(from_body).collect()
    }

    /// Deletes one schedule event.
    pub fn delete_event(&self, token: &IdentityToken, event_id: EventId) -> ServiceResult<()> {
        let principal = resolve_principal(token)?;
        let key = event_id.to_string();

        retry_conflicts(&self.retry, || {
            let document = self
                .store
                .get(Collection::Events, &key)?
                .ok_or_else(|| ServiceError::NotFound(format!("events/{key}")))?;

            self.guard().authorize(
                Some(&principal),
                Operation::Delete,
                Collection::Events,
                &key,
                Some(&document.body),
                None,
            )?;
            self.store.commit(WriteBatch::new().delete(
                Collection::Events,
                key.clone(),
                document.version,
            ))?;
            Ok(())
        })
    }
}
