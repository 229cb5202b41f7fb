//! Journey use-case service and progress aggregation coordinator.
//!
//! # Responsibility
//! - Start journeys, append adventures, and serve guarded reads for the
//!   transitively-scoped collections (`journeys`, `adventures`, `ai_stories`).
//! - Keep `progress.adventureCount` equal to the number of stored adventures
//!   for each `(childId, skillId)` pair.
//!
//! # Invariants
//! - Appending an adventure and bumping the journey counter commit in one
//!   atomic batch; neither ever applies without the other.
//! - The counter update is a compare-and-swap on the journey version, retried
//!   with bounded exponential backoff on concurrent-writer conflicts.
//! - The adventure's and the counter's timestamps come from one clock read at
//!   operation start.

use crate::auth::{resolve_principal, IdentityToken};
use crate::clock::Clock;
use crate::model::adventure::{Adventure, AdventureDraft};
use crate::model::child::ChildId;
use crate::model::journey::{Journey, Progress, SkillForm};
use crate::model::story::{AiStory, StoryDraft};
use crate::policy::{Collection, Operation, OwnershipGuard};
use crate::schema::SchemaValidator;
use crate::service::{
    from_body, retry_conflicts, to_body, RetryPolicy, ServiceError, ServiceResult,
};
use crate::store::{DocumentStore, WriteBatch};
use log::{info, warn};
use serde_json::json;

/// Result of one successful log operation: the new adventure plus the
/// progress snapshot it produced.
#[derive(Debug, Clone, PartialEq)]
pub struct AdventureLogged {
    pub adventure: Adventure,
    pub progress: Progress,
}

/// Guarded service for journeys, adventures, and generated stories.
pub struct JourneyService<S: DocumentStore, C: Clock> {
    store: S,
    validator: SchemaValidator,
    clock: C,
    retry: RetryPolicy,
}

impl<S: DocumentStore, C: Clock> JourneyService<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self {
            store,
            validator: SchemaValidator::default(),
            clock,
            retry: RetryPolicy::default(),
        }
    }

    /// Overrides the conflict retry settings.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn guard(&self) -> OwnershipGuard<'_, S> {
        OwnershipGuard::new(&self.store)
    }

    /// Starts a journey for `(child_id, skill)` with a zeroed counter.
    ///
    /// # Errors
    /// - `AlreadyExists` when the pair already has a journey.
    pub fn create_journey(
        &self,
        token: &IdentityToken,
        child_id: ChildId,
        skill: SkillForm,
    ) -> ServiceResult<Journey> {
        let principal = resolve_principal(token)?;
        let journey = Journey::start(child_id, skill, self.clock.now_epoch_ms());
        let key = journey.key();
        let payload = to_body(&journey)?;

        self.validator.validate(Collection::Journeys, &key, &payload)?;
        self.guard().authorize(
            Some(&principal),
            Operation::Create,
            Collection::Journeys,
            &key,
            None,
            Some(&payload),
        )?;
        self.store.put_new(Collection::Journeys, &key, payload)?;

        info!(
            "event=journey_create module=service status=ok family={} child={child_id} skill={}",
            principal.family_id(),
            journey.skill_data.id
        );
        Ok(journey)
    }

    /// Appends one adventure and advances the journey's progress counter.
    ///
    /// The append and the counter increment commit atomically; a concurrent
    /// writer of the same journey triggers a bounded retry with exponential
    /// backoff before `ConflictRetryExhausted` is surfaced.
    ///
    /// # Errors
    /// - `NotFound` when no journey exists for `(child_id, skill_id)`.
    /// - `Forbidden` when the child belongs to another family.
    pub fn log_adventure(
        &self,
        token: &IdentityToken,
        child_id: ChildId,
        skill_id: &str,
        draft: AdventureDraft,
    ) -> ServiceResult<AdventureLogged> {
        let principal = resolve_principal(token)?;
        let now = self.clock.now_epoch_ms();
        let adventure = Adventure::from_draft(child_id, skill_id, draft, now);
        let adventure_key = adventure.id.to_string();
        let adventure_body = to_body(&adventure)?;

        self.validator
            .validate(Collection::Adventures, &adventure_key, &adventure_body)?;
        self.guard().authorize(
            Some(&principal),
            Operation::Create,
            Collection::Adventures,
            &adventure_key,
            None,
            Some(&adventure_body),
        )?;

        let journey_key = Journey::document_key(child_id, skill_id);
        let result = retry_conflicts(&self.retry, || {
            let journey_doc = self
                .store
                .get(Collection::Journeys, &journey_key)?
                .ok_or_else(|| ServiceError::NotFound(format!("journeys/{journey_key}")))?;

            let mut journey: Journey = from_body(&journey_doc)?;
            journey.progress = Progress {
                adventure_count: journey.progress.adventure_count + 1,
                last_updated: now,
            };

            self.store.commit(
                WriteBatch::new()
                    .insert(
                        Collection::Adventures,
                        adventure_key.clone(),
                        adventure_body.clone(),
                    )
                    .update(
                        Collection::Journeys,
                        journey_key.clone(),
                        journey_doc.version,
                        to_body(&journey)?,
                    ),
            )?;
            Ok(journey.progress)
        });

        match result {
            Ok(progress) => {
                info!(
                    "event=adventure_log module=service status=ok family={} child={child_id} \
                     skill={skill_id} count={}",
                    principal.family_id(),
                    progress.adventure_count
                );
                Ok(AdventureLogged {
                    adventure,
                    progress,
                })
            }
            Err(err) => {
                warn!(
                    "event=adventure_log module=service status=error child={child_id} \
                     skill={skill_id} error={err}"
                );
                Err(err)
            }
        }
    }

    /// Lists a child's journeys, newest first.
    pub fn get_journeys(
        &self,
        token: &IdentityToken,
        child_id: ChildId,
    ) -> ServiceResult<Vec<Journey>> {
        let principal = resolve_principal(token)?;
        self.guard()
            .authorize_child_scope(Some(&principal), &child_id.to_string())?;

        let documents = self.store.query(
            Collection::Journeys,
            &[("childId", json!(child_id.to_string()))],
        )?;
        documents.iter().map(from_body).collect()
    }

    /// Lists one journey's adventures, newest first.
    pub fn get_adventures(
        &self,
        token: &IdentityToken,
        child_id: ChildId,
        skill_id: &str,
    ) -> ServiceResult<Vec<Adventure>> {
        let principal = resolve_principal(token)?;
        self.guard()
            .authorize_child_scope(Some(&principal), &child_id.to_string())?;

        let documents = self.store.query(
            Collection::Adventures,
            &[
                ("childId", json!(child_id.to_string())),
                ("skillId", json!(skill_id)),
            ],
        )?;
        documents.iter().map(from_body).collect()
    }

    /// Saves a generated story for a child.
    pub fn create_story(
        &self,
        token: &IdentityToken,
        child_id: ChildId,
        draft: StoryDraft,
    ) -> ServiceResult<AiStory> {
        let principal = resolve_principal(token)?;
        let story = AiStory::from_draft(child_id, draft, self.clock.now_epoch_ms());
        let key = story.id.to_string();
        let payload = to_body(&story)?;

        self.validator.validate(Collection::AiStories, &key, &payload)?;
        self.guard().authorize(
            Some(&principal),
            Operation::Create,
            Collection::AiStories,
            &key,
            None,
            Some(&payload),
        )?;
        self.store.put_new(Collection::AiStories, &key, payload)?;
        Ok(story)
    }

    /// Lists a child's stories, newest first.
    pub fn get_stories(
        &self,
        token: &IdentityToken,
        child_id: ChildId,
    ) -> ServiceResult<Vec<AiStory>> {
        let principal = resolve_principal(token)?;
        self.guard()
            .authorize_child_scope(Some(&principal), &child_id.to_string())?;

        let documents = self.store.query(
            Collection::AiStories,
            &[("childId", json!(child_id.to_string()))],
        )?;
        documents.iter().map(from_body).collect()
    }
}
