//! Family schedule event document.

use crate::auth::FamilyId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a schedule event.
pub type EventId = Uuid;

/// Schedule event as persisted in the `events` collection.
///
/// Directly-scoped: carries `familyId` itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEvent {
    pub id: EventId,
    pub family_id: FamilyId,
    pub created_by: String,
    pub title: String,
    pub start_time: i64,
    pub end_time: i64,
    pub category: String,
    pub created_at: i64,
}

/// Caller-supplied fields for creating a schedule event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEventDraft {
    pub family_id: FamilyId,
    pub created_by: String,
    pub title: String,
    pub start_time: i64,
    pub end_time: i64,
    pub category: String,
}

impl ScheduleEvent {
    /// Materializes a draft into a persistable schedule event.
    pub fn from_draft(draft: ScheduleEventDraft, now_epoch_ms: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            family_id: draft.family_id,
            created_by: draft.created_by,
            title: draft.title,
            start_time: draft.start_time,
            end_time: draft.end_time,
            category: draft.category,
            created_at: now_epoch_ms,
        }
    }
}
