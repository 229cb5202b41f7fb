//! Generated story document attached to a child.

use crate::model::child::ChildId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a generated story.
pub type StoryId = Uuid;

/// Story as persisted in the `ai_stories` collection.
///
/// Transitively-scoped: ownership follows `childId`, no `familyId` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiStory {
    pub id: StoryId,
    pub child_id: ChildId,
    pub title: String,
    pub content: String,
    pub created_at: i64,
}

/// Caller-supplied fields for saving a generated story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryDraft {
    pub title: String,
    pub content: String,
}

impl AiStory {
    /// Materializes a draft into a persistable story.
    pub fn from_draft(child_id: ChildId, draft: StoryDraft, now_epoch_ms: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            child_id,
            title: draft.title,
            content: draft.content,
            created_at: now_epoch_ms,
        }
    }
}
