//! Skill journey document and derived progress counter.
//!
//! # Responsibility
//! - Define the per-skill progress record paired 1:1 with a skill definition.
//!
//! # Invariants
//! - One journey per `(childId, skillId)` pair; the document key is
//!   `"{childId}_{skillId}"`.
//! - `progress.adventure_count` equals the number of stored adventures for the
//!   pair after every successful log operation.

use crate::model::child::ChildId;
use serde::{Deserialize, Serialize};

/// Skill definition embedded in a journey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillData {
    pub id: String,
    pub name: String,
    pub category: String,
    pub difficulty: String,
    pub estimated_days: i64,
    pub created_at: i64,
}

/// Caller-supplied skill form used to start a journey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillForm {
    pub id: String,
    pub name: String,
    pub category: String,
    pub difficulty: String,
    pub estimated_days: i64,
}

/// Derived progress counter kept consistent by the aggregation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub adventure_count: u64,
    pub last_updated: i64,
}

/// Journey as persisted in the `journeys` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Journey {
    pub child_id: ChildId,
    pub skill_data: SkillData,
    pub progress: Progress,
}

impl Journey {
    /// Starts a journey from a skill form with a zeroed progress counter.
    pub fn start(child_id: ChildId, form: SkillForm, now_epoch_ms: i64) -> Self {
        Self {
            child_id,
            skill_data: SkillData {
                id: form.id,
                name: form.name,
                category: form.category,
                difficulty: form.difficulty,
                estimated_days: form.estimated_days,
                created_at: now_epoch_ms,
            },
            progress: Progress {
                adventure_count: 0,
                last_updated: now_epoch_ms,
            },
        }
    }

    /// Document key for the unique `(childId, skillId)` pair.
    pub fn document_key(child_id: ChildId, skill_id: &str) -> String {
        format!("{child_id}_{skill_id}")
    }

    /// Key of this journey's own document.
    pub fn key(&self) -> String {
        Self::document_key(self.child_id, &self.skill_data.id)
    }
}
