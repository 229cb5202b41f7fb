//! Child profile document.
//!
//! # Responsibility
//! - Define the directly-scoped record every transitive lookup resolves to.
//!
//! # Invariants
//! - `family_id` is assigned at creation and never changes afterwards.
//! - `id` is stable and never reused for another child.

use crate::auth::FamilyId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a child profile.
pub type ChildId = Uuid;

/// Child profile as persisted in the `children` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Child {
    pub id: ChildId,
    pub family_id: FamilyId,
    pub name: String,
    pub age: i64,
    pub diagnosis: String,
    pub strengths: Vec<String>,
    pub challenges: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medications: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allergies: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Caller-supplied fields for creating a child profile.
///
/// `family_id` is part of the draft so the guard can reject a payload that
/// names a scope other than the caller's own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildDraft {
    pub family_id: FamilyId,
    pub name: String,
    pub age: i64,
    pub diagnosis: String,
    pub strengths: Vec<String>,
    pub challenges: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medications: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allergies: Option<String>,
}

impl Child {
    /// Materializes a draft into a persistable child profile.
    pub fn from_draft(draft: ChildDraft, now_epoch_ms: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            family_id: draft.family_id,
            name: draft.name,
            age: draft.age,
            diagnosis: draft.diagnosis,
            strengths: draft.strengths,
            challenges: draft.challenges,
            medications: draft.medications,
            allergies: draft.allergies,
            created_at: now_epoch_ms,
            updated_at: now_epoch_ms,
        }
    }
}

/// Mutable fields accepted by a child profile update.
///
/// `family_id` is deliberately absent: tenant scope is immutable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildUpdate {
    pub name: Option<String>,
    pub age: Option<i64>,
    pub diagnosis: Option<String>,
    pub strengths: Option<Vec<String>>,
    pub challenges: Option<Vec<String>>,
    pub medications: Option<Option<String>>,
    pub allergies: Option<Option<String>>,
}

impl ChildUpdate {
    /// Applies the update to an existing profile, bumping `updated_at`.
    pub fn apply_to(self, child: &mut Child, now_epoch_ms: i64) {
        if let Some(name) = self.name {
            child.name = name;
        }
        if let Some(age) = self.age {
            child.age = age;
        }
        if let Some(diagnosis) = self.diagnosis {
            child.diagnosis = diagnosis;
        }
        if let Some(strengths) = self.strengths {
            child.strengths = strengths;
        }
        if let Some(challenges) = self.challenges {
            child.challenges = challenges;
        }
        if let Some(medications) = self.medications {
            child.medications = medications;
        }
        if let Some(allergies) = self.allergies {
            child.allergies = allergies;
        }
        child.updated_at = now_epoch_ms;
    }
}
