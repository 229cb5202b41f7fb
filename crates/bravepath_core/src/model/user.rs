//! Account profile document.
//!
//! # Invariants
//! - Document key, `uid` field, and the creating principal's uid all match.
//! - Created once at signup; never deleted.

use serde::{Deserialize, Serialize};

/// Account profile as persisted in the `users` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: i64,
}

/// Caller-supplied fields for the one-time signup profile write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDraft {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl UserProfile {
    /// Materializes a signup draft for the given principal uid.
    pub fn from_draft(uid: impl Into<String>, draft: UserDraft, now_epoch_ms: i64) -> Self {
        Self {
            uid: uid.into(),
            email: draft.email,
            first_name: draft.first_name,
            last_name: draft.last_name,
            created_at: now_epoch_ms,
        }
    }
}
