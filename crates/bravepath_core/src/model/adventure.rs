//! Adventure log entry and win-type vocabulary.
//!
//! # Responsibility
//! - Define the append-only practice record attached to a journey.
//! - Provide the closed win-type vocabulary with stable wire strings.
//!
//! # Invariants
//! - Adventures are immutable once created; there is no update path.
//! - `win_type` only ever holds one of the declared variants.

use crate::model::child::ChildId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for an adventure entry.
pub type AdventureId = Uuid;

/// How a practice session went, in the child's own terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WinType {
    TriedBest,
    NoFrustration,
    LaughedAboutIt,
    MadeProgress,
    KeptGoing,
    Custom,
}

/// Wire string for [`WinType::TriedBest`].
pub const WIN_TYPE_TRIED_BEST: &str = "tried-best";
/// Wire string for [`WinType::NoFrustration`].
pub const WIN_TYPE_NO_FRUSTRATION: &str = "no-frustration";
/// Wire string for [`WinType::LaughedAboutIt`].
pub const WIN_TYPE_LAUGHED_ABOUT_IT: &str = "laughed-about-it";
/// Wire string for [`WinType::MadeProgress`].
pub const WIN_TYPE_MADE_PROGRESS: &str = "made-progress";
/// Wire string for [`WinType::KeptGoing`].
pub const WIN_TYPE_KEPT_GOING: &str = "kept-going";
/// Wire string for [`WinType::Custom`].
pub const WIN_TYPE_CUSTOM: &str = "custom";

const SUPPORTED_WIN_TYPE_STRINGS: &[&str] = &[
    WIN_TYPE_TRIED_BEST,
    WIN_TYPE_NO_FRUSTRATION,
    WIN_TYPE_LAUGHED_ABOUT_IT,
    WIN_TYPE_MADE_PROGRESS,
    WIN_TYPE_KEPT_GOING,
    WIN_TYPE_CUSTOM,
];

/// Returns the supported win-type wire strings.
pub fn supported_win_type_strings() -> &'static [&'static str] {
    SUPPORTED_WIN_TYPE_STRINGS
}

impl WinType {
    /// Stable string used in stored documents.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TriedBest => WIN_TYPE_TRIED_BEST,
            Self::NoFrustration => WIN_TYPE_NO_FRUSTRATION,
            Self::LaughedAboutIt => WIN_TYPE_LAUGHED_ABOUT_IT,
            Self::MadeProgress => WIN_TYPE_MADE_PROGRESS,
            Self::KeptGoing => WIN_TYPE_KEPT_GOING,
            Self::Custom => WIN_TYPE_CUSTOM,
        }
    }
}

/// Parses one win type from a stored or submitted string value.
pub fn parse_win_type(value: &str) -> Result<WinType, WinTypeError> {
    match value {
        WIN_TYPE_TRIED_BEST => Ok(WinType::TriedBest),
        WIN_TYPE_NO_FRUSTRATION => Ok(WinType::NoFrustration),
        WIN_TYPE_LAUGHED_ABOUT_IT => Ok(WinType::LaughedAboutIt),
        WIN_TYPE_MADE_PROGRESS => Ok(WinType::MadeProgress),
        WIN_TYPE_KEPT_GOING => Ok(WinType::KeptGoing),
        WIN_TYPE_CUSTOM => Ok(WinType::Custom),
        other => Err(WinTypeError::Unsupported(other.to_string())),
    }
}

/// Win-type parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WinTypeError {
    Unsupported(String),
}

impl Display for WinTypeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unsupported(value) => write!(f, "win type is unsupported: {value}"),
        }
    }
}

impl Error for WinTypeError {}

/// Adventure as persisted in the `adventures` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Adventure {
    pub id: AdventureId,
    pub child_id: ChildId,
    pub skill_id: String,
    pub text: String,
    pub win_type: WinType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    pub created_at: i64,
}

/// Caller-supplied fields for logging one adventure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdventureDraft {
    pub text: String,
    pub win_type: WinType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

impl Adventure {
    /// Materializes a draft into a persistable adventure entry.
    pub fn from_draft(
        child_id: ChildId,
        skill_id: impl Into<String>,
        draft: AdventureDraft,
        now_epoch_ms: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            child_id,
            skill_id: skill_id.into(),
            text: draft.text,
            win_type: draft.win_type,
            photo_url: draft.photo_url,
            created_at: now_epoch_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_win_type, supported_win_type_strings, WinType, WinTypeError};

    #[test]
    fn parses_all_supported_win_types() {
        for (value, expected) in [
            ("tried-best", WinType::TriedBest),
            ("no-frustration", WinType::NoFrustration),
            ("laughed-about-it", WinType::LaughedAboutIt),
            ("made-progress", WinType::MadeProgress),
            ("kept-going", WinType::KeptGoing),
            ("custom", WinType::Custom),
        ] {
            assert_eq!(parse_win_type(value).expect(value), expected);
        }
    }

    #[test]
    fn rejects_unsupported_win_type() {
        let err = parse_win_type("total-failure").expect_err("unsupported win type must fail");
        assert_eq!(err, WinTypeError::Unsupported("total-failure".to_string()));
    }

    #[test]
    fn rejects_non_kebab_variants() {
        for value in ["Made-Progress", "MADE-PROGRESS", "made_progress", ""] {
            assert!(parse_win_type(value).is_err(), "value {value:?}");
        }
    }

    #[test]
    fn wire_strings_round_trip_through_as_str() {
        for value in supported_win_type_strings() {
            let parsed = parse_win_type(value).expect(value);
            assert_eq!(parsed.as_str(), *value);
        }
    }
}
