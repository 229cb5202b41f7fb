//! Principal resolution and family scope derivation.
//!
//! # Responsibility
//! - Turn an authenticated identity token into a caller principal.
//! - Derive the tenant scope (`FamilyId`) deterministically from the principal.
//!
//! # Invariants
//! - `FamilyId` is always `"family_" + uid`; it is never stored independently
//!   and never changes for a given user.
//! - A token with an absent or malformed `uid` resolves to nothing; every
//!   downstream operation must then be denied.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Prefix joining a user id to its derived family scope.
pub const FAMILY_ID_PREFIX: &str = "family_";

/// Authenticated identity as presented by the auth provider.
///
/// `uid` is optional on purpose: an unauthenticated or expired session shows
/// up as `None` and must fail principal resolution, not panic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityToken {
    pub uid: Option<String>,
}

impl IdentityToken {
    /// Token for a signed-in user.
    pub fn signed_in(uid: impl Into<String>) -> Self {
        Self {
            uid: Some(uid.into()),
        }
    }

    /// Token for an anonymous/expired session.
    pub fn anonymous() -> Self {
        Self { uid: None }
    }
}

/// Resolved caller of an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    uid: String,
}

impl Principal {
    /// Stable user identifier as issued by the auth provider.
    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// Derived tenant scope for every family-rooted record.
    pub fn family_id(&self) -> FamilyId {
        FamilyId(format!("{FAMILY_ID_PREFIX}{}", self.uid))
    }
}

/// Tenant boundary value carried by directly-scoped documents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FamilyId(String);

impl FamilyId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for FamilyId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Principal resolution failures. All of them map to `Unauthenticated`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    MissingIdentity,
    MalformedIdentity(String),
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingIdentity => write!(f, "no authenticated identity present"),
            Self::MalformedIdentity(reason) => {
                write!(f, "authenticated identity is malformed: {reason}")
            }
        }
    }
}

impl Error for AuthError {}

/// Resolves the caller principal from an identity token.
///
/// # Errors
/// - `MissingIdentity` when the token carries no `uid`.
/// - `MalformedIdentity` when `uid` is empty, padded, or contains whitespace,
///   control characters, or path separators.
pub fn resolve_principal(token: &IdentityToken) -> Result<Principal, AuthError> {
    let uid = token.uid.as_deref().ok_or(AuthError::MissingIdentity)?;

    if uid.is_empty() || uid.trim() != uid {
        return Err(AuthError::MalformedIdentity(
            "uid must be non-empty without surrounding whitespace".to_string(),
        ));
    }
    if uid.chars().any(|ch| ch.is_whitespace() || ch.is_control()) {
        return Err(AuthError::MalformedIdentity(
            "uid must not contain whitespace or control characters".to_string(),
        ));
    }
    // Document keys embed the uid; a separator would break key addressing.
    if uid.contains('/') {
        return Err(AuthError::MalformedIdentity(
            "uid must not contain `/`".to_string(),
        ));
    }

    Ok(Principal {
        uid: uid.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::{resolve_principal, AuthError, IdentityToken};

    #[test]
    fn resolves_family_scope_from_uid() {
        let principal = resolve_principal(&IdentityToken::signed_in("abc123")).unwrap();
        assert_eq!(principal.uid(), "abc123");
        assert_eq!(principal.family_id().as_str(), "family_abc123");
    }

    #[test]
    fn anonymous_token_fails_resolution() {
        let err = resolve_principal(&IdentityToken::anonymous()).unwrap_err();
        assert_eq!(err, AuthError::MissingIdentity);
    }

    #[test]
    fn rejects_empty_and_padded_uids() {
        for uid in ["", "  ", " abc", "abc "] {
            let err = resolve_principal(&IdentityToken::signed_in(uid)).unwrap_err();
            assert!(matches!(err, AuthError::MalformedIdentity(_)), "uid {uid:?}");
        }
    }

    #[test]
    fn rejects_uids_with_separators_or_controls() {
        for uid in ["a/b", "a\nb", "a\tb", "a\u{0}b"] {
            let err = resolve_principal(&IdentityToken::signed_in(uid)).unwrap_err();
            assert!(matches!(err, AuthError::MalformedIdentity(_)), "uid {uid:?}");
        }
    }

    #[test]
    fn family_id_is_deterministic() {
        let a = resolve_principal(&IdentityToken::signed_in("u1")).unwrap();
        let b = resolve_principal(&IdentityToken::signed_in("u1")).unwrap();
        assert_eq!(a.family_id(), b.family_id());
    }
}
