//! Collection registry and scope classification table.
//!
//! # Responsibility
//! - Name every family-rooted collection the policy covers.
//! - Record how each collection derives its owning family.
//!
//! # Invariants
//! - Transitively-scoped collections never carry a redundant `familyId`;
//!   ownership is always resolved through the referenced child.
//! - The table is static: adding a collection means adding a row here.

/// Logical collections covered by the ownership policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    Children,
    Journeys,
    Adventures,
    Events,
    AiStories,
}

/// All collections, in registry order.
pub const ALL_COLLECTIONS: &[Collection] = &[
    Collection::Users,
    Collection::Children,
    Collection::Journeys,
    Collection::Adventures,
    Collection::Events,
    Collection::AiStories,
];

impl Collection {
    /// Stable collection name used as the store path segment.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Children => "children",
            Self::Journeys => "journeys",
            Self::Adventures => "adventures",
            Self::Events => "events",
            Self::AiStories => "ai_stories",
        }
    }

    /// Whether records are immutable once created (no update/delete path).
    pub fn is_append_only(self) -> bool {
        matches!(self, Self::Adventures)
    }
}

/// How a collection derives the family that owns its records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionScope {
    /// Scope is the document's own key (`users/{uid}`).
    SelfScoped,
    /// Record carries `familyId` itself.
    Direct,
    /// Record carries `childId`; scope is inherited from the referenced child.
    Transitive,
}

/// Classification table, one row per collection.
pub fn scope_of(collection: Collection) -> CollectionScope {
    match collection {
        Collection::Users => CollectionScope::SelfScoped,
        Collection::Children | Collection::Events => CollectionScope::Direct,
        Collection::Journeys | Collection::Adventures | Collection::AiStories => {
            CollectionScope::Transitive
        }
    }
}
