//! Family-scoped authorization policy.
//!
//! # Responsibility
//! - Classify collections by how they derive their owning family.
//! - Decide every read/write against family- or child-rooted collections.
//!
//! # Invariants
//! - The decision procedure is a pure function over the request; store access
//!   happens only in the guard wrapper that resolves transitive scope.
//! - Denials never reveal whether a foreign record exists.

pub mod guard;
pub mod scope;

pub use guard::{decide, AccessRequest, Decision, DenyReason, GuardError, Operation, OwnershipGuard};
pub use scope::{scope_of, Collection, CollectionScope};
