//! Typed documents for family-scoped records.
//!
//! # Responsibility
//! - Define the canonical shapes persisted to the document store.
//! - Keep stored JSON field names stable (`camelCase` wire shape).
//!
//! # Invariants
//! - Directly-scoped records carry `familyId`; transitively-scoped records
//!   carry `childId` and never a redundant `familyId`.
//! - All timestamps are Unix epoch milliseconds from an injected clock.

pub mod adventure;
pub mod child;
pub mod journey;
pub mod schedule;
pub mod story;
pub mod user;
