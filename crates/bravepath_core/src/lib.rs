//! Core domain logic for BravePath.
//! This crate is the single source of truth for family-scoped authorization
//! and progress aggregation; UI layers are thin screens over these services.

pub mod auth;
pub mod clock;
pub mod db;
pub mod logging;
pub mod model;
pub mod policy;
pub mod schema;
pub mod service;
pub mod store;

pub use auth::{resolve_principal, AuthError, FamilyId, IdentityToken, Principal};
pub use clock::{Clock, FixedClock, SystemClock};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::adventure::{Adventure, AdventureDraft, WinType};
pub use model::child::{Child, ChildDraft, ChildId, ChildUpdate};
pub use model::journey::{Journey, Progress, SkillForm};
pub use model::schedule::{ScheduleEvent, ScheduleEventDraft};
pub use model::story::{AiStory, StoryDraft};
pub use model::user::{UserDraft, UserProfile};
pub use policy::{
    decide, AccessRequest, Collection, Decision, DenyReason, Operation, OwnershipGuard,
};
pub use schema::{SchemaValidator, ValidationError, ValidationLimits};
pub use service::journey_service::AdventureLogged;
pub use service::{
    ChildService, JourneyService, ProfileService, RetryPolicy, ScheduleService, ServiceError,
};
pub use store::{Document, DocumentStore, SqliteDocumentStore, StoreError, WriteBatch};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
