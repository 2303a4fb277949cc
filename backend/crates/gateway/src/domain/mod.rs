//! Domain Layer
//!
//! Contains entities, value objects, and repository traits.

pub mod entity;
pub mod repository;
pub mod value_object;

// Re-exports
pub use entity::{
    identity::{Identity, VerifiedSession},
    request_context::RequestContext,
    session::Session,
};
pub use repository::{RoleRepository, SessionRepository};
pub use value_object::{IdentityId, Role};
