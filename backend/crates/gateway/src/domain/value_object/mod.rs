//! Value Objects

pub mod identity_id;
pub mod role;

pub use identity_id::IdentityId;
pub use role::Role;
