//! Entities

pub mod identity;
pub mod request_context;
pub mod session;
