//! Presentation Layer
//!
//! Request context extraction and response conversion for axum.

pub mod context;
pub mod response;

pub use context::build_request_context;
