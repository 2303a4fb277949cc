//! Gateway (Request Pipeline) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Roles, identity, sessions, request context, repository traits
//! - `application/` - Pipeline components and the orchestrator
//! - `infra/` - PostgreSQL and in-memory repositories
//! - `presentation/` - axum request-context extraction and response conversion
//!
//! ## Flow
//! Every data access goes through [`Pipeline`]: identity verification,
//! role resolution and authorization, fixed-window rate limiting, execution
//! of the caller's operation, then error translation and envelope building.
//!
//! ## Failure Policy
//! - Authentication fails closed (a session-store failure rejects the request)
//! - Role lookup falls back to `USER` on failure
//! - Rate limiting fails open (a quota-store failure lets the request through)

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::GatewayConfig;
pub use application::pipeline::{OperationPolicy, Pipeline, PipelineResponse, PipelineState};
pub use error::{GatewayError, GatewayResult};
pub use infra::{memory::MemoryGatewayRepository, postgres::PgGatewayRepository};
pub use presentation::context::build_request_context;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult, FieldError},
    kind::ErrorKind,
};

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
}
