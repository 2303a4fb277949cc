//! Application Layer
//!
//! The pipeline components, one module each, and the orchestrator.

pub mod authorize;
pub mod config;
pub mod envelope;
pub mod execute;
pub mod pipeline;
pub mod quota;
pub mod translate;
pub mod verify_identity;

// Re-exports
pub use authorize::{AuthorizationPolicy, Authorizer, RoleResolver};
pub use config::GatewayConfig;
pub use envelope::{
    CacheStatus, Links, Page, PageRequest, PaginationMeta, ResponseEnvelopeBuilder,
    ResponseHeaders, ResponseOptions, ServiceResponse,
};
pub use execute::{OperationError, OperationExecutor, OperationResult, Outcome};
pub use pipeline::{OperationPolicy, Pipeline, PipelineResponse, PipelineState};
pub use quota::{QuotaDecision, QuotaKeyStrategy, QuotaSnapshot, QuotaTracker, RateLimitPolicy};
pub use translate::{ErrorDescriptor, ErrorTranslator, STORE_ERROR_TABLE, StoreErrorRule};
pub use verify_identity::{IdentityVerifier, issue_session_token};
