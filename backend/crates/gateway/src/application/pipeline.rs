//! Request Pipeline
//!
//! Runs the gates in a fixed order for every request:
//!
//! ```text
//! START → AUTHENTICATING → AUTHORIZING → RATE_LIMITING → EXECUTING → SUCCESS
//!               │               │              │             │
//!               └───────────────┴──────────────┴─────────────┴──→ ERROR
//! ```
//!
//! Any gate failure jumps straight to `ERROR`; no state is re-entered. The
//! error translator and envelope builder run on every path.

use derive_more::Display;
use platform::rate_limit::QuotaStore;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Instrument;

use crate::application::authorize::{Authorizer, RoleResolver};
use crate::application::config::GatewayConfig;
use crate::application::envelope::{
    CacheStatus, Page, PaginationMeta, ResponseEnvelopeBuilder, ResponseHeaders,
    ResponseOptions, ServiceResponse,
};
use crate::application::execute::{OperationExecutor, OperationResult};
use crate::application::quota::{QuotaDecision, QuotaSnapshot, QuotaTracker, RateLimitPolicy};
use crate::application::translate::ErrorTranslator;
use crate::application::verify_identity::IdentityVerifier;
use crate::domain::entity::identity::Identity;
use crate::domain::entity::request_context::RequestContext;
use crate::domain::repository::{RoleRepository, SessionRepository};
use crate::domain::value_object::role::Role;
use crate::error::GatewayError;

/// Pipeline state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum PipelineState {
    #[display("START")]
    Start,
    #[display("AUTHENTICATING")]
    Authenticating,
    #[display("AUTHORIZING")]
    Authorizing,
    #[display("RATE_LIMITING")]
    RateLimiting,
    #[display("EXECUTING")]
    Executing,
    #[display("SUCCESS")]
    Success,
    #[display("ERROR")]
    Error,
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Success | PipelineState::Error)
    }
}

/// Requirements of one operation, supplied by the calling feature
#[derive(Debug, Clone)]
pub struct OperationPolicy {
    pub required_role: Role,
    pub rate_limit: RateLimitPolicy,
    /// `Some` marks successful responses as cacheable for this long
    pub cache_ttl: Option<Duration>,
}

impl OperationPolicy {
    pub fn new(required_role: Role, rate_limit: RateLimitPolicy) -> Self {
        Self {
            required_role,
            rate_limit,
            cache_ttl: None,
        }
    }

    pub fn cacheable(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }
}

/// Everything the presentation layer needs to write the HTTP response
#[derive(Debug)]
pub struct PipelineResponse<T> {
    pub status: u16,
    pub envelope: ServiceResponse<T>,
    pub headers: ResponseHeaders,
    pub final_state: PipelineState,
}

impl<T> PipelineResponse<T> {
    pub fn is_success(&self) -> bool {
        self.final_state == PipelineState::Success
    }
}

/// Outcome of the gate chain and the operation, before shaping
struct Processed<U> {
    result: Result<U, GatewayError>,
    quota: Option<QuotaSnapshot>,
}

/// Tracks the current state and logs every transition
struct StateMachine {
    state: PipelineState,
}

impl StateMachine {
    fn new() -> Self {
        Self {
            state: PipelineState::Start,
        }
    }

    fn advance(&mut self, next: PipelineState) {
        debug_assert!(!self.state.is_terminal());
        tracing::debug!(from = %self.state, to = %next, "Pipeline transition");
        self.state = next;
    }
}

/// Request pipeline
pub struct Pipeline<S, R, Q>
where
    S: SessionRepository,
    R: RoleRepository,
    Q: QuotaStore,
{
    verifier: IdentityVerifier<S>,
    resolver: RoleResolver<R>,
    authorizer: Authorizer,
    tracker: QuotaTracker<Q>,
    executor: OperationExecutor,
    translator: ErrorTranslator,
    builder: ResponseEnvelopeBuilder,
    config: Arc<GatewayConfig>,
}

impl<S, R, Q> Pipeline<S, R, Q>
where
    S: SessionRepository,
    R: RoleRepository,
    Q: QuotaStore,
{
    pub fn new(config: GatewayConfig, sessions: Arc<S>, roles: Arc<R>, quotas: Arc<Q>) -> Self {
        let config = Arc::new(config);
        Self {
            verifier: IdentityVerifier::new(sessions, config.clone()),
            resolver: RoleResolver::new(roles),
            authorizer: Authorizer::new(config.authorization_policy),
            tracker: QuotaTracker::new(quotas),
            executor: OperationExecutor::new(config.operation_timeout),
            translator: ErrorTranslator::new(config.problem_type_base.clone()),
            builder: ResponseEnvelopeBuilder::new(
                config.api_version.clone(),
                Some(config.response_source.clone()),
                config.public_base_url.clone(),
            ),
            config,
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Run an operation returning a single value
    pub async fn run<T, F, Fut>(
        &self,
        context: &RequestContext,
        policy: &OperationPolicy,
        operation: F,
    ) -> PipelineResponse<T>
    where
        T: Serialize + Send + 'static,
        F: FnOnce(Identity) -> Fut,
        Fut: Future<Output = OperationResult<T>> + Send + 'static,
    {
        self.run_shaped(context, policy, operation, |data| (data, None)).await
    }

    /// Run an operation returning one page of a list
    pub async fn run_paged<T, F, Fut>(
        &self,
        context: &RequestContext,
        policy: &OperationPolicy,
        page: u32,
        per_page: u32,
        operation: F,
    ) -> PipelineResponse<Vec<T>>
    where
        T: Serialize + Send + 'static,
        F: FnOnce(Identity) -> Fut,
        Fut: Future<Output = OperationResult<Page<T>>> + Send + 'static,
    {
        self.run_shaped(context, policy, operation, move |page_data: Page<T>| {
            let pagination = PaginationMeta::new(page, per_page, page_data.total);
            (page_data.items, Some(pagination))
        })
        .await
    }

    async fn run_shaped<U, T, F, Fut, Shape>(
        &self,
        context: &RequestContext,
        policy: &OperationPolicy,
        operation: F,
        shape: Shape,
    ) -> PipelineResponse<T>
    where
        U: Send + 'static,
        F: FnOnce(Identity) -> Fut,
        Fut: Future<Output = OperationResult<U>> + Send + 'static,
        Shape: FnOnce(U) -> (T, Option<PaginationMeta>),
    {
        let span = tracing::info_span!(
            "pipeline",
            request_id = %context.request_id(),
            method = %context.method(),
            path = %context.path(),
        );

        async move {
            let started = Instant::now();
            let mut machine = StateMachine::new();
            let processed = self.process(context, policy, operation, &mut machine).await;
            let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

            match processed.result {
                Ok(data) => {
                    machine.advance(PipelineState::Success);
                    let (data, pagination) = shape(data);
                    let options = ResponseOptions {
                        pagination,
                        cache_ttl: policy.cache_ttl,
                        cache_status: policy.cache_ttl.map(|_| CacheStatus::Miss),
                    };
                    let envelope = self
                        .builder
                        .build_success(data, context, &options)
                        .with_duration_ms(duration_ms);
                    let headers = self.builder.success_headers(context, &options, processed.quota);
                    tracing::debug!(duration_ms, "Request succeeded");

                    PipelineResponse {
                        status: 200,
                        envelope,
                        headers,
                        final_state: machine.state,
                    }
                }
                Err(failure) => {
                    machine.advance(PipelineState::Error);
                    failure.log();
                    let descriptor = self.translator.translate(&failure, context);
                    let status = descriptor.status;
                    let headers = self.builder.error_headers(context, &descriptor, processed.quota);
                    let envelope = self
                        .builder
                        .build_error(descriptor, context)
                        .with_duration_ms(duration_ms);

                    PipelineResponse {
                        status,
                        envelope,
                        headers,
                        final_state: machine.state,
                    }
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn process<U, F, Fut>(
        &self,
        context: &RequestContext,
        policy: &OperationPolicy,
        operation: F,
        machine: &mut StateMachine,
    ) -> Processed<U>
    where
        U: Send + 'static,
        F: FnOnce(Identity) -> Fut,
        Fut: Future<Output = OperationResult<U>> + Send + 'static,
    {
        machine.advance(PipelineState::Authenticating);
        let session = match self.verifier.verify(context).await {
            Ok(session) => session,
            Err(e) => {
                return Processed {
                    result: Err(e),
                    quota: None,
                };
            }
        };

        machine.advance(PipelineState::Authorizing);
        let identity = self.resolver.resolve(&session).await;
        if let Err(e) = self.authorizer.authorize(&identity, policy.required_role) {
            return Processed {
                result: Err(e),
                quota: None,
            };
        }

        machine.advance(PipelineState::RateLimiting);
        let key = policy.rate_limit.key(&identity, context);
        let quota = match self.tracker.check(&key, &policy.rate_limit.config).await {
            QuotaDecision::Allowed { snapshot } => snapshot,
            QuotaDecision::Denied {
                retry_after_ms,
                snapshot,
            } => {
                return Processed {
                    result: Err(GatewayError::RateLimited {
                        limit: snapshot.limit,
                        retry_after_ms,
                        reset_at_ms: snapshot.reset_at_ms,
                    }),
                    quota: Some(snapshot),
                };
            }
        };

        machine.advance(PipelineState::Executing);
        let result = self.executor.execute(identity, operation).await.into_result();
        Processed { result, quota }
    }
}
