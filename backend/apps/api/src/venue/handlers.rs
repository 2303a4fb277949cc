//! HTTP Handlers
//!
//! Every handler builds the request context and hands its operation to the
//! gateway pipeline; none of them touches the store outside an operation.

use axum::body::Bytes;
use axum::extract::{OriginalUri, Path, State};
use axum::http::{Extensions, HeaderMap, Method, Uri};
use axum::response::IntoResponse;
use gateway::application::envelope::PageRequest;
use gateway::application::execute::OperationError;
use gateway::application::pipeline::{OperationPolicy, Pipeline};
use gateway::application::quota::{QuotaKeyStrategy, RateLimitPolicy};
use gateway::build_request_context;
use gateway::domain::entity::request_context::RequestContext;
use gateway::domain::repository::{RoleRepository, SessionRepository};
use gateway::domain::value_object::role::Role;
use kernel::error::app_error::{AppError, FieldError};
use platform::rate_limit::QuotaStore;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::venue::model::NewCustomer;
use crate::venue::store::VenueRepository;

const QUOTA_WINDOW: Duration = Duration::from_secs(15 * 60);

/// Per-route operation policies
#[derive(Debug, Clone)]
pub struct VenuePolicies {
    pub customers_list: OperationPolicy,
    pub customers_read: OperationPolicy,
    pub customers_write: OperationPolicy,
    pub inventory: OperationPolicy,
    pub royalties: OperationPolicy,
}

impl Default for VenuePolicies {
    fn default() -> Self {
        let customers = RateLimitPolicy::new("customers", 1000, QUOTA_WINDOW);
        Self {
            customers_list: OperationPolicy::new(Role::Staff, customers.clone())
                .cacheable(Duration::from_secs(30)),
            customers_read: OperationPolicy::new(Role::Staff, customers.clone()),
            customers_write: OperationPolicy::new(Role::Manager, customers),
            inventory: OperationPolicy::new(
                Role::Staff,
                RateLimitPolicy::new("inventory", 1000, QUOTA_WINDOW),
            ),
            royalties: OperationPolicy::new(
                Role::Manager,
                RateLimitPolicy::new("royalties", 100, QUOTA_WINDOW)
                    .with_key_strategy(QuotaKeyStrategy::IdentityAndAddress),
            ),
        }
    }
}

/// Shared state for venue handlers
pub struct VenueState<S, R, Q, V>
where
    S: SessionRepository + Send + Sync + 'static,
    R: RoleRepository + Send + Sync + 'static,
    Q: QuotaStore + Send + Sync + 'static,
    V: VenueRepository + Send + Sync + 'static,
{
    pub pipeline: Arc<Pipeline<S, R, Q>>,
    pub store: Arc<V>,
    pub policies: Arc<VenuePolicies>,
}

impl<S, R, Q, V> Clone for VenueState<S, R, Q, V>
where
    S: SessionRepository + Send + Sync + 'static,
    R: RoleRepository + Send + Sync + 'static,
    Q: QuotaStore + Send + Sync + 'static,
    V: VenueRepository + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            pipeline: self.pipeline.clone(),
            store: self.store.clone(),
            policies: self.policies.clone(),
        }
    }
}

impl<S, R, Q, V> VenueState<S, R, Q, V>
where
    S: SessionRepository + Send + Sync + 'static,
    R: RoleRepository + Send + Sync + 'static,
    Q: QuotaStore + Send + Sync + 'static,
    V: VenueRepository + Send + Sync + 'static,
{
    /// `uri` is the pre-nesting request URI, so `/api` stays in links and `instance`
    fn context(
        &self,
        method: &Method,
        uri: &Uri,
        headers: &HeaderMap,
        extensions: &Extensions,
    ) -> RequestContext {
        build_request_context(
            method,
            uri,
            headers,
            extensions,
            &self.pipeline.config().session_cookie_name,
        )
    }
}

// ============================================================================
// Customers
// ============================================================================

/// GET /api/customers
pub async fn list_customers<S, R, Q, V>(
    State(state): State<VenueState<S, R, Q, V>>,
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    extensions: Extensions,
) -> impl IntoResponse
where
    S: SessionRepository + Send + Sync + 'static,
    R: RoleRepository + Send + Sync + 'static,
    Q: QuotaStore + Send + Sync + 'static,
    V: VenueRepository + Send + Sync + 'static,
{
    let ctx = state.context(&method, &uri, &headers, &extensions);
    let page = PageRequest::from_context(&ctx);
    let store = state.store.clone();

    state
        .pipeline
        .run_paged(
            &ctx,
            &state.policies.customers_list,
            page.page,
            page.per_page,
            move |_| async move { store.list_customers(page).await.map(Some) },
        )
        .await
}

/// GET /api/customers/{id}
pub async fn get_customer<S, R, Q, V>(
    State(state): State<VenueState<S, R, Q, V>>,
    Path(id): Path<String>,
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    extensions: Extensions,
) -> impl IntoResponse
where
    S: SessionRepository + Send + Sync + 'static,
    R: RoleRepository + Send + Sync + 'static,
    Q: QuotaStore + Send + Sync + 'static,
    V: VenueRepository + Send + Sync + 'static,
{
    let ctx = state.context(&method, &uri, &headers, &extensions);
    let store = state.store.clone();

    state
        .pipeline
        .run(&ctx, &state.policies.customers_read, move |_| async move {
            let customer_id = parse_customer_id(&id)?;
            store.find_customer(customer_id).await
        })
        .await
}

/// POST /api/customers
///
/// The body is parsed inside the operation so that malformed JSON is
/// reported only to callers that passed the gates.
pub async fn create_customer<S, R, Q, V>(
    State(state): State<VenueState<S, R, Q, V>>,
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    extensions: Extensions,
    body: Bytes,
) -> impl IntoResponse
where
    S: SessionRepository + Send + Sync + 'static,
    R: RoleRepository + Send + Sync + 'static,
    Q: QuotaStore + Send + Sync + 'static,
    V: VenueRepository + Send + Sync + 'static,
{
    let ctx = state.context(&method, &uri, &headers, &extensions);
    let store = state.store.clone();

    let mut response = state
        .pipeline
        .run(&ctx, &state.policies.customers_write, move |identity| async move {
            let new: NewCustomer = serde_json::from_slice(&body).map_err(AppError::from)?;
            new.validate()?;

            let customer = store.create_customer(new).await?;
            tracing::info!(
                customer_id = %customer.customer_id,
                created_by = %identity.id,
                "Customer created"
            );
            Ok::<_, OperationError>(Some(customer))
        })
        .await;

    if response.is_success() {
        response.status = 201;
    }
    response
}

fn parse_customer_id(raw: &str) -> Result<Uuid, OperationError> {
    Uuid::parse_str(raw).map_err(|_| {
        AppError::validation("Invalid customer id")
            .with_field_error(
                FieldError::new("id", "invalid_uuid", "Customer id must be a UUID").with_value(raw),
            )
            .into()
    })
}

// ============================================================================
// Inventory / Royalties
// ============================================================================

/// GET /api/inventory
pub async fn list_inventory<S, R, Q, V>(
    State(state): State<VenueState<S, R, Q, V>>,
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    extensions: Extensions,
) -> impl IntoResponse
where
    S: SessionRepository + Send + Sync + 'static,
    R: RoleRepository + Send + Sync + 'static,
    Q: QuotaStore + Send + Sync + 'static,
    V: VenueRepository + Send + Sync + 'static,
{
    let ctx = state.context(&method, &uri, &headers, &extensions);
    let page = PageRequest::from_context(&ctx);
    let store = state.store.clone();

    state
        .pipeline
        .run_paged(
            &ctx,
            &state.policies.inventory,
            page.page,
            page.per_page,
            move |_| async move { store.list_inventory(page).await.map(Some) },
        )
        .await
}

/// GET /api/royalties
pub async fn list_royalties<S, R, Q, V>(
    State(state): State<VenueState<S, R, Q, V>>,
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    extensions: Extensions,
) -> impl IntoResponse
where
    S: SessionRepository + Send + Sync + 'static,
    R: RoleRepository + Send + Sync + 'static,
    Q: QuotaStore + Send + Sync + 'static,
    V: VenueRepository + Send + Sync + 'static,
{
    let ctx = state.context(&method, &uri, &headers, &extensions);
    let store = state.store.clone();

    state
        .pipeline
        .run(&ctx, &state.policies.royalties, move |_| async move {
            store.list_royalties().await.map(Some)
        })
        .await
}

/// GET /health
pub async fn health() -> impl IntoResponse {
    axum::Json(serde_json::json!({ "status": "ok" }))
}
