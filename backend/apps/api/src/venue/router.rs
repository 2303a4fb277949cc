//! Venue Router

use axum::{Router, routing::get};
use gateway::domain::repository::{RoleRepository, SessionRepository};
use platform::rate_limit::QuotaStore;

use crate::venue::handlers::{self, VenueState};
use crate::venue::store::VenueRepository;

/// Create the venue router for any repository implementation
pub fn venue_router<S, R, Q, V>(state: VenueState<S, R, Q, V>) -> Router
where
    S: SessionRepository + Send + Sync + 'static,
    R: RoleRepository + Send + Sync + 'static,
    Q: QuotaStore + Send + Sync + 'static,
    V: VenueRepository + Send + Sync + 'static,
{
    Router::new()
        .route(
            "/customers",
            get(handlers::list_customers::<S, R, Q, V>)
                .post(handlers::create_customer::<S, R, Q, V>),
        )
        .route("/customers/{id}", get(handlers::get_customer::<S, R, Q, V>))
        .route("/inventory", get(handlers::list_inventory::<S, R, Q, V>))
        .route("/royalties", get(handlers::list_royalties::<S, R, Q, V>))
        .with_state(state)
}
