//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors; request-level failures are rendered by
//! the gateway pipeline.

mod config;
mod venue;

use axum::{
    Router, http,
    http::{Method, header},
    routing::get,
};
use gateway::application::verify_identity::issue_session_token;
use gateway::domain::entity::session::Session;
use gateway::domain::value_object::{identity_id::IdentityId, role::Role};
use gateway::{PgGatewayRepository, Pipeline};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ServerConfig;
use crate::venue::{PgVenueRepository, VenuePolicies, VenueState, handlers, venue_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,gateway=info,platform=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;

    // Database connection
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    // Startup cleanup: remove expired sessions and quota windows
    // Errors here should not prevent server startup
    let gateway_repo = PgGatewayRepository::new(pool.clone());
    match gateway_repo.cleanup_expired().await {
        Ok(report) => {
            tracing::info!(
                sessions_deleted = report.sessions,
                quota_windows_deleted = report.quota_windows,
                "Gateway cleanup completed"
            );
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Gateway cleanup failed, continuing anyway"
            );
        }
    }

    if cfg!(debug_assertions) {
        seed_dev_session(&gateway_repo, &config).await;
    }

    tracing::info!(
        authorization_policy = ?config.gateway.authorization_policy,
        operation_timeout_ms = ?config.gateway.operation_timeout_ms(),
        "Gateway configured"
    );

    let gateway_repo = Arc::new(gateway_repo);
    let pipeline = Pipeline::new(
        config.gateway.clone(),
        gateway_repo.clone(),
        gateway_repo.clone(),
        gateway_repo,
    );
    let state = VenueState {
        pipeline: Arc::new(pipeline),
        store: Arc::new(PgVenueRepository::new(pool.clone())),
        policies: Arc::new(VenuePolicies::default()),
    };

    // CORS configuration
    let allowed_origins: Vec<http::HeaderValue> = config
        .frontend_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true);

    // Build router
    let app = Router::new()
        .route("/health", get(handlers::health))
        .nest("/api", venue_router(state))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    tracing::info!("Listening on {}", config.listen_addr);

    let listener = TcpListener::bind(config.listen_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Create a session for `DEV_SEED_ROLE` and log its bearer token
async fn seed_dev_session(repo: &PgGatewayRepository, config: &ServerConfig) {
    let Some(role) = std::env::var("DEV_SEED_ROLE")
        .ok()
        .and_then(|code| Role::from_code(&code))
    else {
        return;
    };

    let identity_id = IdentityId::new();
    let session = Session::new(identity_id, chrono::Duration::hours(12));

    let seeded = async {
        repo.assign_role(&identity_id, role).await?;
        repo.insert_session(&session).await
    };

    match seeded.await {
        Ok(()) => {
            let token = issue_session_token(session.session_id, &config.gateway.session_secret);
            tracing::info!(role = %role, token = %token, "Development session seeded");
        }
        Err(e) => tracing::warn!(error = %e, "Development session seed failed"),
    }
}
