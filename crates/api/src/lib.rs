//! # Worship Set Manager API
//!
//! The HTTP server for the worship scheduling service: songs, services,
//! worship sets, suggestion slots, instrument assignments and
//! notifications.
//!
//! ## Architecture
//!
//! - **Routes**: endpoint structure and the per-resource policy layers
//! - **Handlers**: request processing, ownership checks, workflow calls
//! - **Middleware**: authentication, authorization, validation, error mapping
//! - **Config**: environment configuration
//!
//! Every protected request passes `authenticate` (401), then the route's
//! `authorize` layer (403), then the validated JSON extractor (400/413),
//! before the handler touches the database.

/// Configuration module for API settings
pub mod config;
/// Request handlers
pub mod handlers;
/// Authentication, authorization, validation and error handling
pub mod middleware;
/// Route definitions
pub mod routes;

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
};
use eyre::Result;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::FmtSubscriber;
use worship_core::token::TokenKeys;

use crate::config::ApiConfig;

/// Shared state handed to every handler.
pub struct ApiState {
    /// PostgreSQL connection pool
    pub db_pool: PgPool,
    /// Signing and verification keys for bearer tokens
    pub tokens: TokenKeys,
}

impl ApiState {
    pub fn new(db_pool: PgPool, config: &ApiConfig) -> Self {
        Self {
            db_pool,
            tokens: TokenKeys::new(config.jwt_secret.as_bytes(), config.token_ttl_seconds),
        }
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .allow_origin(allowed)
        .allow_credentials(true)
}

/// Builds the full application router.
///
/// Kept separate from [`start_server`] so tests can drive it in-process.
pub fn app(state: Arc<ApiState>, config: &ApiConfig) -> Router {
    let protected = routes::protected().route_layer(axum::middleware::from_fn_with_state(
        state.clone(),
        middleware::auth::authenticate,
    ));

    let app = Router::new()
        .merge(routes::health::routes())
        .merge(routes::auth::routes())
        .merge(protected)
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout))),
        );

    match &config.cors_origins {
        Some(origins) => app.layer(cors_layer(origins)),
        None => app,
    }
}

/// Installs logging, builds the router and serves it until shutdown.
pub async fn start_server(config: ApiConfig, db_pool: PgPool) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let state = Arc::new(ApiState::new(db_pool, &config));
    let app = app(state, &config);

    let addr = config.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
