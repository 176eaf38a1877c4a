//! Clubhouse Web Server
//!
//! HTTP API for the club admin: a public read surface for members,
//! companies, events and resources, and role-gated writes behind the
//! authorization pipeline in [`auth`].

pub mod audit;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;
pub mod storage;
pub mod validators;

// Re-export main types
pub use error::{ApiError, ApiResult};
pub use server::{ClubServer, ClubServerBuilder};
pub use state::AppState;

use axum::{
    extract::DefaultBodyLimit,
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use clubhouse_core::ServerConfig;
use tracing::warn;

/// Configured origins, or any origin in development mode
fn allowed_origins(server: &ServerConfig) -> AllowOrigin {
    if server.dev_mode {
        return AllowOrigin::mirror_request();
    }

    let origins: Vec<HeaderValue> = server
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    AllowOrigin::list(origins)
}

/// Create the main application router
pub fn create_app(state: AppState) -> Router {
    let server = &state.config.server;

    // The identity token travels in a custom header
    let cors = CorsLayer::new()
        .allow_origin(allowed_origins(server))
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_credentials(true)
        .allow_headers([CONTENT_TYPE, state.authorizer.token_header().clone()]);

    let body_limit = server.body_limit;

    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
