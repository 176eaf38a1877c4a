//! Route definitions for the Clubhouse API

use crate::{handlers, AppState};
use axum::{
    routing::{delete, get},
    Router,
};

/// Create API routes, mounted under `/api/v1`
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Sign-in and UI controls
        .route(
            "/session",
            get(handlers::get_session).post(handlers::create_session),
        )
        // Members
        .route(
            "/members",
            get(handlers::list_members)
                .post(handlers::create_member)
                .patch(handlers::update_members),
        )
        .route("/members/{id}", delete(handlers::delete_member))
        // Companies, events, resources
        .route(
            "/companies",
            get(handlers::list_companies).post(handlers::create_company),
        )
        .route("/companies/{id}", delete(handlers::delete_company))
        .route(
            "/events",
            get(handlers::list_events).post(handlers::create_event),
        )
        .route("/events/{id}", delete(handlers::delete_event))
        .route(
            "/resources",
            get(handlers::list_resources).post(handlers::create_resource),
        )
        .route("/resources/{id}", delete(handlers::delete_resource))
        // Users
        .route("/users", get(handlers::list_users))
        .route(
            "/users/{id}",
            get(handlers::get_user).patch(handlers::update_user),
        )
        // Audit trail
        .route("/audit-logs", get(handlers::list_audit_logs))
}
