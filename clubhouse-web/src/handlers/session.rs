//! Sign-in and session inspection

use crate::{auth::CurrentContext, error::ApiResult, state::AppState};
use axum::{extract::State, http::HeaderMap, response::Json};
use chrono::Utc;
use clubhouse_auth::{AuthContext, ControlSet};
use clubhouse_core::{User, VerifiedIdentity};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: Option<User>,
    pub controls: ControlSet,
}

fn first_sign_in_user(identity: VerifiedIdentity, role: &str) -> User {
    let username = identity
        .name
        .clone()
        .or_else(|| identity.email.clone())
        .unwrap_or_else(|| identity.subject.clone());

    User {
        id: identity.subject,
        username,
        email: identity.email,
        provider: identity.provider,
        avatar_url: identity.picture,
        role: role.to_string(),
        created_at: Utc::now(),
    }
}

/// Exchange a verified identity token for a session.
///
/// The first sign-in creates the user record with the lowest role. Later
/// sign-ins return the stored record untouched, so a token can never raise
/// its own role.
pub async fn create_session(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Json<SessionResponse>> {
    let identity = state.authorizer.verify_identity(&headers).await?;

    let registry = state.evaluator.registry();
    let lowest = registry.label(registry.lowest());
    let user = state
        .users
        .create_user(first_sign_in_user(identity, lowest))
        .await?;

    info!(user_id = %user.id, role = %user.role, "User signed in");

    let context = AuthContext::signed_in(user.clone(), state.evaluator.clone());
    Ok(Json(SessionResponse {
        user: Some(user),
        controls: state.controls(&context),
    }))
}

/// Report what the current caller may see. Anonymous callers get an empty
/// control set rather than an error.
pub async fn get_session(
    State(state): State<AppState>,
    CurrentContext(context): CurrentContext,
) -> Json<SessionResponse> {
    let controls = state.controls(&context);
    Json(SessionResponse {
        user: context.into_user(),
        controls,
    })
}
