//! User administration handlers

use crate::{
    auth::{Authorized, Read},
    error::{ApiError, ApiResult},
    state::AppState,
    validators::{UserUpdate, ValidatedJson},
};
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::Json,
};
use clubhouse_core::{not_found_error, AuditAction, Collection, User};
use tracing::info;

pub async fn list_users(State(state): State<AppState>, _auth: Authorized<Read>) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.users.list_users().await?))
}

pub async fn get_user(
    State(state): State<AppState>,
    _auth: Authorized<Read>,
    Path(id): Path<String>,
) -> ApiResult<Json<User>> {
    state
        .users
        .get_user(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::from(not_found_error!(format!("users/{}", id), "users")))
}

/// Update a user's profile or role.
///
/// Any holder of `manage` may assign any registered role, including one
/// above their own.
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    ValidatedJson(payload): ValidatedJson<UserUpdate>,
) -> ApiResult<Json<User>> {
    let context = state
        .authorizer
        .authorize(&headers, state.capabilities.manage)
        .await?;

    let patch = payload.into_patch(id);
    let changes_role = patch.changes_role();
    let user = state.users.update_user(patch).await?;

    let executor = context.user_id().unwrap_or_default();
    state.audit.record(executor, AuditAction::Update, Collection::Users);
    if changes_role {
        info!(user_id = %user.id, role = %user.role, executor, "User role changed");
    } else {
        info!(user_id = %user.id, executor, "User updated");
    }

    Ok(Json(user))
}
