//! Member directory handlers

use crate::{
    auth::{Authorized, Write},
    error::{ApiError, ApiResult},
    state::AppState,
    validators::{MembersBulkUpdate, NewMember, ValidatedJson},
};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use clubhouse_core::{not_found_error, AuditAction, Collection};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

fn rank_of(member: &Value) -> i64 {
    member.get("rank").and_then(Value::as_i64).unwrap_or(0)
}

/// Public member list, ordered by `rank`
pub async fn list_members(State(state): State<AppState>) -> ApiResult<Json<Vec<Value>>> {
    let mut members = state.documents.list(Collection::Members).await?;
    members.sort_by_key(rank_of);
    Ok(Json(members))
}

pub async fn create_member(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidatedJson(payload): ValidatedJson<NewMember>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let context = state
        .authorizer
        .authorize(&headers, state.capabilities.write)
        .await?;

    let member = payload.into_member(Uuid::new_v4().to_string());
    let document = serde_json::to_value(&member).map_err(clubhouse_core::ClubError::from)?;
    let stored = state.documents.insert(Collection::Members, document).await?;

    let executor = context.user_id().unwrap_or_default();
    state
        .audit
        .record(executor, AuditAction::Create, Collection::Members);
    info!(member_id = %member.id, executor, "Member created");

    Ok((StatusCode::CREATED, Json(stored)))
}

/// Bulk edit, used by the admin list for drag-reordering and inline edits.
/// The whole batch is applied or none of it is.
pub async fn update_members(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidatedJson(payload): ValidatedJson<MembersBulkUpdate>,
) -> ApiResult<Json<Vec<Value>>> {
    let context = state
        .authorizer
        .authorize(&headers, state.capabilities.manage)
        .await?;

    if payload.members.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let patches = payload
        .members
        .iter()
        .map(|m| m.to_patch())
        .collect::<Result<Vec<_>, _>>()
        .map_err(clubhouse_core::ClubError::from)?;

    let updated = state
        .documents
        .update_many(Collection::Members, patches)
        .await?;

    let executor = context.user_id().unwrap_or_default();
    state
        .audit
        .record(executor, AuditAction::Update, Collection::Members);
    info!(count = updated.len(), executor, "Members updated");

    Ok(Json(updated))
}

pub async fn delete_member(
    State(state): State<AppState>,
    auth: Authorized<Write>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    if !state.documents.delete(Collection::Members, &id).await? {
        return Err(ApiError::from(not_found_error!(
            format!("members/{}", id),
            "members"
        )));
    }

    state
        .audit
        .record(auth.executor_id(), AuditAction::Delete, Collection::Members);
    info!(member_id = %id, executor = auth.executor_id(), "Member deleted");

    Ok(StatusCode::NO_CONTENT)
}
