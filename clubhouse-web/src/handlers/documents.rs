//! Companies, events and resources
//!
//! These collections share one shape: a public list, and create/delete
//! behind the `write` capability.

use crate::{
    auth::{Authorized, Write},
    error::{ApiError, ApiResult},
    state::AppState,
    validators::{NewCompany, NewEvent, NewResource, ValidatedJson},
};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use clubhouse_core::{not_found_error, AuditAction, ClubError, Collection};
use serde::Serialize;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

async fn list_collection(state: &AppState, collection: Collection) -> ApiResult<Json<Vec<Value>>> {
    Ok(Json(state.documents.list(collection).await?))
}

/// Authorize, store and audit a freshly validated document
async fn insert_document<T: Serialize>(
    state: &AppState,
    headers: &HeaderMap,
    collection: Collection,
    build: impl FnOnce(String) -> T,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let context = state
        .authorizer
        .authorize(headers, state.capabilities.write)
        .await?;

    let id = new_id();
    let document = serde_json::to_value(build(id.clone())).map_err(ClubError::from)?;
    let stored = state.documents.insert(collection, document).await?;

    let executor = context.user_id().unwrap_or_default();
    state.audit.record(executor, AuditAction::Create, collection);
    info!(%collection, %id, executor, "Document created");

    Ok((StatusCode::CREATED, Json(stored)))
}

async fn delete_document(
    state: &AppState,
    executor: &str,
    collection: Collection,
    id: &str,
) -> ApiResult<StatusCode> {
    if !state.documents.delete(collection, id).await? {
        return Err(ApiError::from(not_found_error!(
            format!("{}/{}", collection, id),
            collection.as_str()
        )));
    }

    state.audit.record(executor, AuditAction::Delete, collection);
    info!(%collection, %id, executor, "Document deleted");

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_companies(State(state): State<AppState>) -> ApiResult<Json<Vec<Value>>> {
    list_collection(&state, Collection::Companies).await
}

pub async fn create_company(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidatedJson(payload): ValidatedJson<NewCompany>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    insert_document(&state, &headers, Collection::Companies, |id| {
        payload.into_company(id)
    })
    .await
}

pub async fn delete_company(
    State(state): State<AppState>,
    auth: Authorized<Write>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    delete_document(&state, auth.executor_id(), Collection::Companies, &id).await
}

pub async fn list_events(State(state): State<AppState>) -> ApiResult<Json<Vec<Value>>> {
    list_collection(&state, Collection::Events).await
}

pub async fn create_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidatedJson(payload): ValidatedJson<NewEvent>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    insert_document(&state, &headers, Collection::Events, |id| {
        payload.into_event(id)
    })
    .await
}

pub async fn delete_event(
    State(state): State<AppState>,
    auth: Authorized<Write>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    delete_document(&state, auth.executor_id(), Collection::Events, &id).await
}

pub async fn list_resources(State(state): State<AppState>) -> ApiResult<Json<Vec<Value>>> {
    list_collection(&state, Collection::Resources).await
}

pub async fn create_resource(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidatedJson(payload): ValidatedJson<NewResource>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    insert_document(&state, &headers, Collection::Resources, |id| {
        payload.into_resource(id)
    })
    .await
}

pub async fn delete_resource(
    State(state): State<AppState>,
    auth: Authorized<Write>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    delete_document(&state, auth.executor_id(), Collection::Resources, &id).await
}
