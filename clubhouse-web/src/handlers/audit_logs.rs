//! Audit log viewer

use crate::{
    auth::{Authorized, Manage},
    error::ApiResult,
    state::AppState,
};
use axum::{
    extract::{Query, State},
    response::Json,
};
use clubhouse_core::AuditLogEntry;
use serde::Deserialize;

const DEFAULT_LIMIT: usize = 100;
const MAX_LIMIT: usize = 1000;

#[derive(Debug, Default, Deserialize)]
pub struct AuditLogQuery {
    pub limit: Option<usize>,
}

/// Newest entries first
pub async fn list_audit_logs(
    State(state): State<AppState>,
    _auth: Authorized<Manage>,
    Query(query): Query<AuditLogQuery>,
) -> ApiResult<Json<Vec<AuditLogEntry>>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    Ok(Json(state.audit.recent(limit).await?))
}
