//! HTTP error mapping
//!
//! Every handler error funnels through [`ApiError`]. Authentication and
//! authorization failures share one response so a caller cannot tell which
//! step rejected them.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use clubhouse_core::{ClubError, FieldError};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ApiError(#[from] ClubError);

impl ApiError {
    pub fn inner(&self) -> &ClubError {
        &self.0
    }

    pub fn status(&self) -> StatusCode {
        if !self.0.is_client_error() {
            return StatusCode::INTERNAL_SERVER_ERROR;
        }

        match &self.0 {
            ClubError::Unauthenticated { .. } | ClubError::Forbidden { .. } => {
                StatusCode::UNAUTHORIZED
            }
            ClubError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ClubError::NotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(ClubError::validation(
            vec![FieldError::new("body", rejection.body_text())],
            "request_body",
        ))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self.0 {
            // Denials are logged with their cause by the authorizer
            ClubError::Unauthenticated { .. } | ClubError::Forbidden { .. } => json!({
                "error": "unauthorized",
                "message": "Authentication required",
            }),
            ClubError::Validation { errors, .. } => {
                self.0.log();
                json!({
                    "error": "validation_failed",
                    "message": "Request payload is invalid",
                    "fields": errors,
                })
            }
            ClubError::NotFound { .. } => {
                self.0.log();
                json!({
                    "error": "not_found",
                    "message": "Resource not found",
                })
            }
            _ => {
                self.0.log();
                json!({
                    "error": "internal_error",
                    "message": "Internal server error",
                    "error_id": self.0.context().map(|c| c.error_id.clone()),
                })
            }
        };

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
