//! Unified error handling system
//!
//! Structured error types with context, so every failure can be logged with
//! an id while the HTTP layer decides how much of it a caller gets to see.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};

pub type ClubResult<T> = Result<T, ClubError>;

/// Error context providing additional information for debugging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Timestamp when error occurred
    pub timestamp: DateTime<Utc>,
    /// Component where error originated
    pub component: String,
    /// Operation being performed when error occurred
    pub operation: Option<String>,
    /// Additional metadata
    pub metadata: std::collections::HashMap<String, String>,
    /// Recovery suggestions
    pub recovery_suggestions: Vec<String>,
}

impl ErrorContext {
    pub fn new(component: &str) -> Self {
        Self {
            error_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            component: component.to_string(),
            operation: None,
            metadata: std::collections::HashMap::new(),
            recovery_suggestions: Vec::new(),
        }
    }

    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.recovery_suggestions.push(suggestion.to_string());
        self
    }
}

/// A single field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Path of the offending field, e.g. `members[2].email`
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Main error type for Clubhouse
#[derive(Error, Debug)]
pub enum ClubError {
    #[error("Authentication failed: {message}")]
    Unauthenticated {
        message: String,
        context: ErrorContext,
    },

    #[error("Insufficient role: {message}")]
    Forbidden {
        message: String,
        context: ErrorContext,
    },

    #[error("Validation failed with {} field error(s)", errors.len())]
    Validation {
        errors: Vec<FieldError>,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Identity provider error: {message}")]
    IdentityProvider {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Operation timeout: {operation}")]
    Timeout {
        operation: String,
        duration_ms: u64,
        context: ErrorContext,
    },

    #[error("Resource not found: {resource}")]
    NotFound {
        resource: String,
        context: ErrorContext,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },
}

impl ClubError {
    /// Build a validation error from accumulated field errors
    pub fn validation(errors: Vec<FieldError>, component: &str) -> Self {
        ClubError::Validation {
            errors,
            context: ErrorContext::new(component),
        }
    }

    pub fn unauthenticated(message: impl Into<String>, component: &str) -> Self {
        ClubError::Unauthenticated {
            message: message.into(),
            context: ErrorContext::new(component),
        }
    }

    /// Get the error context
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            ClubError::Unauthenticated { context, .. } => Some(context),
            ClubError::Forbidden { context, .. } => Some(context),
            ClubError::Validation { context, .. } => Some(context),
            ClubError::Config { context, .. } => Some(context),
            ClubError::Storage { context, .. } => Some(context),
            ClubError::IdentityProvider { context, .. } => Some(context),
            ClubError::Timeout { context, .. } => Some(context),
            ClubError::NotFound { context, .. } => Some(context),
            ClubError::Internal { context, .. } => Some(context),
            ClubError::Io(_) | ClubError::Serialization(_) => None,
        }
    }

    /// Whether the caller's own request caused the failure.
    /// Everything else is a server-side collaborator problem.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ClubError::Unauthenticated { .. }
                | ClubError::Forbidden { .. }
                | ClubError::Validation { .. }
                | ClubError::NotFound { .. }
        )
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        let error_id = self.context().map(|c| c.error_id.as_str());
        match self {
            ClubError::Unauthenticated { .. } | ClubError::Forbidden { .. } => {
                warn!(error_id = ?error_id, error = %self, "Request denied");
            }
            ClubError::Validation { errors, .. } => {
                info!(error_id = ?error_id, fields = errors.len(), "Rejected invalid payload");
            }
            ClubError::NotFound { .. } => {
                info!(error_id = ?error_id, error = %self, "Resource not found");
            }
            ClubError::Config { .. } => {
                error!(error_id = ?error_id, error = %self, "Configuration error");
            }
            ClubError::Timeout { .. } => {
                warn!(error_id = ?error_id, error = %self, "Collaborator timed out");
            }
            _ => {
                error!(error_id = ?error_id, error = %self, "Error occurred");
            }
        }
    }
}

/// Convenience macros for creating errors with context
#[macro_export]
macro_rules! config_error {
    ($msg:expr, $component:expr) => {
        $crate::config_error!($msg, $component, "Check your configuration file")
    };
    ($msg:expr, $component:expr, $suggestion:expr) => {
        $crate::ClubError::Config {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component).with_suggestion($suggestion),
        }
    };
}

#[macro_export]
macro_rules! storage_error {
    ($msg:expr, $component:expr) => {
        $crate::ClubError::Storage {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component),
        }
    };
    ($msg:expr, $component:expr, $source:expr) => {
        $crate::ClubError::Storage {
            message: $msg.to_string(),
            source: Some(Box::new($source)),
            context: $crate::ErrorContext::new($component),
        }
    };
}

#[macro_export]
macro_rules! not_found_error {
    ($resource:expr, $component:expr) => {
        $crate::ClubError::NotFound {
            resource: $resource.to_string(),
            context: $crate::ErrorContext::new($component),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_classification() {
        let denied = ClubError::unauthenticated("no token", "test");
        assert!(denied.is_client_error());

        let invalid = ClubError::validation(vec![FieldError::new("name", "is required")], "test");
        assert!(invalid.is_client_error());
        assert_eq!(invalid.to_string(), "Validation failed with 1 field error(s)");

        let storage = storage_error!("connection refused", "test");
        assert!(!storage.is_client_error());
        assert!(storage.context().is_some());
    }

    #[test]
    fn test_field_error_display() {
        let error = FieldError::new("links[0].link", "must be a valid URL");
        assert_eq!(error.to_string(), "links[0].link: must be a valid URL");
    }
}
