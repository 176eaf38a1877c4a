//! Async utilities

use crate::error::{ClubError, ClubResult, ErrorContext};
use tokio::time::{timeout, Duration};

/// Bound a collaborator call. Elapsing yields `ClubError::Timeout`.
pub async fn with_timeout<F, T>(future: F, timeout_ms: u64, operation_name: &str) -> ClubResult<T>
where
    F: std::future::Future<Output = ClubResult<T>>,
{
    match timeout(Duration::from_millis(timeout_ms), future).await {
        Ok(result) => result,
        Err(_) => Err(ClubError::Timeout {
            operation: operation_name.to_string(),
            duration_ms: timeout_ms,
            context: ErrorContext::new("async_utils")
                .with_operation("timeout")
                .with_metadata("timeout_ms", &timeout_ms.to_string()),
        }),
    }
}
