//! Audit trail recording
//!
//! Entries are appended on a spawned task. The protected operation has
//! already succeeded by the time `record` is called and never waits for it.

use clubhouse_core::{AuditAction, AuditLog, AuditLogEntry, ClubResult, Collection};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct AuditRecorder {
    log: Arc<dyn AuditLog>,
}

impl AuditRecorder {
    pub fn new(log: Arc<dyn AuditLog>) -> Self {
        Self { log }
    }

    /// Fire-and-forget append. The handle is returned for tests that need
    /// to wait on it; request handlers drop it.
    pub fn record(&self, executor_id: &str, action: AuditAction, collection: Collection) -> JoinHandle<()> {
        let entry = AuditLogEntry::new(executor_id, action, collection);
        let log = self.log.clone();

        tokio::spawn(async move {
            let id = entry.id.clone();
            match log.append(entry).await {
                Ok(()) => debug!(audit_id = %id, %action, %collection, "Audit entry written"),
                Err(e) => warn!(audit_id = %id, %action, %collection, error = %e, "Failed to write audit entry"),
            }
        })
    }

    pub async fn recent(&self, limit: usize) -> ClubResult<Vec<AuditLogEntry>> {
        self.log.list(limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use async_trait::async_trait;
    use clubhouse_core::storage_error;

    struct BrokenLog;

    #[async_trait]
    impl AuditLog for BrokenLog {
        async fn append(&self, _entry: AuditLogEntry) -> ClubResult<()> {
            Err(storage_error!("audit table is locked", "test"))
        }

        async fn list(&self, _limit: usize) -> ClubResult<Vec<AuditLogEntry>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_record_appends_entry() {
        let store = Arc::new(MemoryStore::new());
        let recorder = AuditRecorder::new(store.clone());

        recorder
            .record("u1", AuditAction::Update, Collection::Users)
            .await
            .unwrap();

        let entries = recorder.recent(10).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].executor_id, "u1");
    }

    #[tokio::test]
    async fn test_failed_append_does_not_panic() {
        let recorder = AuditRecorder::new(Arc::new(BrokenLog));
        assert!(recorder
            .record("u1", AuditAction::Delete, Collection::Events)
            .await
            .is_ok());
    }
}
