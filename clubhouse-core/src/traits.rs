//! Collaborator trait definitions
//!
//! The authorization core consumes these; it never implements storage or
//! token verification itself.

use crate::error::ClubResult;
use crate::types::*;
use async_trait::async_trait;
use serde_json::Value;

/// Verifies an opaque identity token and yields the subject it belongs to
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Invalid or expired tokens fail with `ClubError::Unauthenticated`,
    /// slow providers with `ClubError::Timeout`.
    async fn verify(&self, token: &str) -> ClubResult<VerifiedIdentity>;
}

/// User record storage
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user(&self, id: &str) -> ClubResult<Option<User>>;

    /// Insert a new user; an existing record with the same id is returned untouched
    async fn create_user(&self, user: User) -> ClubResult<User>;

    /// Apply a partial update, failing with `NotFound` for unknown ids
    async fn update_user(&self, patch: UserPatch) -> ClubResult<User>;

    async fn list_users(&self) -> ClubResult<Vec<User>>;
}

/// Schemaless document storage keyed by collection and id
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list(&self, collection: Collection) -> ClubResult<Vec<Value>>;

    async fn get(&self, collection: Collection, id: &str) -> ClubResult<Option<Value>>;

    /// Store a document. The document must be a JSON object with a string `id`.
    async fn insert(&self, collection: Collection, document: Value) -> ClubResult<Value>;

    /// Merge each patch's top-level fields into the stored document with the same `id`.
    /// Returns the merged documents in patch order.
    async fn update_many(&self, collection: Collection, patches: Vec<Value>)
        -> ClubResult<Vec<Value>>;

    /// Returns whether a document was removed
    async fn delete(&self, collection: Collection, id: &str) -> ClubResult<bool>;
}

/// Append-only audit trail
#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn append(&self, entry: AuditLogEntry) -> ClubResult<()>;

    /// Entries ordered newest first
    async fn list(&self, limit: usize) -> ClubResult<Vec<AuditLogEntry>>;
}

/// Shallow-merge `patch` into `target`, the way document stores apply partial updates.
/// Returns false when either side is not a JSON object.
pub fn merge_document(target: &mut Value, patch: &Value) -> bool {
    match (target.as_object_mut(), patch.as_object()) {
        (Some(target), Some(patch)) => {
            for (key, value) in patch {
                target.insert(key.clone(), value.clone());
            }
            true
        }
        _ => false,
    }
}

/// Extract the string `id` of a document
pub fn document_id(document: &Value) -> Option<&str> {
    document.get("id").and_then(Value::as_str)
}
