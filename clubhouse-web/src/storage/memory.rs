//! In-memory storage, used for development and tests

use async_trait::async_trait;
use clubhouse_core::{
    document_id, merge_document, not_found_error, storage_error, AuditLog, AuditLogEntry,
    ClubResult, Collection, DocumentStore, User, UserPatch, UserStore,
};
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<String, User>>,
    documents: RwLock<HashMap<Collection, Vec<Value>>>,
    audit: RwLock<Vec<AuditLogEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get_user(&self, id: &str) -> ClubResult<Option<User>> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn create_user(&self, user: User) -> ClubResult<User> {
        let mut users = self.users.write().await;
        let stored = users.entry(user.id.clone()).or_insert(user);
        Ok(stored.clone())
    }

    async fn update_user(&self, patch: UserPatch) -> ClubResult<User> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&patch.id)
            .ok_or_else(|| not_found_error!(format!("users/{}", patch.id), "memory_store"))?;

        patch.apply(user);
        Ok(user.clone())
    }

    async fn list_users(&self) -> ClubResult<Vec<User>> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(users)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list(&self, collection: Collection) -> ClubResult<Vec<Value>> {
        Ok(self
            .documents
            .read()
            .await
            .get(&collection)
            .cloned()
            .unwrap_or_default())
    }

    async fn get(&self, collection: Collection, id: &str) -> ClubResult<Option<Value>> {
        Ok(self
            .documents
            .read()
            .await
            .get(&collection)
            .and_then(|docs| docs.iter().find(|d| document_id(d) == Some(id)))
            .cloned())
    }

    async fn insert(&self, collection: Collection, document: Value) -> ClubResult<Value> {
        let id = document_id(&document)
            .ok_or_else(|| storage_error!("document has no string id", "memory_store"))?
            .to_string();

        let mut documents = self.documents.write().await;
        let docs = documents.entry(collection).or_default();
        if docs.iter().any(|d| document_id(d) == Some(id.as_str())) {
            return Err(storage_error!(
                format!("{}/{} already exists", collection, id),
                "memory_store"
            ));
        }

        docs.push(document.clone());
        debug!(%collection, %id, "Inserted document");
        Ok(document)
    }

    async fn update_many(&self, collection: Collection, patches: Vec<Value>) -> ClubResult<Vec<Value>> {
        let mut documents = self.documents.write().await;
        let docs = documents.entry(collection).or_default();

        // Resolve every target first so a missing id leaves the collection untouched
        let mut targets = Vec::with_capacity(patches.len());
        for patch in &patches {
            let id = document_id(patch)
                .ok_or_else(|| storage_error!("patch has no string id", "memory_store"))?;
            let index = docs
                .iter()
                .position(|d| document_id(d) == Some(id))
                .ok_or_else(|| not_found_error!(format!("{}/{}", collection, id), "memory_store"))?;
            targets.push(index);
        }

        let mut merged = Vec::with_capacity(patches.len());
        for (index, patch) in targets.into_iter().zip(&patches) {
            merge_document(&mut docs[index], patch);
            merged.push(docs[index].clone());
        }

        Ok(merged)
    }

    async fn delete(&self, collection: Collection, id: &str) -> ClubResult<bool> {
        let mut documents = self.documents.write().await;
        let Some(docs) = documents.get_mut(&collection) else {
            return Ok(false);
        };

        let before = docs.len();
        docs.retain(|d| document_id(d) != Some(id));
        Ok(docs.len() != before)
    }
}

#[async_trait]
impl AuditLog for MemoryStore {
    async fn append(&self, entry: AuditLogEntry) -> ClubResult<()> {
        self.audit.write().await.push(entry);
        Ok(())
    }

    async fn list(&self, limit: usize) -> ClubResult<Vec<AuditLogEntry>> {
        Ok(self
            .audit
            .read()
            .await
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }
}
