//! SQLite storage
//!
//! Users and audit entries get their own tables; documents of every other
//! collection are stored as JSON text keyed by `(collection, id)`.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use clubhouse_core::{
    document_id, merge_document, not_found_error, storage_error, AuditAction, AuditLog,
    AuditLogEntry, ClubResult, Collection, DocumentStore, User, UserPatch, UserStore,
};
use serde_json::Value;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use std::str::FromStr;
use tracing::{debug, info};

/// Database user record
#[derive(Debug, sqlx::FromRow)]
struct UserRecord {
    id: String,
    username: String,
    email: Option<String>,
    provider: Option<String>,
    avatar_url: Option<String>,
    role: String,
    created_at: String, // RFC 3339
}

impl UserRecord {
    fn into_user(self) -> ClubResult<User> {
        let created_at: DateTime<Utc> = self.created_at.parse().map_err(|e| {
            storage_error!(
                format!("user {} has an unreadable created_at", self.id),
                "sqlite_store",
                e
            )
        })?;

        Ok(User {
            id: self.id,
            username: self.username,
            email: self.email,
            provider: self.provider,
            avatar_url: self.avatar_url,
            role: self.role,
            created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AuditRecord {
    id: String,
    executor_id: String,
    action: String,
    collection: String,
    timestamp: String,
}

impl AuditRecord {
    fn into_entry(self) -> ClubResult<AuditLogEntry> {
        let action: AuditAction = serde_json::from_value(Value::String(self.action))?;
        let collection: Collection = serde_json::from_value(Value::String(self.collection))?;
        let timestamp: DateTime<Utc> = self.timestamp.parse().map_err(|e| {
            storage_error!("audit entry has an unreadable timestamp", "sqlite_store", e)
        })?;

        Ok(AuditLogEntry {
            id: self.id,
            executor_id: self.executor_id,
            action,
            collection,
            timestamp,
        })
    }
}

fn db_error(operation: &str, e: sqlx::Error) -> clubhouse_core::ClubError {
    storage_error!(format!("{} failed", operation), "sqlite_store", e)
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect and create tables. `sqlite::memory:` gets a single connection
    /// so every query sees the same database.
    pub async fn connect(database_url: &str) -> ClubResult<Self> {
        info!("Connecting to database: {}", database_url);

        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| db_error("parse database url", e))?
            .create_if_missing(true);

        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| db_error("connect", e))?;

        let store = Self { pool };
        store.create_tables().await?;
        Ok(store)
    }

    async fn create_tables(&self) -> ClubResult<()> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL,
                email TEXT,
                provider TEXT,
                avatar_url TEXT,
                role TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                body TEXT NOT NULL,
                PRIMARY KEY (collection, id)
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS audit_logs (
                id TEXT PRIMARY KEY,
                executor_id TEXT NOT NULL,
                action TEXT NOT NULL,
                collection TEXT NOT NULL,
                timestamp TEXT NOT NULL
            )
            "#,
        ];

        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| db_error("create tables", e))?;
        }

        debug!("Database tables ready");
        Ok(())
    }

    fn parse_body(body: &str) -> ClubResult<Value> {
        Ok(serde_json::from_str(body)?)
    }
}

#[async_trait]
impl UserStore for SqliteStore {
    async fn get_user(&self, id: &str) -> ClubResult<Option<User>> {
        let record = sqlx::query_as::<_, UserRecord>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("get user", e))?;

        record.map(UserRecord::into_user).transpose()
    }

    async fn create_user(&self, user: User) -> ClubResult<User> {
        sqlx::query(
            "INSERT OR IGNORE INTO users (id, username, email, provider, avatar_url, role, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.provider)
        .bind(&user.avatar_url)
        .bind(&user.role)
        .bind(timestamp(&user.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("create user", e))?;

        self.get_user(&user.id)
            .await?
            .ok_or_else(|| storage_error!(format!("user {} vanished after insert", user.id), "sqlite_store"))
    }

    async fn update_user(&self, patch: UserPatch) -> ClubResult<User> {
        let mut tx = self.pool.begin().await.map_err(|e| db_error("begin", e))?;

        let record = sqlx::query_as::<_, UserRecord>("SELECT * FROM users WHERE id = ?")
            .bind(&patch.id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| db_error("get user", e))?
            .ok_or_else(|| not_found_error!(format!("users/{}", patch.id), "sqlite_store"))?;

        let mut user = record.into_user()?;
        patch.apply(&mut user);

        sqlx::query(
            "UPDATE users SET username = ?, email = ?, provider = ?, avatar_url = ?, role = ?
             WHERE id = ?",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.provider)
        .bind(&user.avatar_url)
        .bind(&user.role)
        .bind(&user.id)
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("update user", e))?;

        tx.commit().await.map_err(|e| db_error("commit", e))?;
        Ok(user)
    }

    async fn list_users(&self) -> ClubResult<Vec<User>> {
        sqlx::query_as::<_, UserRecord>("SELECT * FROM users ORDER BY created_at, id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("list users", e))?
            .into_iter()
            .map(UserRecord::into_user)
            .collect()
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn list(&self, collection: Collection) -> ClubResult<Vec<Value>> {
        let bodies: Vec<(String,)> =
            sqlx::query_as("SELECT body FROM documents WHERE collection = ? ORDER BY rowid")
                .bind(collection.as_str())
                .fetch_all(&self.pool)
                .await
                .map_err(|e| db_error("list documents", e))?;

        bodies.iter().map(|(body,)| Self::parse_body(body)).collect()
    }

    async fn get(&self, collection: Collection, id: &str) -> ClubResult<Option<Value>> {
        let body: Option<(String,)> =
            sqlx::query_as("SELECT body FROM documents WHERE collection = ? AND id = ?")
                .bind(collection.as_str())
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("get document", e))?;

        body.map(|(body,)| Self::parse_body(&body)).transpose()
    }

    async fn insert(&self, collection: Collection, document: Value) -> ClubResult<Value> {
        let id = document_id(&document)
            .ok_or_else(|| storage_error!("document has no string id", "sqlite_store"))?;

        sqlx::query("INSERT INTO documents (collection, id, body) VALUES (?, ?, ?)")
            .bind(collection.as_str())
            .bind(id)
            .bind(document.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("insert document", e))?;

        Ok(document)
    }

    async fn update_many(&self, collection: Collection, patches: Vec<Value>) -> ClubResult<Vec<Value>> {
        let mut tx = self.pool.begin().await.map_err(|e| db_error("begin", e))?;
        let mut merged = Vec::with_capacity(patches.len());

        for patch in &patches {
            let id = document_id(patch)
                .ok_or_else(|| storage_error!("patch has no string id", "sqlite_store"))?;

            let (body,): (String,) =
                sqlx::query_as("SELECT body FROM documents WHERE collection = ? AND id = ?")
                    .bind(collection.as_str())
                    .bind(id)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(|e| db_error("get document", e))?
                    .ok_or_else(|| not_found_error!(format!("{}/{}", collection, id), "sqlite_store"))?;

            let mut document = Self::parse_body(&body)?;
            merge_document(&mut document, patch);

            sqlx::query("UPDATE documents SET body = ? WHERE collection = ? AND id = ?")
                .bind(document.to_string())
                .bind(collection.as_str())
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(|e| db_error("update document", e))?;

            merged.push(document);
        }

        // Dropping the transaction on an early return rolls it back
        tx.commit().await.map_err(|e| db_error("commit", e))?;
        Ok(merged)
    }

    async fn delete(&self, collection: Collection, id: &str) -> ClubResult<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
            .bind(collection.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("delete document", e))?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl AuditLog for SqliteStore {
    async fn append(&self, entry: AuditLogEntry) -> ClubResult<()> {
        sqlx::query(
            "INSERT INTO audit_logs (id, executor_id, action, collection, timestamp)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&entry.id)
        .bind(&entry.executor_id)
        .bind(entry.action.to_string())
        .bind(entry.collection.as_str())
        .bind(timestamp(&entry.timestamp))
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("append audit entry", e))?;

        Ok(())
    }

    async fn list(&self, limit: usize) -> ClubResult<Vec<AuditLogEntry>> {
        sqlx::query_as::<_, AuditRecord>("SELECT * FROM audit_logs ORDER BY rowid DESC LIMIT ?")
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("list audit entries", e))?
            .into_iter()
            .map(AuditRecord::into_entry)
            .collect()
    }
}
