//! The API running on a file-backed SQLite store

#![cfg(feature = "sqlite")]

mod helpers;

use axum::http::StatusCode;
use clubhouse_core::{User, UserStore};
use clubhouse_web::{
    auth::JwtIdentityProvider,
    create_app,
    storage::{Backends, SqliteStore},
    AppState,
};
use helpers::test_config;
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

fn database_url(dir: &tempfile::TempDir) -> String {
    format!("sqlite://{}", dir.path().join("clubhouse.db").display())
}

async fn seed_manager(store: &SqliteStore) {
    store
        .create_user(User {
            id: "manager".to_string(),
            username: "Manager".to_string(),
            email: None,
            provider: None,
            avatar_url: None,
            role: "manage".to_string(),
            created_at: chrono::Utc::now(),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn writes_survive_reconnect() {
    let dir = tempfile::tempdir().unwrap();
    let url = database_url(&dir);
    let config = test_config();
    let jwt = Arc::new(JwtIdentityProvider::new(&config.auth));
    let token = jwt
        .issue_token("manager", chrono::Duration::minutes(5))
        .unwrap();

    {
        let store = Arc::new(SqliteStore::connect(&url).await.unwrap());
        seed_manager(&store).await;

        let state =
            AppState::from_parts(config.clone(), jwt.clone(), Backends::from_store(store)).unwrap();
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/api/v1/members")
            .header("token", &token)
            .header("content-type", "application/json")
            .body(axum::body::Body::from(
                json!({"name": "Ada", "title": "Chair"}).to_string(),
            ))
            .unwrap();

        let response = create_app(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }

    let store = SqliteStore::connect(&url).await.unwrap();
    let backends = Backends::from_store(Arc::new(store));

    let members = backends
        .documents
        .list(clubhouse_core::Collection::Members)
        .await
        .unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0]["name"], "Ada");

    let audit = backends.audit.list(10).await.unwrap();
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].executor_id, "manager");
}

#[tokio::test]
async fn configured_database_url_selects_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config();
    config.storage.database_url = Some(database_url(&dir));

    let backends = Backends::from_config(&config.storage).await.unwrap();
    backends
        .users
        .create_user(User {
            id: "u1".to_string(),
            username: "One".to_string(),
            email: None,
            provider: None,
            avatar_url: None,
            role: "read".to_string(),
            created_at: chrono::Utc::now(),
        })
        .await
        .unwrap();

    assert!(dir.path().join("clubhouse.db").exists());
}
