//! Integration test helpers
//!
//! Builds the full router around an in-memory store and a JWT provider
//! with a known secret, so tests can mint tokens for seeded users.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::Duration;
use clubhouse_core::{
    ClubConfig, ClubResult, IdentityProvider, User, UserStore, VerifiedIdentity,
};
use clubhouse_web::{auth::JwtIdentityProvider, create_app, storage::Backends, storage::MemoryStore, AppState};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, LazyLock,
};
use tokio::net::TcpListener;
use tower::ServiceExt;

// Make sure tracing is only initialized once
static TRACING: LazyLock<()> = LazyLock::new(|| {
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    } else {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_writer(std::io::sink)
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    }
});

pub const TEST_SECRET: &str = "integration-test-secret-0123456789";

pub fn test_config() -> ClubConfig {
    let mut config = ClubConfig::default();
    config.auth.jwt_secret = TEST_SECRET.to_string();
    config.auth.identity_timeout_ms = 200;
    config
}

/// Wraps another provider and counts how often it is consulted
pub struct CountingIdentity {
    inner: Arc<dyn IdentityProvider>,
    pub calls: AtomicUsize,
}

impl CountingIdentity {
    pub fn new(inner: Arc<dyn IdentityProvider>) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for CountingIdentity {
    async fn verify(&self, token: &str) -> ClubResult<VerifiedIdentity> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.verify(token).await
    }
}

/// Never answers within any reasonable deadline
pub struct StalledIdentity;

#[async_trait]
impl IdentityProvider for StalledIdentity {
    async fn verify(&self, _token: &str) -> ClubResult<VerifiedIdentity> {
        tokio::time::sleep(std::time::Duration::from_secs(30)).await;
        unreachable!("verification should have timed out")
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub jwt: Arc<JwtIdentityProvider>,
    pub identity: Arc<CountingIdentity>,
}

pub fn test_app() -> TestApp {
    test_app_with(test_config(), None)
}

/// Build the app; `identity` replaces the counting JWT provider when given
pub fn test_app_with(config: ClubConfig, identity: Option<Arc<dyn IdentityProvider>>) -> TestApp {
    LazyLock::force(&TRACING);

    let store = Arc::new(MemoryStore::new());
    let jwt = Arc::new(JwtIdentityProvider::new(&config.auth));
    let counting = Arc::new(CountingIdentity::new(jwt.clone()));
    let provider: Arc<dyn IdentityProvider> = identity.unwrap_or_else(|| counting.clone() as Arc<dyn IdentityProvider>);

    let state = AppState::from_parts(config, provider, Backends::from_store(store.clone()))
        .expect("test configuration is valid");

    TestApp {
        router: create_app(state.clone()),
        state,
        store,
        jwt,
        identity: counting,
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub raw: Vec<u8>,
}

impl TestApp {
    /// Seed a user with the given role and return a token for them
    pub async fn user_with_role(&self, id: &str, role: &str) -> String {
        self.store
            .create_user(User {
                id: id.to_string(),
                username: format!("{}-name", id),
                email: Some(format!("{}@example.org", id)),
                provider: Some("github".to_string()),
                avatar_url: None,
                role: role.to_string(),
                created_at: chrono::Utc::now(),
            })
            .await
            .unwrap();

        self.token_for(id)
    }

    /// A valid token whose subject may or may not exist in the store
    pub fn token_for(&self, subject: &str) -> String {
        self.jwt.issue_token(subject, Duration::minutes(10)).unwrap()
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("token", token);
        }

        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let raw = response.into_body().collect().await.unwrap().to_bytes().to_vec();
        let body = serde_json::from_slice(&raw).unwrap_or(Value::Null);

        TestResponse { status, body, raw }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request("GET", uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request("POST", uri, token, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request("PATCH", uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request("DELETE", uri, token, None).await
    }

    /// Audit writes are spawned; give them a moment to land
    pub async fn settle(&self) {
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
}

/// Running server on an ephemeral port
pub struct SpawnedApp {
    pub address: String,
    pub api_client: reqwest::Client,
    pub app: TestApp,
}

pub async fn spawn_app() -> SpawnedApp {
    let app = test_app();
    let router = app.router.clone();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    SpawnedApp {
        address: format!("http://127.0.0.1:{}", port),
        api_client: reqwest::Client::new(),
        app,
    }
}
