//! Application state shared by every handler

use crate::{
    audit::AuditRecorder,
    auth::{Authorizer, JwtIdentityProvider},
    storage::Backends,
    validators::ValidationRules,
};
use clubhouse_auth::{AuthContext, Capabilities, ControlSet, PermissionEvaluator, ViewGuard};
use clubhouse_core::{ClubConfig, ClubResult, DocumentStore, IdentityProvider, UserStore};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ClubConfig>,
    pub evaluator: PermissionEvaluator,
    pub capabilities: Capabilities,
    pub authorizer: Authorizer,
    pub users: Arc<dyn UserStore>,
    pub documents: Arc<dyn DocumentStore>,
    pub audit: AuditRecorder,
    pub rules: Arc<ValidationRules>,
}

impl AppState {
    /// Build the state from configuration: JWT identity provider plus
    /// SQLite or in-memory storage depending on `storage.database_url`.
    pub async fn new(config: ClubConfig) -> ClubResult<Self> {
        let backends = Backends::from_config(&config.storage).await?;
        let identity = Arc::new(JwtIdentityProvider::new(&config.auth));
        Self::from_parts(config, identity, backends)
    }

    /// Build the state around explicit collaborators.
    ///
    /// Fails with a configuration error if the role registry or any
    /// capability cannot be resolved; the server must not start then.
    pub fn from_parts(
        config: ClubConfig,
        identity: Arc<dyn IdentityProvider>,
        backends: Backends,
    ) -> ClubResult<Self> {
        config.validate()?;

        let (evaluator, capabilities) = clubhouse_auth::build_from_config(&config.auth)?;
        let authorizer = Authorizer::new(
            &config.auth,
            identity,
            backends.users.clone(),
            evaluator.clone(),
        )?;

        let rules = Arc::new(ValidationRules {
            catalog: config.catalog.clone(),
            roles: Arc::new(evaluator.registry().clone()),
        });

        info!(
            roles = evaluator.registry().labels().len(),
            token_header = %authorizer.token_header(),
            "Application state initialized"
        );

        Ok(Self {
            config: Arc::new(config),
            evaluator,
            capabilities,
            authorizer,
            users: backends.users,
            documents: backends.documents,
            audit: AuditRecorder::new(backends.audit),
            rules,
        })
    }

    /// The UI controls a context is entitled to
    pub fn controls(&self, context: &AuthContext) -> ControlSet {
        ViewGuard::new(context, self.capabilities).controls()
    }
}
