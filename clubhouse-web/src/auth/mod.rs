//! Request authorization
//!
//! Every protected request walks the same pipeline:
//!
//! ```text
//! Unauthenticated -> TokenVerified -> UserResolved -> Authorized
//!        \                 \               \
//!         +-----------------+---------------+----> Denied
//! ```
//!
//! A denial is logged with its cause and answered with one uniform 401.
//! Collaborator failures (storage, a broken identity provider) are not
//! denials; they surface as a generic 500.

pub mod jwt;

pub use jwt::{Claims, JwtIdentityProvider};

use crate::{error::ApiError, state::AppState};
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, HeaderName},
};
use clubhouse_auth::{AuthContext, Capabilities, Capability, PermissionEvaluator};
use clubhouse_core::{
    config_error, with_timeout, AuthConfig, ClubError, ClubResult, ErrorContext, IdentityProvider,
    User, UserStore, VerifiedIdentity,
};
use std::{marker::PhantomData, sync::Arc};
use tracing::{debug, warn};

/// Why a request was turned away. Only ever logged, never returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    MissingToken,
    InvalidToken,
    IdentityTimeout,
    UnknownSubject,
    InsufficientRole,
}

impl DenialReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenialReason::MissingToken => "missing_token",
            DenialReason::InvalidToken => "invalid_token",
            DenialReason::IdentityTimeout => "identity_timeout",
            DenialReason::UnknownSubject => "unknown_subject",
            DenialReason::InsufficientRole => "insufficient_role",
        }
    }

    fn into_error(self) -> ClubError {
        let context = ErrorContext::new("authorizer").with_operation(self.as_str());
        match self {
            DenialReason::InsufficientRole => ClubError::Forbidden {
                message: self.as_str().to_string(),
                context,
            },
            _ => ClubError::Unauthenticated {
                message: self.as_str().to_string(),
                context,
            },
        }
    }
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pipeline states for one request
#[derive(Debug)]
pub enum AuthState {
    Unauthenticated,
    TokenVerified(VerifiedIdentity),
    UserResolved(User),
    Authorized(AuthContext),
    Denied(DenialReason),
}

/// Runs the authorization pipeline against the configured collaborators
#[derive(Clone)]
pub struct Authorizer {
    identity: Arc<dyn IdentityProvider>,
    users: Arc<dyn UserStore>,
    evaluator: PermissionEvaluator,
    token_header: HeaderName,
    timeout_ms: u64,
}

impl Authorizer {
    pub fn new(
        config: &AuthConfig,
        identity: Arc<dyn IdentityProvider>,
        users: Arc<dyn UserStore>,
        evaluator: PermissionEvaluator,
    ) -> ClubResult<Self> {
        let token_header = HeaderName::from_bytes(config.token_header.as_bytes()).map_err(|_| {
            config_error!(
                format!("auth.token_header '{}' is not a valid header name", config.token_header),
                "authorizer",
                "Set auth.token_header to a lowercase token such as `token`"
            )
        })?;

        Ok(Self {
            identity,
            users,
            evaluator,
            token_header,
            timeout_ms: config.identity_timeout_ms,
        })
    }

    pub fn token_header(&self) -> &HeaderName {
        &self.token_header
    }

    fn token<'h>(&self, headers: &'h HeaderMap) -> Option<&'h str> {
        headers
            .get(&self.token_header)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }

    /// Move the pipeline one step forward. `capability` is checked once the
    /// user is resolved; `None` accepts any resolved user.
    async fn step(
        &self,
        state: AuthState,
        headers: &HeaderMap,
        capability: Option<Capability>,
    ) -> ClubResult<AuthState> {
        let next = match state {
            AuthState::Unauthenticated => match self.token(headers) {
                None => AuthState::Denied(DenialReason::MissingToken),
                Some(token) => match self.verify(token).await? {
                    Ok(identity) => AuthState::TokenVerified(identity),
                    Err(reason) => AuthState::Denied(reason),
                },
            },
            AuthState::TokenVerified(identity) => {
                match self.users.get_user(&identity.subject).await? {
                    Some(user) => AuthState::UserResolved(user),
                    None => AuthState::Denied(DenialReason::UnknownSubject),
                }
            }
            AuthState::UserResolved(user) => {
                let context = AuthContext::signed_in(user, self.evaluator.clone());
                match capability {
                    Some(capability) if !context.can(capability) => {
                        AuthState::Denied(DenialReason::InsufficientRole)
                    }
                    _ => AuthState::Authorized(context),
                }
            }
            terminal @ (AuthState::Authorized(_) | AuthState::Denied(_)) => terminal,
        };

        Ok(next)
    }

    async fn run(&self, headers: &HeaderMap, capability: Option<Capability>) -> ClubResult<AuthState> {
        let mut state = AuthState::Unauthenticated;
        loop {
            state = self.step(state, headers, capability).await?;
            if matches!(state, AuthState::Authorized(_) | AuthState::Denied(_)) {
                return Ok(state);
            }
        }
    }

    /// Verify a token within the configured deadline. The outer error is a
    /// collaborator failure; the inner one is a denial.
    async fn verify(&self, token: &str) -> ClubResult<Result<VerifiedIdentity, DenialReason>> {
        match with_timeout(self.identity.verify(token), self.timeout_ms, "verify_token").await {
            Ok(identity) => Ok(Ok(identity)),
            Err(ClubError::Unauthenticated { .. }) => Ok(Err(DenialReason::InvalidToken)),
            Err(ClubError::Timeout { .. }) => Ok(Err(DenialReason::IdentityTimeout)),
            Err(e) => Err(e),
        }
    }

    fn deny(&self, reason: DenialReason, capability: Option<Capability>) -> ApiError {
        warn!(
            reason = reason.as_str(),
            capability = capability.map(|c| c.name()).unwrap_or("-"),
            "Request denied"
        );
        ApiError::from(reason.into_error())
    }

    /// Gate for a protected operation. Nothing may be written before this
    /// returns `Ok`.
    pub async fn authorize(&self, headers: &HeaderMap, capability: Capability) -> Result<AuthContext, ApiError> {
        match self.run(headers, Some(capability)).await? {
            AuthState::Authorized(context) => {
                debug!(capability = capability.name(), "{}", context.summary());
                Ok(context)
            }
            AuthState::Denied(reason) => Err(self.deny(reason, Some(capability))),
            _ => Err(ApiError::from(ClubError::Internal {
                message: "authorization pipeline stopped early".to_string(),
                source: None,
                context: ErrorContext::new("authorizer"),
            })),
        }
    }

    /// The caller's context for display purposes: anonymous unless a valid
    /// token maps to a stored user.
    pub async fn current(&self, headers: &HeaderMap) -> Result<AuthContext, ApiError> {
        match self.run(headers, None).await? {
            AuthState::Authorized(context) => Ok(context),
            AuthState::Denied(reason) => {
                debug!(reason = reason.as_str(), "Treating caller as anonymous");
                Ok(AuthContext::anonymous(self.evaluator.clone()))
            }
            _ => Ok(AuthContext::anonymous(self.evaluator.clone())),
        }
    }

    /// Token verification alone, for sign-in where no user record exists yet
    pub async fn verify_identity(&self, headers: &HeaderMap) -> Result<VerifiedIdentity, ApiError> {
        let Some(token) = self.token(headers) else {
            return Err(self.deny(DenialReason::MissingToken, None));
        };

        match self.verify(token).await? {
            Ok(identity) => Ok(identity),
            Err(reason) => Err(self.deny(reason, None)),
        }
    }
}

/// Selects one of the application's capabilities at the type level
pub trait RequiredCapability {
    fn select(capabilities: &Capabilities) -> Capability;
}

pub struct Read;
pub struct Write;
pub struct Manage;

impl RequiredCapability for Read {
    fn select(capabilities: &Capabilities) -> Capability {
        capabilities.read
    }
}

impl RequiredCapability for Write {
    fn select(capabilities: &Capabilities) -> Capability {
        capabilities.write
    }
}

impl RequiredCapability for Manage {
    fn select(capabilities: &Capabilities) -> Capability {
        capabilities.manage
    }
}

/// Extractor for body-less routes: resolves to the caller's context only
/// when they hold capability `C`.
///
/// Routes with a JSON body validate it first and then call
/// [`Authorizer::authorize`] themselves, because axum runs part extractors
/// before the body is read.
pub struct Authorized<C> {
    pub context: AuthContext,
    _capability: PhantomData<C>,
}

impl<C> Authorized<C> {
    pub fn executor_id(&self) -> &str {
        self.context.user_id().unwrap_or_default()
    }
}

impl<C> FromRequestParts<AppState> for Authorized<C>
where
    C: RequiredCapability + Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let capability = C::select(&state.capabilities);
        let context = state.authorizer.authorize(&parts.headers, capability).await?;

        Ok(Self {
            context,
            _capability: PhantomData,
        })
    }
}

/// The caller's context, anonymous when no valid session exists
pub struct CurrentContext(pub AuthContext);

impl FromRequestParts<AppState> for CurrentContext {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(Self(state.authorizer.current(&parts.headers).await?))
    }
}
