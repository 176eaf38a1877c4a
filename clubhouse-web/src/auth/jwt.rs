//! HS256 identity tokens
//!
//! The shipped [`IdentityProvider`]: tokens are JWTs signed with the
//! configured secret, and the `sub` claim names the user record.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use clubhouse_core::{
    AuthConfig, ClubError, ClubResult, ErrorContext, IdentityProvider, VerifiedIdentity,
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    /// Upstream sign-in provider, e.g. `github`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    /// Issued at (timestamp)
    pub iat: i64,
    /// Expiration time (timestamp)
    pub exp: i64,
}

impl Claims {
    pub fn new(subject: impl Into<String>, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: subject.into(),
            name: None,
            email: None,
            picture: None,
            provider: None,
            iss: None,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    fn into_identity(self) -> VerifiedIdentity {
        VerifiedIdentity {
            subject: self.sub,
            email: self.email,
            name: self.name,
            picture: self.picture,
            provider: self.provider,
        }
    }
}

pub struct JwtIdentityProvider {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    issuer: Option<String>,
}

impl JwtIdentityProvider {
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.jwt_secret.as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        if let Some(issuer) = &config.jwt_issuer {
            validation.set_issuer(&[issuer]);
            // `iss` is only compared when present unless it is also required
            validation.set_required_spec_claims(&["exp", "sub", "iss"]);
        }

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            issuer: config.jwt_issuer.clone(),
        }
    }

    /// Sign a token for the given claims, stamping the configured issuer
    pub fn issue(&self, mut claims: Claims) -> ClubResult<String> {
        if claims.iss.is_none() {
            claims.iss = self.issuer.clone();
        }

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(|e| {
            ClubError::IdentityProvider {
                message: "Failed to sign token".to_string(),
                source: Some(Box::new(e)),
                context: ErrorContext::new("jwt").with_operation("issue"),
            }
        })
    }

    /// Convenience for development tooling
    pub fn issue_token(&self, subject: &str, ttl: Duration) -> ClubResult<String> {
        self.issue(Claims::new(subject, ttl))
    }
}

#[async_trait]
impl IdentityProvider for JwtIdentityProvider {
    async fn verify(&self, token: &str) -> ClubResult<VerifiedIdentity> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            debug!("Token rejected: {}", e);
            ClubError::unauthenticated(format!("invalid token: {}", e), "jwt")
        })?;

        Ok(data.claims.into_identity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(issuer: Option<&str>) -> JwtIdentityProvider {
        JwtIdentityProvider::new(&AuthConfig {
            jwt_secret: "unit-test-secret-0123456789".to_string(),
            jwt_issuer: issuer.map(str::to_string),
            ..AuthConfig::default()
        })
    }

    #[tokio::test]
    async fn test_issued_token_verifies() {
        let provider = provider(None);
        let token = provider
            .issue(
                Claims::new("u1", Duration::minutes(5))
                    .with_name("Ada")
                    .with_email("ada@example.org")
                    .with_provider("github"),
            )
            .unwrap();

        let identity = provider.verify(&token).await.unwrap();
        assert_eq!(identity.subject, "u1");
        assert_eq!(identity.name.as_deref(), Some("Ada"));
        assert_eq!(identity.provider.as_deref(), Some("github"));
    }

    #[tokio::test]
    async fn test_expired_token_is_unauthenticated() {
        let provider = provider(None);
        let token = provider.issue_token("u1", Duration::hours(-2)).unwrap();

        assert!(matches!(
            provider.verify(&token).await,
            Err(ClubError::Unauthenticated { .. })
        ));
    }

    #[tokio::test]
    async fn test_wrong_secret_or_issuer_is_rejected() {
        let token = provider(None).issue_token("u1", Duration::minutes(5)).unwrap();

        let other = JwtIdentityProvider::new(&AuthConfig {
            jwt_secret: "a-completely-different-secret".to_string(),
            ..AuthConfig::default()
        });
        assert!(other.verify(&token).await.is_err());

        // Token carries no issuer, provider requires one
        assert!(provider(Some("clubhouse")).verify(&token).await.is_err());
        assert!(provider(None).verify("not-a-jwt").await.is_err());
    }

    #[tokio::test]
    async fn test_configured_issuer_requires_iss_claim() {
        let provider = provider(Some("clubhouse"));

        let unstamped = Claims::new("u1", Duration::minutes(5));
        let token = encode(&Header::new(Algorithm::HS256), &unstamped, &provider.encoding).unwrap();
        assert!(matches!(
            provider.verify(&token).await,
            Err(ClubError::Unauthenticated { .. })
        ));

        let foreign = provider
            .issue(Claims {
                iss: Some("someone-else".to_string()),
                ..Claims::new("u1", Duration::minutes(5))
            })
            .unwrap();
        assert!(provider.verify(&foreign).await.is_err());
    }

    #[tokio::test]
    async fn test_issuer_is_stamped() {
        let provider = provider(Some("clubhouse"));
        let token = provider.issue_token("u2", Duration::minutes(5)).unwrap();

        assert_eq!(provider.verify(&token).await.unwrap().subject, "u2");
    }
}
