//! Configuration management

use crate::error::{ClubError, ClubResult, ErrorContext};
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Top-level configuration, one section per concern
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClubConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub catalog: CatalogConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Accept cross-origin requests from any origin
    pub dev_mode: bool,
    /// Maximum accepted request body in bytes
    pub body_limit: usize,
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            dev_mode: false,
            body_limit: 2 * 1024 * 1024,
            allowed_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Role ordering and token verification settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Role labels from least to most privileged. New users start at the
    /// first one.
    pub roles: Vec<String>,
    /// Request header carrying the identity token
    pub token_header: String,
    pub jwt_secret: String,
    pub jwt_issuer: Option<String>,
    /// Upper bound on a single identity-provider verification
    pub identity_timeout_ms: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            roles: ["none", "read", "write", "manage", "admin"]
                .iter()
                .map(|r| r.to_string())
                .collect(),
            token_header: "token".to_string(),
            jwt_secret: "clubhouse-dev-secret-change-in-production".to_string(),
            jwt_issuer: None,
            identity_timeout_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// `sqlite:` URL; in-memory maps when absent
    pub database_url: Option<String>,
}

/// Enumerations that tag documents (member positions, event types, ...)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub member_positions: Vec<String>,
    pub member_terms: Vec<String>,
    pub event_types: Vec<String>,
    pub resource_types: Vec<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        fn owned(values: &[&str]) -> Vec<String> {
            values.iter().map(|v| v.to_string()).collect()
        }

        Self {
            member_positions: owned(&[
                "president",
                "vice-president",
                "treasurer",
                "secretary",
                "officer",
                "member",
                "alumni",
            ]),
            member_terms: owned(&["fall", "winter", "spring", "summer"]),
            event_types: owned(&["meeting", "workshop", "social", "competition", "talk"]),
            resource_types: owned(&["article", "video", "course", "tool", "book"]),
        }
    }
}

fn config_err(message: String, operation: &str) -> ClubError {
    ClubError::Config {
        message,
        source: None,
        context: ErrorContext::new("config").with_operation(operation),
    }
}

impl ClubConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> ClubResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ClubError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> ClubResult<Self> {
        toml::from_str(content).map_err(|e| ClubError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_suggestion("Check TOML syntax in config file"),
        })
    }

    /// Override selected values from environment variables
    pub fn apply_env(mut self) -> Self {
        if let Ok(host) = std::env::var("CLUBHOUSE_HOST") {
            self.server.host = host;
        }
        if let Some(port) = std::env::var("CLUBHOUSE_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
        {
            self.server.port = port;
        }
        if let Ok(secret) = std::env::var("CLUBHOUSE_JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.storage.database_url = Some(url);
        }
        self
    }

    /// Structural checks. Role ordering itself is checked when the role
    /// registry is built from `auth`.
    pub fn validate(&self) -> ClubResult<()> {
        if self.server.host.is_empty() {
            return Err(config_err("server.host cannot be empty".into(), "validate"));
        }

        if self.server.port == 0 {
            return Err(config_err("server.port cannot be 0".into(), "validate"));
        }

        if self.auth.token_header.is_empty()
            || header_name_is_invalid(&self.auth.token_header)
        {
            return Err(config_err(
                format!("auth.token_header '{}' is not a valid header name", self.auth.token_header),
                "validate",
            ));
        }

        if self.auth.jwt_secret.len() < 16 {
            return Err(config_err(
                "auth.jwt_secret must be at least 16 bytes".into(),
                "validate",
            ));
        }

        if self.auth.identity_timeout_ms == 0 {
            return Err(config_err(
                "auth.identity_timeout_ms must be greater than 0".into(),
                "validate",
            ));
        }

        for (name, values) in [
            ("catalog.member_positions", &self.catalog.member_positions),
            ("catalog.member_terms", &self.catalog.member_terms),
            ("catalog.event_types", &self.catalog.event_types),
            ("catalog.resource_types", &self.catalog.resource_types),
        ] {
            let unique: HashSet<&String> = values.iter().collect();
            if unique.len() != values.len() {
                return Err(config_err(format!("{} contains duplicates", name), "validate"));
            }
        }

        Ok(())
    }
}

/// Header names are lowercase token characters
fn header_name_is_invalid(name: &str) -> bool {
    !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
}
