//! Clubhouse CLI - operator commands for the club admin
//!
//! Checks configuration, shows the role order, mints development tokens
//! and changes user roles directly in storage.

use chrono::Duration;
use clap::{Parser, Subcommand};
use clubhouse_auth::{build_from_config, RoleRegistry};
use clubhouse_core::{
    init_logging, log_operation_error, log_operation_start, log_operation_success, AuthConfig,
    ClubConfig, ClubError, ClubResult, FieldError, LoggingConfig, UserPatch,
};
use clubhouse_web::{
    auth::{Claims, JwtIdentityProvider},
    storage::Backends,
};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "clubhouse")]
#[command(about = "Operator tools for the Clubhouse admin")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate configuration and resolve roles and capabilities
    Check,

    /// Print the role order, least privileged first
    Roles {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Mint a signed identity token for local development
    Token {
        /// Subject (user id) the token identifies
        #[arg(short, long)]
        subject: String,

        /// Display name claim
        #[arg(long)]
        name: Option<String>,

        /// Email claim
        #[arg(long)]
        email: Option<String>,

        /// Lifetime in minutes
        #[arg(long, default_value = "60")]
        ttl_minutes: i64,
    },

    /// Set a user's role in the configured store
    Promote {
        /// User id
        #[arg(short, long)]
        user: String,

        /// Role label, must be registered
        #[arg(short, long)]
        role: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();

    let log_config = if cli.verbose {
        LoggingConfig::default().with_level("debug")
    } else {
        LoggingConfig::default().with_level("warn")
    };
    init_logging(&log_config)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Check => handle_check(&config)?,
        Commands::Roles { json } => handle_roles(&config, json)?,
        Commands::Token {
            subject,
            name,
            email,
            ttl_minutes,
        } => handle_token(&config, subject, name, email, ttl_minutes)?,
        Commands::Promote { user, role } => handle_promote(&config, user, role).await?,
    }

    Ok(())
}

fn load_config(config_path: Option<&PathBuf>) -> ClubResult<ClubConfig> {
    let config = if let Some(path) = config_path {
        info!("Loading configuration from {:?}", path);
        ClubConfig::from_file(path)?
    } else {
        let default_path = PathBuf::from("clubhouse.toml");
        if default_path.exists() {
            info!("Loading configuration from {:?}", default_path);
            ClubConfig::from_file(&default_path)?
        } else {
            info!("No configuration file found, using defaults");
            ClubConfig::default()
        }
    };

    Ok(config.apply_env())
}

fn handle_check(config: &ClubConfig) -> ClubResult<()> {
    log_operation_start!("check_config");

    if let Err(e) = config.validate() {
        log_operation_error!("validate_config", e);
        return Err(e);
    }

    let (evaluator, capabilities) = match build_from_config(&config.auth) {
        Ok(resolved) => resolved,
        Err(e) => {
            log_operation_error!("resolve_capabilities", e);
            return Err(e);
        }
    };
    let registry = evaluator.registry();

    println!("Configuration OK");
    println!("  Roles: {}", registry.labels().join(" < "));
    println!(
        "  New users start as: {}",
        registry.label(registry.lowest())
    );
    for capability in [capabilities.read, capabilities.write, capabilities.manage] {
        println!(
            "  {:<7} requires {}",
            capability.name(),
            registry.label(capability.threshold())
        );
    }
    println!(
        "  Storage: {}",
        config
            .storage
            .database_url
            .as_deref()
            .unwrap_or("in-memory")
    );

    log_operation_success!("check_config", roles = registry.labels().len());
    Ok(())
}

fn handle_roles(config: &ClubConfig, json: bool) -> ClubResult<()> {
    let registry = RoleRegistry::from_config(&config.auth)?;
    let first_sign_in = registry.lowest();

    if json {
        let roles: Vec<serde_json::Value> = registry
            .iter()
            .map(|role| {
                serde_json::json!({
                    "label": registry.label(role),
                    "rank": role.index(),
                    "first_sign_in": role == first_sign_in,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&roles)?);
        return Ok(());
    }

    for role in registry.iter() {
        let marker = if role == first_sign_in { " (first sign-in)" } else { "" };
        println!("{:>2}  {}{}", role.index(), registry.label(role), marker);
    }
    Ok(())
}

fn handle_token(
    config: &ClubConfig,
    subject: String,
    name: Option<String>,
    email: Option<String>,
    ttl_minutes: i64,
) -> ClubResult<()> {
    log_operation_start!("issue_token", subject = %subject);

    if ttl_minutes <= 0 {
        return Err(ClubError::validation(
            vec![FieldError::new("ttl_minutes", "must be positive")],
            "cli",
        ));
    }

    let provider = JwtIdentityProvider::new(&config.auth);
    let mut claims = Claims::new(subject.clone(), Duration::minutes(ttl_minutes));
    if let Some(name) = name {
        claims = claims.with_name(name);
    }
    if let Some(email) = email {
        claims = claims.with_email(email);
    }

    let token = match provider.issue(claims) {
        Ok(token) => token,
        Err(e) => {
            log_operation_error!("issue_token", e, subject = %subject);
            return Err(e);
        }
    };

    if config.auth.jwt_secret == AuthConfig::default().jwt_secret {
        eprintln!("warning: token is signed with the development secret");
    }
    println!("{}", token);

    log_operation_success!("issue_token", subject = %subject, ttl_minutes = ttl_minutes);
    Ok(())
}

async fn handle_promote(config: &ClubConfig, user: String, role: String) -> ClubResult<()> {
    log_operation_start!("promote_user", user = %user, role = %role);

    let registry = RoleRegistry::from_config(&config.auth)?;
    if !registry.contains(&role) {
        error!("Unknown role '{}'", role);
        return Err(ClubError::validation(
            vec![FieldError::new(
                "role",
                format!("must be one of: {}", registry.labels().join(", ")),
            )],
            "cli",
        ));
    }

    if config.storage.database_url.is_none() {
        eprintln!("warning: no database configured, the change will not persist");
    }

    let backends = Backends::from_config(&config.storage).await?;
    let patch = UserPatch {
        id: user.clone(),
        role: Some(role.clone()),
        ..UserPatch::default()
    };

    match backends.users.update_user(patch).await {
        Ok(updated) => {
            println!("{} is now '{}'", updated.id, updated.role);
            log_operation_success!("promote_user", user = %user, role = %role);
            Ok(())
        }
        Err(e) => {
            log_operation_error!("promote_user", e, user = %user);
            Err(e)
        }
    }
}
