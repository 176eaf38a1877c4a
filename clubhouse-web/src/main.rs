//! Clubhouse Web Server
//!
//! Admin API for the club site, with role-based request authorization.

use anyhow::Context;
use clap::Parser;
use clubhouse_core::{init_logging, ClubConfig};
use clubhouse_web::ClubServerBuilder;
use std::path::PathBuf;

/// Clubhouse Web Server - club admin API
#[derive(Parser)]
#[command(name = "clubhouse-web")]
#[command(about = "HTTP API for the Clubhouse admin")]
#[command(version)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server host to bind to
    #[arg(long)]
    host: Option<String>,

    /// Server port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Development mode: accept cross-origin requests from any origin
    #[arg(long)]
    dev: bool,

    /// Database URL, e.g. sqlite://clubhouse.db
    #[arg(long)]
    database_url: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,
}

fn load_config(args: &Args) -> anyhow::Result<ClubConfig> {
    let config = match &args.config {
        Some(path) => ClubConfig::from_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => ClubConfig::default(),
    };

    let mut config = config.apply_env();

    if let Some(host) = &args.host {
        config.server.host = host.clone();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if args.dev {
        config.server.dev_mode = true;
    }
    if let Some(url) = &args.database_url {
        config.storage.database_url = Some(url.clone());
    }
    if let Some(level) = &args.log_level {
        config.logging = config.logging.with_level(level);
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load environment variables
    dotenvy::dotenv().ok();

    let config = load_config(&args)?;

    init_logging(&config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    let server = ClubServerBuilder::new()
        .config(config)
        .build()
        .await
        .context("Failed to build server")?;

    server.start().await.context("Server failed")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parsing() {
        let args = Args::parse_from(["clubhouse-web"]);
        assert!(args.host.is_none());
        assert!(!args.dev);

        let args = Args::parse_from([
            "clubhouse-web",
            "--host",
            "0.0.0.0",
            "--port",
            "3000",
            "--dev",
            "--log-level",
            "debug",
        ]);
        let config = load_config(&args).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert!(config.server.dev_mode);
        assert_eq!(config.logging.level, "debug");
    }
}
