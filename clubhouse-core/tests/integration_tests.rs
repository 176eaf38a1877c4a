//! Integration tests for clubhouse-core infrastructure

use clubhouse_core::{
    config_error, init_logging, not_found_error, storage_error, with_timeout, ClubConfig,
    ClubError, LogFormat, LoggingConfig,
};

#[test]
fn test_error_macros_carry_context() {
    let error = storage_error!("disk full", "members");

    match &error {
        ClubError::Storage {
            message, context, ..
        } => {
            assert_eq!(message, "disk full");
            assert_eq!(context.component, "members");
            assert!(!context.error_id.is_empty());
        }
        _ => panic!("Expected Storage error"),
    }

    // Logging must never panic, whatever the variant
    error.log();

    let config = config_error!(
        "unknown capability 'write'",
        "roles",
        "Check the [auth] section of your configuration file"
    );
    assert!(!config.is_client_error());
    assert!(config
        .context()
        .unwrap()
        .recovery_suggestions
        .iter()
        .any(|s| s.contains("[auth]")));

    let missing = not_found_error!("members/m1", "members");
    assert!(missing.is_client_error());
}

#[test]
fn test_config_error_suggestion_follows_call_site() {
    let storage = config_error!("database_url requires the sqlite feature", "storage");
    let suggestions = &storage.context().unwrap().recovery_suggestions;

    assert_eq!(suggestions, &vec!["Check your configuration file".to_string()]);
}

#[test]
fn test_logging_initialization_is_repeatable() {
    let config = LoggingConfig {
        format: LogFormat::Compact,
        ..LoggingConfig::default()
    };

    // The first call may win or lose against other tests in this binary;
    // a second call must report an error instead of panicking.
    let _ = init_logging(&config);
    assert!(init_logging(&config).is_err());
}

#[test]
fn test_log_to_file_requires_path() {
    let config = LoggingConfig {
        log_to_file: true,
        log_file_path: None,
        ..LoggingConfig::default()
    };

    assert!(init_logging(&config).is_err());
}

#[tokio::test]
async fn test_timeout_maps_to_club_error() {
    let result: Result<(), ClubError> = with_timeout(
        async {
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
            Ok(())
        },
        5,
        "verify_token",
    )
    .await;

    assert!(matches!(result, Err(ClubError::Timeout { .. })));
}

#[test]
fn test_full_config_file() {
    let config = ClubConfig::from_toml(
        r#"
        [server]
        host = "0.0.0.0"
        port = 8443
        allowed_origins = ["https://club.example.org"]

        [auth]
        roles = ["none", "read", "write", "manage", "admin"]
        token_header = "token"
        jwt_secret = "a-very-long-test-secret"
        identity_timeout_ms = 2500

        [catalog]
        event_types = ["meeting", "hackathon"]

        [logging]
        level = "debug"
        format = "json"
        "#,
    )
    .unwrap();

    assert!(config.validate().is_ok());
    assert_eq!(config.server.address(), "0.0.0.0:8443");
    assert_eq!(config.catalog.event_types, vec!["meeting", "hackathon"]);
    assert_eq!(config.logging.format, LogFormat::Json);
    // Untouched catalogs keep their defaults
    assert!(config.catalog.member_terms.contains(&"fall".to_string()));
}

#[test]
fn test_config_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clubhouse.toml");
    std::fs::write(&path, "[server]\nport = 9090\n").unwrap();

    let config = ClubConfig::from_file(&path).unwrap();
    assert_eq!(config.server.port, 9090);
    assert_eq!(config.auth.roles.first().map(String::as_str), Some("none"));

    let missing = ClubConfig::from_file(dir.path().join("absent.toml"));
    assert!(matches!(missing, Err(ClubError::Config { .. })));
}
