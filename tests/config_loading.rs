/// Configuration Loading Tests
///
/// Round-trips the example configuration through a file and checks
/// validation failures surface as configuration errors.
use tidepool::{Config, PoolError};

#[test]
fn example_config_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tidepool.toml");

    Config::create_example(&path).unwrap();
    let config = Config::from_file(&path).unwrap();

    assert!(config.pool.keep_alive_enabled);
    assert_eq!(config.pool.keep_alive_duration_ms, 300_000);
    assert_eq!(config.pool.max_idle_connections, 5);
    assert_eq!(config.pool.sweep_cap, 2);
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.logging.format, "pretty");
}

#[test]
fn invalid_values_are_rejected_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tidepool.toml");

    std::fs::write(
        &path,
        r#"
[pool]
keep_alive_duration_ms = 0
"#,
    )
    .unwrap();

    let err = Config::from_file(&path).unwrap_err();
    assert!(matches!(err, PoolError::Config(_)));
}

#[test]
fn missing_file_is_a_config_error() {
    let err = Config::from_file("/nonexistent/tidepool.toml").unwrap_err();
    assert!(matches!(err, PoolError::Config(_)));
}

#[test]
fn unknown_log_format_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tidepool.toml");

    std::fs::write(
        &path,
        r#"
[logging]
format = "xml"
"#,
    )
    .unwrap();

    assert!(Config::from_file(&path).is_err());
}
