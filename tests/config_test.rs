//! 配置加载测试

use flare_grpc_discovery::config::{Config, DEFAULT_GROUP, normalize_group};
use flare_grpc_discovery::error::ErrorCode;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

#[test]
fn empty_file_uses_defaults() {
    let config = assert_ok!(Config::from_toml(""));

    assert_eq!(config.registry.address, "127.0.0.1:8500");
    assert_eq!(config.registry.group, DEFAULT_GROUP);
    assert_eq!(config.server.port, 8000);
    assert_eq!(config.server.advertise_address, None);
    assert_eq!(config.server.weights.passing, 10);
    assert_eq!(config.server.weights.warning, 1);
    assert_eq!(config.server.health_check.interval_secs, 2);
    assert_eq!(config.server.health_check.timeout_secs, 6);
    assert_eq!(config.server.health_check.deregister_after_secs, 6);
    assert_eq!(config.server.keepalive_interval_secs, 1);
    assert_eq!(config.server.keepalive_timeout_secs, 1);
    assert_eq!(config.server.max_connection_age_secs, 60);
    assert_eq!(config.resolver.wait_time(), Duration::from_secs(10));
}

#[test]
fn partial_sections_keep_remaining_defaults() {
    let config = Config::from_toml(
        r#"
        [registry]
        address = "consul.internal:8500"
        group = "  "

        [server]
        port = 9100
        advertise_address = "10.1.2.3"

        [server.weights]
        passing = 5

        [server.health_check]
        interval_secs = 5

        [resolver]
        wait_time_secs = 30
        backoff_jitter = 0.0
        "#,
    )
    .unwrap();

    assert_eq!(config.registry.address, "consul.internal:8500");
    assert_eq!(config.registry.group, DEFAULT_GROUP);
    assert_eq!(config.server.port, 9100);
    assert_eq!(config.server.advertise_address.as_deref(), Some("10.1.2.3"));
    assert_eq!(config.server.weights.passing, 5);
    assert_eq!(config.server.weights.warning, 1);
    assert_eq!(config.server.health_check.interval_secs, 5);
    assert_eq!(config.server.health_check.timeout_secs, 6);
    assert_eq!(config.resolver.wait_time_secs, 30);
    assert_eq!(config.resolver.backoff_base_ms, 100);
}

#[test]
fn invalid_toml_is_a_configuration_error() {
    let err = assert_err!(Config::from_toml("[server]\nport = \"not a number\""));
    assert_eq!(err.code(), Some(ErrorCode::ConfigurationError));
}

#[test]
fn missing_file_is_an_io_error() {
    assert_err!(Config::load_from_file("/nonexistent/flare-grpc-discovery.toml"));
}

#[test]
fn group_normalization() {
    assert_eq!(normalize_group(""), DEFAULT_GROUP);
    assert_eq!(normalize_group("   "), DEFAULT_GROUP);
    assert_eq!(normalize_group(" payments "), "payments");
}
