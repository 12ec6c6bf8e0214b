//! Tests for TOML configuration loading and gateway construction from it.

use std::io::Write;
use std::time::Duration;

use bifrost::{BifrostBuilder, BifrostError, BreakerState, GatewayConfig};
use tokio_test::{assert_err, assert_ok};

const CONFIG: &str = r#"
[cache]
max_entries = 200
default_ttl_secs = 120

[breaker]
failure_threshold = 3
reset_timeout_secs = 30

[[providers]]
kind = "openai"
api_key = "sk-test"
model = "gpt-4o-mini"
priority = 1

[[providers]]
kind = "anthropic"
api_key = "sk-ant-test"
priority = 3

[[providers]]
name = "backup-gemini"
kind = "gemini"
api_key = "g-test"
priority = 2
timeout_secs = 10
[providers.breaker]
failure_threshold = 1
"#;

#[test]
fn load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(CONFIG.as_bytes()).unwrap();

    let config = assert_ok!(GatewayConfig::load(Some(file.path())));
    assert_eq!(config.cache.max_entries, 200);
    assert_eq!(config.breaker.failure_threshold, 3);
    assert_eq!(config.providers.len(), 3);
}

#[test]
fn invalid_toml_is_configuration_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"[cache\nmax_entries = ").unwrap();

    let err = assert_err!(GatewayConfig::load(Some(file.path())));
    assert!(matches!(err, BifrostError::Configuration(_)));
}

#[test]
fn gateway_from_config_orders_providers() {
    let config = GatewayConfig::from_toml_str(CONFIG).unwrap();
    let gateway = BifrostBuilder::from_config(&config).unwrap().build().unwrap();

    assert_eq!(
        gateway.registry().provider_names(),
        vec!["openai", "backup-gemini", "anthropic"]
    );

    let gemini = gateway.registry().get("backup-gemini").unwrap();
    assert_eq!(gemini.config().timeout, Duration::from_secs(10));
    assert_eq!(gemini.breaker().config().failure_threshold, 1);
    assert_eq!(
        gemini.breaker().config().reset_timeout,
        Duration::from_secs(30)
    );

    let openai = gateway.registry().get("openai").unwrap();
    assert_eq!(openai.breaker().config().failure_threshold, 3);

    for status in gateway.provider_status() {
        assert_eq!(status.breaker.state, BreakerState::Closed);
    }
    assert_eq!(gateway.metrics().providers_active, 3);
}

#[test]
fn unresolved_env_credential_disables_provider() {
    let toml = r#"
        [[providers]]
        kind = "openai"
        api_key_env = "BIFROST_TEST_NEVER_SET_9D2A"
        priority = 1

        [[providers]]
        kind = "gemini"
        api_key = "g"
        priority = 2
    "#;
    let config = GatewayConfig::from_toml_str(toml).unwrap();
    let gateway = BifrostBuilder::from_config(&config).unwrap().build().unwrap();
    assert_eq!(gateway.registry().provider_names(), vec!["gemini"]);
}

#[test]
fn azure_without_endpoint_fails_build() {
    let toml = r#"
        [[providers]]
        kind = "azure_openai"
        api_key = "a"
    "#;
    let config = GatewayConfig::from_toml_str(toml).unwrap();
    let err = BifrostBuilder::from_config(&config)
        .unwrap()
        .build()
        .unwrap_err();
    assert!(matches!(err, BifrostError::Configuration(_)));
}

#[test]
fn duplicate_names_fail_build() {
    let toml = r#"
        [[providers]]
        kind = "openai"
        api_key = "a"

        [[providers]]
        kind = "openai"
        api_key = "b"
        endpoint = "http://localhost:11434/v1"
    "#;
    let config = GatewayConfig::from_toml_str(toml).unwrap();
    let err = BifrostBuilder::from_config(&config)
        .unwrap()
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("duplicate provider name 'openai'"));
}

#[test]
fn zero_threshold_fails_build() {
    let toml = r#"
        [breaker]
        failure_threshold = 0

        [[providers]]
        kind = "gemini"
        api_key = "g"
    "#;
    let config = GatewayConfig::from_toml_str(toml).unwrap();
    assert_err!(BifrostBuilder::from_config(&config).unwrap().build());
}

#[test]
fn oversized_default_ttl_fails_build() {
    let toml = r#"
        [cache]
        default_ttl_secs = 9223372036854775807

        [[providers]]
        kind = "gemini"
        api_key = "g"
    "#;
    let config = GatewayConfig::from_toml_str(toml).unwrap();
    let err = assert_err!(BifrostBuilder::from_config(&config).unwrap().build());
    assert!(matches!(err, BifrostError::Configuration(_)));
}
