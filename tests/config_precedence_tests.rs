mod common;

use fraudshield::common::config::{apply_overrides, load_config, ConfigOverrides, DEFAULT_API_URL};
use fraudshield::common::ProviderMode;
use common::config_test_utils::with_config_env;
use std::time::Duration;

#[test]
fn defaults_without_file_or_env() {
    with_config_env("", || {
        let config = load_config().expect("load config");
        assert_eq!(config.api.base_url, DEFAULT_API_URL);
        assert_eq!(config.provider, ProviderMode::Live);
        assert_eq!(config.settle_delay(), Duration::from_millis(800));
        assert!(config.ui.show_progress);
    });
}

#[test]
fn precedence_defaults_file_env_cli() {
    with_config_env(
        r#"
        [api]
        base_url = "http://file.example/api/v1"
        "#,
        || {
            std::env::set_var("FRAUDSHIELD_API__BASE_URL", "http://env.example/api/v1");

            let overrides = ConfigOverrides {
                api_url: Some("http://cli.example/api/v1".into()),
                ..Default::default()
            };

            let config = apply_overrides(load_config().expect("load config"), &overrides);
            assert_eq!(config.api.base_url, "http://cli.example/api/v1");
        },
    );
}

#[test]
fn precedence_defaults_file_env_without_cli() {
    with_config_env(
        r#"
        [api]
        base_url = "http://file.example/api/v1"
        "#,
        || {
            std::env::set_var("FRAUDSHIELD_API__BASE_URL", "http://env.example/api/v1");

            let config = load_config().expect("load config");
            assert_eq!(config.api.base_url, "http://env.example/api/v1");
        },
    );
}

#[test]
fn short_api_url_variable_wins_over_nested_form() {
    with_config_env("", || {
        std::env::set_var("FRAUDSHIELD_API__BASE_URL", "http://nested.example/api/v1");
        std::env::set_var("FRAUDSHIELD_API_URL", "https://scan.example.com/api/v1");

        let config = load_config().expect("load config");
        assert_eq!(config.api.base_url, "https://scan.example.com/api/v1");
        assert_eq!(
            config.base_url().expect("url").as_str(),
            "https://scan.example.com/api/v1/"
        );
    });
}

#[test]
fn file_values_override_defaults() {
    with_config_env(
        r#"
        provider = "fixture"

        [scan]
        settle_ms = 0
        poll_interval_ms = 250

        [ui]
        show_progress = false
        "#,
        || {
            let config = load_config().expect("load config");
            assert_eq!(config.provider, ProviderMode::Fixture);
            assert!(config.settle_delay().is_zero());
            assert_eq!(config.poll_interval(), Duration::from_millis(250));
            assert!(!config.ui.show_progress);
        },
    );
}

#[test]
fn env_overrides_file_scalar() {
    with_config_env(
        r#"
        [scan]
        poll_timeout_secs = 30
        "#,
        || {
            std::env::set_var("FRAUDSHIELD_SCAN__POLL_TIMEOUT_SECS", "45");

            let config = load_config().expect("load config");
            assert_eq!(config.poll_timeout(), Duration::from_secs(45));
        },
    );
}

#[test]
fn cli_fixture_flag_overrides_file_provider() {
    with_config_env(
        r#"
        provider = "live"
        "#,
        || {
            let overrides = ConfigOverrides {
                provider: Some(ProviderMode::Fixture),
                show_progress: Some(false),
                ..Default::default()
            };
            let config = apply_overrides(load_config().expect("load config"), &overrides);
            assert_eq!(config.provider, ProviderMode::Fixture);
            assert!(!config.ui.show_progress);
        },
    );
}
