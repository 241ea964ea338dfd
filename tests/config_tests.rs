//! Integration tests for configuration loading, merging, and validation.

use clap::Parser;
use std::io::Write;

use rancher_exporter::cli::Args;
use rancher_exporter::config::{
    load_config, resolve_config, validate_effective_config, Config, DEFAULT_FAST_INTERVAL_SECS,
    DEFAULT_PORT,
};

fn parse_args(argv: &[&str]) -> Args {
    let mut full = vec!["rancher-exporter"];
    full.extend_from_slice(argv);
    Args::try_parse_from(full).expect("argument parsing failed")
}

#[test]
fn defaults_apply_without_config_file() {
    let args = parse_args(&["--no-config"]);
    let config = resolve_config(&args).unwrap();

    assert_eq!(config.port, Some(DEFAULT_PORT));
    assert_eq!(config.fast_interval_secs, Some(DEFAULT_FAST_INTERVAL_SECS));
    assert_eq!(config.enable_health, Some(true));
    assert_eq!(config.rancher_url, None);
}

#[test]
fn cli_overrides_defaults() {
    let args = parse_args(&[
        "--no-config",
        "--port",
        "9999",
        "--rancher-url",
        "https://rancher.example.com",
        "--fast-interval-secs",
        "30",
        "--disable-health",
    ]);
    let config = resolve_config(&args).unwrap();

    assert_eq!(config.port, Some(9999));
    assert_eq!(
        config.rancher_url.as_deref(),
        Some("https://rancher.example.com")
    );
    assert_eq!(config.fast_interval_secs, Some(30));
    assert_eq!(config.enable_health, Some(false));
}

#[test]
fn yaml_config_file_is_loaded() {
    let mut file = tempfile::Builder::new()
        .suffix(".yaml")
        .tempfile()
        .unwrap();
    writeln!(
        file,
        "rancher-url: https://rancher.internal\nport: 9173\nfast-interval-secs: 20"
    )
    .unwrap();

    let config = load_config(file.path().to_str()).unwrap();

    assert_eq!(
        config.rancher_url.as_deref(),
        Some("https://rancher.internal")
    );
    assert_eq!(config.port, Some(9173));
    assert_eq!(config.fast_interval_secs, Some(20));
}

#[test]
fn json_config_file_is_loaded() {
    let mut file = tempfile::Builder::new()
        .suffix(".json")
        .tempfile()
        .unwrap();
    writeln!(
        file,
        r#"{{"rancher_url": "https://rancher.internal", "slow_interval_secs": 120}}"#
    )
    .unwrap();

    let config = load_config(file.path().to_str()).unwrap();

    assert_eq!(
        config.rancher_url.as_deref(),
        Some("https://rancher.internal")
    );
    assert_eq!(config.slow_interval_secs, Some(120));
}

#[test]
fn toml_config_file_is_loaded() {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .unwrap();
    writeln!(
        file,
        "rancher_url = \"https://rancher.internal\"\nrequest_timeout_secs = 5"
    )
    .unwrap();

    let config = load_config(file.path().to_str()).unwrap();

    assert_eq!(
        config.rancher_url.as_deref(),
        Some("https://rancher.internal")
    );
    assert_eq!(config.request_timeout_secs, Some(5));
}

#[test]
fn cli_beats_config_file() {
    let mut file = tempfile::Builder::new()
        .suffix(".yaml")
        .tempfile()
        .unwrap();
    writeln!(file, "rancher-url: https://from-file\nport: 1111").unwrap();

    let args = parse_args(&[
        "-c",
        file.path().to_str().unwrap(),
        "--port",
        "2222",
    ]);
    let config = resolve_config(&args).unwrap();

    assert_eq!(config.port, Some(2222));
    assert_eq!(config.rancher_url.as_deref(), Some("https://from-file"));
}

#[test]
fn token_file_is_read_when_no_inline_token() {
    let mut token_file = tempfile::NamedTempFile::new().unwrap();
    writeln!(token_file, "token-abc123  ").unwrap();

    let args = parse_args(&[
        "--no-config",
        "--rancher-token-file",
        token_file.path().to_str().unwrap(),
    ]);
    let config = resolve_config(&args).unwrap();

    assert_eq!(config.rancher_token.as_deref(), Some("token-abc123"));
}

#[test]
fn missing_rancher_url_fails_validation() {
    let config = Config::default();
    assert!(validate_effective_config(&config).is_err());
}

#[test]
fn non_http_rancher_url_fails_validation() {
    let config = Config {
        rancher_url: Some("rancher.example.com".to_string()),
        ..Config::default()
    };
    assert!(validate_effective_config(&config).is_err());
}

#[test]
fn zero_intervals_fail_validation() {
    let base = Config {
        rancher_url: Some("https://rancher.example.com".to_string()),
        ..Config::default()
    };
    assert!(validate_effective_config(&base).is_ok());

    let config = Config {
        fast_interval_secs: Some(0),
        ..base.clone()
    };
    assert!(validate_effective_config(&config).is_err());

    let config = Config {
        slow_interval_secs: Some(0),
        ..base
    };
    assert!(validate_effective_config(&config).is_err());
}

#[test]
fn tls_requires_both_cert_and_key() {
    let config = Config {
        rancher_url: Some("https://rancher.example.com".to_string()),
        enable_tls: Some(true),
        tls_cert_path: Some("/tmp/does-not-matter.pem".to_string()),
        tls_key_path: None,
        ..Config::default()
    };
    assert!(validate_effective_config(&config).is_err());
}

#[test]
fn tls_paths_must_exist() {
    let config = Config {
        rancher_url: Some("https://rancher.example.com".to_string()),
        enable_tls: Some(true),
        tls_cert_path: Some("/nonexistent/cert.pem".to_string()),
        tls_key_path: Some("/nonexistent/key.pem".to_string()),
        ..Config::default()
    };
    assert!(validate_effective_config(&config).is_err());
}
