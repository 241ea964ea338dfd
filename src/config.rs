//! Configuration management for rancher-exporter.
//!
//! Handles loading, merging, and validating configuration from files and
//! CLI arguments. Supports YAML, JSON, and TOML formats with precedence
//! CLI > config file > defaults.

use crate::cli::{Args, ConfigFormat};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

// Default configuration constants
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_FAST_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_SLOW_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

/// Effective exporter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub port: Option<u16>,
    pub bind: Option<String>,

    // Rancher connection
    #[serde(alias = "rancher-url")]
    pub rancher_url: Option<String>,
    #[serde(alias = "rancher-token")]
    pub rancher_token: Option<String>,
    #[serde(alias = "rancher-token-file")]
    pub rancher_token_file: Option<PathBuf>,
    #[serde(alias = "insecure-skip-verify")]
    pub insecure_skip_verify: Option<bool>,
    #[serde(alias = "request-timeout-secs")]
    pub request_timeout_secs: Option<u64>,

    // Collection cycles
    #[serde(alias = "fast-interval-secs")]
    pub fast_interval_secs: Option<u64>,
    #[serde(alias = "slow-interval-secs")]
    pub slow_interval_secs: Option<u64>,
    /// Release feed queried for the latest Rancher version.
    #[serde(alias = "latest-release-url")]
    pub latest_release_url: Option<String>,

    // Feature flags
    #[serde(alias = "enable-health")]
    pub enable_health: Option<bool>,

    // Logging
    #[serde(alias = "log-level")]
    pub log_level: Option<String>,

    // TLS/SSL Configuration for the scrape endpoint
    #[serde(alias = "enable-tls")]
    pub enable_tls: Option<bool>,
    #[serde(alias = "tls-cert-path")]
    pub tls_cert_path: Option<String>,
    #[serde(alias = "tls-key-path")]
    pub tls_key_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: Some(DEFAULT_PORT),
            bind: Some(DEFAULT_BIND_ADDR.to_string()),
            rancher_url: None,
            rancher_token: None,
            rancher_token_file: None,
            insecure_skip_verify: Some(false),
            request_timeout_secs: Some(DEFAULT_REQUEST_TIMEOUT_SECS),
            fast_interval_secs: Some(DEFAULT_FAST_INTERVAL_SECS),
            slow_interval_secs: Some(DEFAULT_SLOW_INTERVAL_SECS),
            latest_release_url: None,
            enable_health: Some(true),
            log_level: Some("info".into()),
            enable_tls: Some(false),
            tls_cert_path: None,
            tls_key_path: None,
        }
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let rancher_url = cfg
        .rancher_url
        .as_deref()
        .ok_or("rancher_url must be set (CLI --rancher-url or config file)")?;

    if !rancher_url.starts_with("http://") && !rancher_url.starts_with("https://") {
        return Err(format!(
            "rancher_url must start with http:// or https://, got '{}'",
            rancher_url
        )
        .into());
    }

    if cfg.fast_interval_secs == Some(0) {
        return Err("fast_interval_secs must be greater than zero".into());
    }
    if cfg.slow_interval_secs == Some(0) {
        return Err("slow_interval_secs must be greater than zero".into());
    }
    if cfg.request_timeout_secs == Some(0) {
        return Err("request_timeout_secs must be greater than zero".into());
    }

    if let Some(token_file) = &cfg.rancher_token_file {
        if !token_file.exists() {
            return Err(format!(
                "rancher_token_file not found: {}",
                token_file.display()
            )
            .into());
        }
    }

    // TLS validation
    if cfg.enable_tls.unwrap_or(false) {
        let cert_path = cfg.tls_cert_path.as_deref();
        let key_path = cfg.tls_key_path.as_deref();

        match (cert_path, key_path) {
            (None, None) => {
                return Err(
                    "TLS is enabled but neither tls_cert_path nor tls_key_path are set".into(),
                );
            }
            (Some(_), None) => {
                return Err("TLS is enabled but tls_key_path is not set".into());
            }
            (None, Some(_)) => {
                return Err("TLS is enabled but tls_cert_path is not set".into());
            }
            (Some(cert), Some(key)) => {
                if !Path::new(cert).exists() {
                    return Err(format!("TLS certificate file not found: {}", cert).into());
                }
                if !Path::new(key).exists() {
                    return Err(format!("TLS private key file not found: {}", key).into());
                }
            }
        }
    }

    Ok(())
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref().and_then(|p| p.to_str()))?
    };

    if let Some(bind_ip) = args.bind {
        config.bind = Some(bind_ip.to_string());
    }
    if let Some(cli_port) = args.port {
        config.port = Some(cli_port);
    }

    if let Some(url) = &args.rancher_url {
        config.rancher_url = Some(url.clone());
    }
    if let Some(token) = &args.rancher_token {
        config.rancher_token = Some(token.clone());
    }
    if let Some(token_file) = &args.rancher_token_file {
        config.rancher_token_file = Some(token_file.clone());
    }
    if args.insecure_skip_verify {
        config.insecure_skip_verify = Some(true);
    }
    if let Some(timeout) = args.request_timeout_secs {
        config.request_timeout_secs = Some(timeout);
    }

    if let Some(interval) = args.fast_interval_secs {
        config.fast_interval_secs = Some(interval);
    }
    if let Some(interval) = args.slow_interval_secs {
        config.slow_interval_secs = Some(interval);
    }

    if args.disable_health {
        config.enable_health = Some(false);
    }

    // TLS configuration: CLI wins if provided
    if args.enable_tls {
        config.enable_tls = Some(true);
    }
    if let Some(cert_path) = &args.tls_cert {
        config.tls_cert_path = Some(cert_path.to_string_lossy().to_string());
    }
    if let Some(key_path) = &args.tls_key {
        config.tls_key_path = Some(key_path.to_string_lossy().to_string());
    }

    // A token file beats an inline token only when no inline token is set.
    if config.rancher_token.is_none() {
        if let Some(token_file) = &config.rancher_token_file {
            let token = fs::read_to_string(token_file).map_err(|e| {
                format!(
                    "failed to read rancher_token_file {}: {}",
                    token_file.display(),
                    e
                )
            })?;
            config.rancher_token = Some(token.trim().to_string());
        }
    }

    Ok(config)
}

/// Configuration loading with multiple format support.
pub fn load_config(path: Option<&str>) -> Result<Config, Box<dyn std::error::Error>> {
    let path = if let Some(p) = path {
        PathBuf::from(p)
    } else {
        // Try default locations
        let defaults = [
            "/etc/rancher-exporter/config.yaml",
            "/etc/rancher-exporter/config.yml",
            "/etc/rancher-exporter/config.json",
            "./rancher-exporter.yaml",
            "./rancher-exporter.yml",
            "./rancher-exporter.json",
        ];

        defaults
            .iter()
            .find(|p| Path::new(p).exists())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(""))
    };

    if !path.exists() || path.to_string_lossy().is_empty() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&path)?;

    let config = match path.extension().and_then(|s| s.to_str()) {
        Some("json") => serde_json::from_str(&content)?,
        Some("toml") => toml::from_str(&content)?,
        // YAML is the default for .yaml/.yml and unknown extensions
        _ => serde_yaml::from_str(&content)?,
    };

    Ok(config)
}

/// Prints the effective configuration in the requested format, with the
/// API token masked.
pub fn show_config(cfg: &Config, format: ConfigFormat) -> Result<(), Box<dyn std::error::Error>> {
    let mut printable = cfg.clone();
    if printable.rancher_token.is_some() {
        printable.rancher_token = Some("<redacted>".to_string());
    }

    let rendered = match format {
        ConfigFormat::Yaml => serde_yaml::to_string(&printable)?,
        ConfigFormat::Json => serde_json::to_string_pretty(&printable)?,
        ConfigFormat::Toml => toml::to_string_pretty(&printable)?,
    };

    println!("{}", rendered);
    Ok(())
}
