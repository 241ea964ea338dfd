//! CLI arguments for rancher-exporter.
//!
//! Defines the command-line interface structure using the clap library.

use clap::{Parser, ValueEnum};
use std::net::IpAddr;
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Configuration format options for output
#[derive(Debug, Clone, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "rancher-exporter",
    about = "Prometheus exporter for Rancher management servers",
    long_about = "Prometheus exporter for Rancher management servers.\n\n\
                  Polls the Rancher API on a fast cycle for cluster, node, user, token\n\
                  and project state, and the Rancher release feed on a slow cycle for\n\
                  the latest available version, exposing everything on /metrics.",
    author = "Michael Moll <exporter@herakles.now> - Herakles",
    version = "0.1.0",
    propagate_version = true,
    after_help = "Project: https://github.com/cansp-dev/rancher-exporter — Support: exporter@herakles.now"
)]
pub struct Args {
    /// HTTP listen port
    #[arg(short = 'p', long)]
    pub port: Option<u16>,

    /// Bind to specific interface/IP
    #[arg(long)]
    pub bind: Option<IpAddr>,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,

    /// Rancher server URL (e.g. https://rancher.example.com)
    #[arg(long)]
    pub rancher_url: Option<String>,

    /// Rancher API bearer token
    #[arg(long)]
    pub rancher_token: Option<String>,

    /// File containing the Rancher API bearer token
    #[arg(long, conflicts_with = "rancher_token")]
    pub rancher_token_file: Option<PathBuf>,

    /// Skip TLS certificate verification for the Rancher API
    #[arg(long)]
    pub insecure_skip_verify: bool,

    /// Timeout for individual Rancher API requests in seconds
    #[arg(long)]
    pub request_timeout_secs: Option<u64>,

    /// Fast collection cycle interval in seconds
    #[arg(long)]
    pub fast_interval_secs: Option<u64>,

    /// Slow (latest-version) collection cycle interval in seconds
    #[arg(long)]
    pub slow_interval_secs: Option<u64>,

    /// Disable /health endpoint
    #[arg(long)]
    pub disable_health: bool,

    /// Enable TLS/SSL for HTTPS on the scrape endpoint
    #[arg(long)]
    pub enable_tls: bool,

    /// Path to TLS certificate file (PEM format)
    #[arg(long)]
    pub tls_cert: Option<PathBuf>,

    /// Path to TLS private key file (PEM format)
    #[arg(long)]
    pub tls_key: Option<PathBuf>,
}
