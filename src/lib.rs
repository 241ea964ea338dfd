//! Rancher Exporter Library
//!
//! Polls a Rancher management server on two independent cycles and
//! republishes the observed state as Prometheus metrics.
//!
//! The fast cycle covers cluster, node, user, token, project and
//! custom-resource state; the slow cycle covers the latest released
//! Rancher version, which comes from a rate-limited release feed. All
//! metric objects live in a single [`RancherMetrics`] registry shape and
//! every fetcher owns a disjoint slice of it, so concurrent fetch waves
//! never contend on anything but last-write-wins gauge stores.
//!
//! # Usage
//!
//! ```rust
//! use prometheus::Registry;
//! use rancher_exporter::RancherMetrics;
//!
//! let registry = Registry::new();
//! let metrics = RancherMetrics::new(&registry).unwrap();
//!
//! metrics.managed_cluster_count.set(3.0);
//! assert_eq!(metrics.managed_cluster_count.get(), 3.0);
//! ```

pub mod cli;
pub mod client;
pub mod collector;
pub mod config;
pub mod fetchers;
pub mod handlers;
pub mod metrics;
pub mod state;

// Re-export main types for convenience
pub use client::{ClientError, RancherApi, RancherHttpClient};
pub use metrics::RancherMetrics;
pub use state::{AppState, SharedState};
