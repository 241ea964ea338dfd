//! Application state shared by the HTTP handlers and the collector.

use prometheus::{Gauge, Registry};
use std::sync::Arc;
use std::time::Instant;

use crate::client::RancherApi;
use crate::config::Config;
use crate::metrics::RancherMetrics;

/// Type alias for shared application state.
pub type SharedState = Arc<AppState>;

/// Global application state shared across requests and collection loops.
pub struct AppState {
    pub registry: Registry,
    pub metrics: RancherMetrics,
    pub client: Arc<dyn RancherApi>,
    pub config: Arc<Config>,
    pub scrape_duration: Gauge,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}
