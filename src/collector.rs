//! Polling scheduler for the two collection cycles.
//!
//! The fast loop covers every domain except the latest released version,
//! which lives on its own slow loop because the release feed it queries
//! is rate limited. The loops share no scheduling state and touch
//! disjoint metric subsets.

use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::info;

use crate::config::{DEFAULT_FAST_INTERVAL_SECS, DEFAULT_SLOW_INTERVAL_SECS};
use crate::fetchers;
use crate::state::SharedState;

/// Starts both collection loops as detached tasks. They run for the
/// lifetime of the process.
pub fn spawn(state: SharedState) {
    tokio::spawn(slow_loop(state.clone()));
    tokio::spawn(fast_loop(state));
}

async fn fast_loop(state: SharedState) {
    let period = Duration::from_secs(
        state
            .config
            .fast_interval_secs
            .unwrap_or(DEFAULT_FAST_INTERVAL_SECS),
    );

    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        state.metrics.reset_inventory_metrics();
        info!("updating rancher metrics");
        spawn_fetch_wave(&state);
    }
}

/// Launches all fast-cycle fetchers without awaiting them.
///
/// If a wave outlives the tick interval the next wave starts while it is
/// still in flight; concurrent writes to the same metric are
/// last-write-wins with no ordering guarantee between waves.
pub fn spawn_fetch_wave(state: &SharedState) {
    let client = &state.client;
    let metrics = &state.metrics;

    tokio::spawn(fetchers::installed_version(client.clone(), metrics.clone()));
    tokio::spawn(fetchers::cluster_connectivity(client.clone(), metrics.clone()));
    tokio::spawn(fetchers::cluster_count(client.clone(), metrics.clone()));
    tokio::spawn(fetchers::distributions(client.clone(), metrics.clone()));
    tokio::spawn(fetchers::node_count(client.clone(), metrics.clone()));
    tokio::spawn(fetchers::downstream_versions(client.clone(), metrics.clone()));
    tokio::spawn(fetchers::token_count(client.clone(), metrics.clone()));
    tokio::spawn(fetchers::user_count(client.clone(), metrics.clone()));
    tokio::spawn(fetchers::project_count(client.clone(), metrics.clone()));
    tokio::spawn(fetchers::project_labels(client.clone(), metrics.clone()));
    tokio::spawn(fetchers::project_annotations(client.clone(), metrics.clone()));
    tokio::spawn(fetchers::project_resource_quotas(client.clone(), metrics.clone()));
    tokio::spawn(fetchers::custom_resources(client.clone(), metrics.clone()));
}

async fn slow_loop(state: SharedState) {
    let period = Duration::from_secs(
        state
            .config
            .slow_interval_secs
            .unwrap_or(DEFAULT_SLOW_INTERVAL_SECS),
    );

    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        fetchers::latest_version(state.client.clone(), state.metrics.clone()).await;
    }
}
