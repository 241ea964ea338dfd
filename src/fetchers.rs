//! One retrieval-and-apply unit per observed Rancher domain.
//!
//! Every fetcher has the same contract: call exactly one capability on
//! the client; on success write the owned metric(s); on failure log and
//! return without touching the registry, leaving the previous state in
//! place. Fetchers are stateless and order-insensitive relative to each
//! other, so the scheduler may launch them in any order and let waves
//! overlap.

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error};

use crate::client::{Distribution, RancherApi};
use crate::metrics::RancherMetrics;

pub async fn installed_version(client: Arc<dyn RancherApi>, metrics: RancherMetrics) {
    let start = Instant::now();

    match client.installed_rancher_version().await {
        Ok(version) => {
            metrics
                .installed_rancher_version
                .with_label_values(&[&version])
                .set(1.0);
        }
        Err(e) => error!("error retrieving the installed Rancher version: {e}"),
    }

    debug!(
        "installed version collection took {:?}",
        start.elapsed()
    );
}

/// Slow-cycle unit: clears and repopulates the latest-version pair on its
/// own schedule, separate from the fast wave because the release feed is
/// rate limited.
pub async fn latest_version(client: Arc<dyn RancherApi>, metrics: RancherMetrics) {
    let start = Instant::now();

    metrics.latest_rancher_version.reset();

    match client.latest_rancher_version().await {
        Ok(version) => {
            metrics
                .latest_rancher_version
                .with_label_values(&[&version])
                .set(1.0);
        }
        Err(e) => error!("error retrieving latest Rancher version: {e}"),
    }

    debug!("latest version collection took {:?}", start.elapsed());
}

pub async fn cluster_count(client: Arc<dyn RancherApi>, metrics: RancherMetrics) {
    let start = Instant::now();

    match client.managed_cluster_count().await {
        Ok(count) => metrics.managed_cluster_count.set(count as f64),
        Err(e) => error!("error retrieving number of managed clusters: {e}"),
    }

    debug!("cluster count collection took {:?}", start.elapsed());
}

pub async fn distributions(client: Arc<dyn RancherApi>, metrics: RancherMetrics) {
    let start = Instant::now();

    match client.k8s_distributions().await {
        Ok(counts) => {
            for distribution in Distribution::ALL {
                metrics
                    .distribution_gauge(distribution)
                    .set(counts.count_for(distribution) as f64);
            }
        }
        Err(e) => error!("error retrieving cluster k8s distributions: {e}"),
    }

    debug!("distribution collection took {:?}", start.elapsed());
}

pub async fn node_count(client: Arc<dyn RancherApi>, metrics: RancherMetrics) {
    let start = Instant::now();

    match client.managed_node_count().await {
        Ok(count) => metrics.managed_node_count.set(count as f64),
        Err(e) => error!("error retrieving number of managed nodes: {e}"),
    }

    debug!("node count collection took {:?}", start.elapsed());
}

/// Writes both halves of the connectivity pair so that exactly one side
/// is 1 for every cluster in the snapshot.
pub async fn cluster_connectivity(client: Arc<dyn RancherApi>, metrics: RancherMetrics) {
    let start = Instant::now();

    match client.cluster_connected_states().await {
        Ok(states) => {
            for (name, connected) in &states {
                if *connected {
                    metrics
                        .cluster_connected
                        .with_label_values(&[name.as_str()])
                        .set(1.0);
                    metrics
                        .cluster_not_connected
                        .with_label_values(&[name.as_str()])
                        .set(0.0);
                } else {
                    metrics
                        .cluster_not_connected
                        .with_label_values(&[name.as_str()])
                        .set(1.0);
                    metrics
                        .cluster_connected
                        .with_label_values(&[name.as_str()])
                        .set(0.0);
                }
            }
        }
        Err(e) => error!("error retrieving cluster connected states: {e}"),
    }

    debug!("cluster connectivity collection took {:?}", start.elapsed());
}

pub async fn downstream_versions(client: Arc<dyn RancherApi>, metrics: RancherMetrics) {
    let start = Instant::now();

    match client.downstream_cluster_versions().await {
        Ok(versions) => {
            for cluster in &versions {
                metrics
                    .downstream_cluster_version
                    .with_label_values(&[&cluster.name, &cluster.version])
                    .set(1.0);
            }
        }
        Err(e) => error!("error retrieving downstream k8s cluster versions: {e}"),
    }

    debug!("downstream version collection took {:?}", start.elapsed());
}

pub async fn user_count(client: Arc<dyn RancherApi>, metrics: RancherMetrics) {
    let start = Instant::now();

    match client.user_count().await {
        Ok(count) => metrics.user_count.set(count as f64),
        Err(e) => error!("error retrieving number of users: {e}"),
    }

    debug!("user count collection took {:?}", start.elapsed());
}

pub async fn token_count(client: Arc<dyn RancherApi>, metrics: RancherMetrics) {
    let start = Instant::now();

    match client.token_count().await {
        Ok(count) => metrics.token_count.set(count as f64),
        Err(e) => error!("error retrieving number of tokens: {e}"),
    }

    debug!("token count collection took {:?}", start.elapsed());
}

pub async fn project_count(client: Arc<dyn RancherApi>, metrics: RancherMetrics) {
    let start = Instant::now();

    match client.project_count().await {
        Ok(count) => metrics.project_count.set(count as f64),
        Err(e) => error!("error retrieving number of projects: {e}"),
    }

    debug!("project count collection took {:?}", start.elapsed());
}

pub async fn project_labels(client: Arc<dyn RancherApi>, metrics: RancherMetrics) {
    let start = Instant::now();

    match client.project_labels().await {
        Ok(labels) => {
            for label in &labels {
                metrics
                    .project_labels
                    .with_label_values(&[
                        &label.cluster_name,
                        &label.project_id,
                        &label.project_display_name,
                        &label.key,
                        &label.value,
                    ])
                    .set(1.0);
            }
        }
        Err(e) => error!("error retrieving project labels: {e}"),
    }

    debug!("project label collection took {:?}", start.elapsed());
}

pub async fn project_annotations(client: Arc<dyn RancherApi>, metrics: RancherMetrics) {
    let start = Instant::now();

    match client.project_annotations().await {
        Ok(annotations) => {
            for annotation in &annotations {
                metrics
                    .project_annotations
                    .with_label_values(&[
                        &annotation.cluster_name,
                        &annotation.project_id,
                        &annotation.project_display_name,
                        &annotation.key,
                        &annotation.value,
                    ])
                    .set(1.0);
            }
        }
        Err(e) => error!("error retrieving project annotations: {e}"),
    }

    debug!("project annotation collection took {:?}", start.elapsed());
}

pub async fn project_resource_quotas(client: Arc<dyn RancherApi>, metrics: RancherMetrics) {
    let start = Instant::now();

    match client.project_resource_quotas().await {
        Ok(quotas) => {
            for quota in &quotas {
                metrics
                    .project_resource_quota
                    .with_label_values(&[
                        &quota.cluster_name,
                        &quota.project_id,
                        &quota.project_display_name,
                        &quota.resource_key,
                        &quota.resource_type,
                    ])
                    .set(quota.value);
            }
        }
        Err(e) => error!("error retrieving project resources: {e}"),
    }

    debug!("project resource quota collection took {:?}", start.elapsed());
}

pub async fn custom_resources(client: Arc<dyn RancherApi>, metrics: RancherMetrics) {
    let start = Instant::now();

    match client.custom_resource_counts().await {
        Ok(counts) => {
            for (resource, count) in &counts {
                metrics
                    .custom_resource_count
                    .with_label_values(&[resource.as_str()])
                    .set(*count as f64);
            }
        }
        Err(e) => error!("error retrieving custom resource counts: {e}"),
    }

    debug!("custom resource collection took {:?}", start.elapsed());
}
