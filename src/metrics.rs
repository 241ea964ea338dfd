//! Prometheus metric definitions for rancher-exporter.
//!
//! All metric objects live in one [`RancherMetrics`] value that is
//! created at startup, registered against a single registry and shared
//! by every fetcher. Each metric has exactly one owning fetcher; the
//! connectivity pair is owned jointly by the connectivity fetcher, which
//! keeps the two sides mutually exclusive.

use prometheus::{Gauge, GaugeVec, Opts, Registry};

use crate::client::Distribution;

/// Collection of metrics describing the observed Rancher instance.
#[derive(Clone)]
pub struct RancherMetrics {
    pub installed_rancher_version: GaugeVec, // labels: version
    pub latest_rancher_version: GaugeVec,    // labels: version

    pub managed_cluster_count: Gauge,
    pub managed_rke_cluster_count: Gauge,
    pub managed_rke2_cluster_count: Gauge,
    pub managed_k3s_cluster_count: Gauge,
    pub managed_eks_cluster_count: Gauge,
    pub managed_aks_cluster_count: Gauge,
    pub managed_gke_cluster_count: Gauge,
    pub managed_node_count: Gauge,

    // ========== Cluster Level Metrics ==========
    pub cluster_connected: GaugeVec,          // labels: name
    pub cluster_not_connected: GaugeVec,      // labels: name
    pub downstream_cluster_version: GaugeVec, // labels: name, version

    // ========== User Related ==========
    pub token_count: Gauge,
    pub user_count: Gauge,

    // ========== Project Related ==========
    pub project_count: Gauge,
    pub project_labels: GaugeVec,
    pub project_annotations: GaugeVec,
    pub project_resource_quota: GaugeVec,

    // ========== Rancher Custom Resources ==========
    pub custom_resource_count: GaugeVec, // labels: resource_name
}

impl RancherMetrics {
    /// Creates and registers all metrics with the registry.
    pub fn new(registry: &Registry) -> Result<Self, Box<dyn std::error::Error>> {
        let installed_rancher_version = GaugeVec::new(
            Opts::new(
                "installed_rancher_version",
                "Version of the installed Rancher instance",
            ),
            &["version"],
        )?;
        let latest_rancher_version = GaugeVec::new(
            Opts::new(
                "latest_rancher_version",
                "Version of the most recent Rancher release",
            ),
            &["version"],
        )?;

        let managed_cluster_count = Gauge::new(
            "rancher_managed_clusters",
            "Number of clusters this Rancher instance is currently managing",
        )?;
        let managed_rke_cluster_count = Gauge::new(
            "rancher_managed_rke_clusters",
            "Number of RKE clusters this Rancher instance is currently managing",
        )?;
        let managed_rke2_cluster_count = Gauge::new(
            "rancher_managed_rke2_clusters",
            "Number of RKE2 clusters this Rancher instance is currently managing",
        )?;
        let managed_k3s_cluster_count = Gauge::new(
            "rancher_managed_k3s_clusters",
            "Number of K3s clusters this Rancher instance is currently managing",
        )?;
        let managed_eks_cluster_count = Gauge::new(
            "rancher_managed_eks_clusters",
            "Number of EKS clusters this Rancher instance is currently managing",
        )?;
        let managed_aks_cluster_count = Gauge::new(
            "rancher_managed_aks_clusters",
            "Number of AKS clusters this Rancher instance is currently managing",
        )?;
        let managed_gke_cluster_count = Gauge::new(
            "rancher_managed_gke_clusters",
            "Number of GKE clusters this Rancher instance is currently managing",
        )?;
        let managed_node_count = Gauge::new(
            "rancher_managed_nodes",
            "Number of managed nodes this Rancher instance is currently managing",
        )?;

        let cluster_connected = GaugeVec::new(
            Opts::new(
                "cluster_connected",
                "Identify if a downstream cluster is connected to Rancher",
            ),
            &["name"],
        )?;
        let cluster_not_connected = GaugeVec::new(
            Opts::new(
                "cluster_not_connected",
                "Identify if a downstream cluster is not connected to Rancher",
            ),
            &["name"],
        )?;
        let downstream_cluster_version = GaugeVec::new(
            Opts::new(
                "cluster_k8s_version",
                "Version of K8s running in the downstream cluster",
            ),
            &["name", "version"],
        )?;

        let token_count = Gauge::new("rancher_tokens", "Number of tokens issued by Rancher")?;
        let user_count = Gauge::new("rancher_users", "Number of users in this Rancher instance")?;

        let project_count = Gauge::new("rancher_projects", "Number of Projects globally")?;
        let project_labels = GaugeVec::new(
            Opts::new(
                "rancher_project_labels",
                "Labels associated with Rancher Projects",
            ),
            &[
                "cluster_name",
                "project_id",
                "project_display_name",
                "project_label_key",
                "project_label_value",
            ],
        )?;
        let project_annotations = GaugeVec::new(
            Opts::new(
                "rancher_project_annotations",
                "Annotations associated with Rancher Projects",
            ),
            &[
                "cluster_name",
                "project_id",
                "project_display_name",
                "project_annotation_key",
                "project_annotation_value",
            ],
        )?;
        let project_resource_quota = GaugeVec::new(
            Opts::new(
                "rancher_project_resourcequota",
                "Resource quota set for the project",
            ),
            &[
                "cluster_name",
                "project_id",
                "project_display_name",
                "project_resource_key",
                "project_resource_type",
            ],
        )?;

        let custom_resource_count = GaugeVec::new(
            Opts::new(
                "rancher_custom_resource_count",
                "Raw count of Rancher custom resources by name",
            ),
            &["resource_name"],
        )?;

        registry.register(Box::new(installed_rancher_version.clone()))?;
        registry.register(Box::new(latest_rancher_version.clone()))?;
        registry.register(Box::new(managed_cluster_count.clone()))?;
        registry.register(Box::new(managed_rke_cluster_count.clone()))?;
        registry.register(Box::new(managed_rke2_cluster_count.clone()))?;
        registry.register(Box::new(managed_k3s_cluster_count.clone()))?;
        registry.register(Box::new(managed_eks_cluster_count.clone()))?;
        registry.register(Box::new(managed_aks_cluster_count.clone()))?;
        registry.register(Box::new(managed_gke_cluster_count.clone()))?;
        registry.register(Box::new(managed_node_count.clone()))?;
        registry.register(Box::new(cluster_connected.clone()))?;
        registry.register(Box::new(cluster_not_connected.clone()))?;
        registry.register(Box::new(downstream_cluster_version.clone()))?;
        registry.register(Box::new(token_count.clone()))?;
        registry.register(Box::new(user_count.clone()))?;
        registry.register(Box::new(project_count.clone()))?;
        registry.register(Box::new(project_labels.clone()))?;
        registry.register(Box::new(project_annotations.clone()))?;
        registry.register(Box::new(project_resource_quota.clone()))?;
        registry.register(Box::new(custom_resource_count.clone()))?;

        Ok(Self {
            installed_rancher_version,
            latest_rancher_version,
            managed_cluster_count,
            managed_rke_cluster_count,
            managed_rke2_cluster_count,
            managed_k3s_cluster_count,
            managed_eks_cluster_count,
            managed_aks_cluster_count,
            managed_gke_cluster_count,
            managed_node_count,
            cluster_connected,
            cluster_not_connected,
            downstream_cluster_version,
            token_count,
            user_count,
            project_count,
            project_labels,
            project_annotations,
            project_resource_quota,
            custom_resource_count,
        })
    }

    /// Dedicated counter for a distribution. Total over the closed enum,
    /// so a new variant cannot ship without its gauge.
    pub fn distribution_gauge(&self, distribution: Distribution) -> &Gauge {
        match distribution {
            Distribution::Rke => &self.managed_rke_cluster_count,
            Distribution::Rke2 => &self.managed_rke2_cluster_count,
            Distribution::K3s => &self.managed_k3s_cluster_count,
            Distribution::Eks => &self.managed_eks_cluster_count,
            Distribution::Aks => &self.managed_aks_cluster_count,
            Distribution::Gke => &self.managed_gke_cluster_count,
        }
    }

    /// Clears the label vectors whose entity sets are derived from the
    /// current remote inventory, so entities that disappeared between
    /// cycles stop being reported once the next wave repopulates them.
    ///
    /// Scalar gauges stay untouched: a failed fetch must keep reporting
    /// the previous value instead of dropping to zero.
    /// `latest_rancher_version` is owned by the slow cycle, which resets
    /// it itself. `custom_resource_count` is intentionally never cleared;
    /// resource kinds that disappear keep their last count until restart.
    pub fn reset_inventory_metrics(&self) {
        self.installed_rancher_version.reset();
        self.cluster_connected.reset();
        self.cluster_not_connected.reset();
        self.downstream_cluster_version.reset();
        self.project_labels.reset();
        self.project_annotations.reset();
        self.project_resource_quota.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics() -> RancherMetrics {
        RancherMetrics::new(&Registry::new()).expect("metric registration failed")
    }

    #[test]
    fn reset_clears_inventory_vectors() {
        let m = metrics();

        m.installed_rancher_version
            .with_label_values(&["v2.8.3"])
            .set(1.0);
        m.cluster_connected.with_label_values(&["east"]).set(1.0);
        m.cluster_not_connected.with_label_values(&["west"]).set(1.0);
        m.downstream_cluster_version
            .with_label_values(&["east", "v1.28.9"])
            .set(1.0);
        m.project_labels
            .with_label_values(&["c-1", "c-1:p-1", "default", "team", "infra"])
            .set(1.0);

        m.reset_inventory_metrics();

        assert_eq!(
            m.installed_rancher_version
                .with_label_values(&["v2.8.3"])
                .get(),
            0.0
        );
        assert_eq!(m.cluster_connected.with_label_values(&["east"]).get(), 0.0);
        assert_eq!(
            m.cluster_not_connected.with_label_values(&["west"]).get(),
            0.0
        );
    }

    #[test]
    fn reset_leaves_scalars_and_custom_resources() {
        let m = metrics();

        m.managed_cluster_count.set(7.0);
        m.managed_node_count.set(42.0);
        m.user_count.set(5.0);
        m.custom_resource_count
            .with_label_values(&["management.cattle.io.cluster"])
            .set(7.0);

        m.reset_inventory_metrics();

        assert_eq!(m.managed_cluster_count.get(), 7.0);
        assert_eq!(m.managed_node_count.get(), 42.0);
        assert_eq!(m.user_count.get(), 5.0);
        assert_eq!(
            m.custom_resource_count
                .with_label_values(&["management.cattle.io.cluster"])
                .get(),
            7.0
        );
    }

    #[test]
    fn slow_cycle_vector_survives_fast_reset() {
        let m = metrics();

        m.latest_rancher_version
            .with_label_values(&["v2.9.0"])
            .set(1.0);

        m.reset_inventory_metrics();

        assert_eq!(
            m.latest_rancher_version
                .with_label_values(&["v2.9.0"])
                .get(),
            1.0
        );
    }

    #[test]
    fn every_distribution_has_a_dedicated_gauge() {
        let m = metrics();

        for distribution in Distribution::ALL {
            m.distribution_gauge(distribution).set(3.0);
        }

        assert_eq!(m.managed_rke_cluster_count.get(), 3.0);
        assert_eq!(m.managed_gke_cluster_count.get(), 3.0);
    }
}
