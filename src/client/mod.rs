//! Rancher API capability interface and shared data types.
//!
//! The collector only ever talks to the control plane through the
//! [`RancherApi`] trait, one method per observed domain. The concrete
//! HTTP-backed implementation lives in [`http`]; tests substitute their
//! own implementations.

pub mod http;

use ahash::AHashMap as HashMap;
use async_trait::async_trait;
use thiserror::Error;

pub use http::RancherHttpClient;

/// Errors returned by retrieval operations against the remote APIs.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected status {status} from {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("malformed response from {url}: {reason}")]
    Malformed { url: String, reason: String },
}

/// Kubernetes distributions Rancher can manage.
///
/// Closed set: an unknown driver string maps to `None` in
/// [`Distribution::from_driver`] instead of silently inventing a new
/// series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Distribution {
    Rke,
    Rke2,
    K3s,
    Eks,
    Aks,
    Gke,
}

impl Distribution {
    pub const ALL: [Distribution; 6] = [
        Distribution::Rke,
        Distribution::Rke2,
        Distribution::K3s,
        Distribution::Eks,
        Distribution::Aks,
        Distribution::Gke,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Distribution::Rke => "rke",
            Distribution::Rke2 => "rke2",
            Distribution::K3s => "k3s",
            Distribution::Eks => "eks",
            Distribution::Aks => "aks",
            Distribution::Gke => "gke",
        }
    }

    /// Maps a Rancher cluster driver/provider string to a distribution.
    pub fn from_driver(driver: &str) -> Option<Distribution> {
        match driver {
            "rancherKubernetesEngine" | "rke" => Some(Distribution::Rke),
            "rke2" => Some(Distribution::Rke2),
            "k3s" => Some(Distribution::K3s),
            "EKS" | "eks" | "amazonElasticContainerService" => Some(Distribution::Eks),
            "AKS" | "aks" | "azureKubernetesService" => Some(Distribution::Aks),
            "GKE" | "gke" | "googleKubernetesEngine" => Some(Distribution::Gke),
            _ => None,
        }
    }
}

/// Managed-cluster counts broken down by distribution.
///
/// One dedicated counter per known distribution rather than a
/// string-keyed map, so a new distribution has to be added here and in
/// the metric set together.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DistributionCounts {
    pub rke: u64,
    pub rke2: u64,
    pub k3s: u64,
    pub eks: u64,
    pub aks: u64,
    pub gke: u64,
}

impl DistributionCounts {
    pub fn count_for(&self, distribution: Distribution) -> u64 {
        match distribution {
            Distribution::Rke => self.rke,
            Distribution::Rke2 => self.rke2,
            Distribution::K3s => self.k3s,
            Distribution::Eks => self.eks,
            Distribution::Aks => self.aks,
            Distribution::Gke => self.gke,
        }
    }

    pub fn increment(&mut self, distribution: Distribution) {
        match distribution {
            Distribution::Rke => self.rke += 1,
            Distribution::Rke2 => self.rke2 += 1,
            Distribution::K3s => self.k3s += 1,
            Distribution::Eks => self.eks += 1,
            Distribution::Aks => self.aks += 1,
            Distribution::Gke => self.gke += 1,
        }
    }
}

/// Kubernetes version reported by a downstream cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterVersion {
    pub name: String,
    pub version: String,
}

/// One label or annotation attached to a Rancher project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectAttribute {
    pub cluster_name: String,
    pub project_id: String,
    pub project_display_name: String,
    pub key: String,
    pub value: String,
}

/// One resource-quota entry of a Rancher project.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectResourceQuota {
    pub cluster_name: String,
    pub project_id: String,
    pub project_display_name: String,
    pub resource_key: String,
    pub resource_type: String,
    pub value: f64,
}

/// Read capabilities of the Rancher control plane consumed by the
/// collector. Implementations must be safe for concurrent use: all
/// fetchers of a cycle call into the same instance at once.
#[async_trait]
pub trait RancherApi: Send + Sync {
    /// Version of the Rancher instance being scraped.
    async fn installed_rancher_version(&self) -> Result<String, ClientError>;

    /// Most recent released Rancher version. Backed by a rate-limited
    /// release feed, so only the slow cycle may call this.
    async fn latest_rancher_version(&self) -> Result<String, ClientError>;

    async fn managed_cluster_count(&self) -> Result<u64, ClientError>;

    async fn k8s_distributions(&self) -> Result<DistributionCounts, ClientError>;

    async fn managed_node_count(&self) -> Result<u64, ClientError>;

    /// Connectivity of each downstream cluster, keyed by cluster name.
    async fn cluster_connected_states(&self) -> Result<HashMap<String, bool>, ClientError>;

    async fn downstream_cluster_versions(&self) -> Result<Vec<ClusterVersion>, ClientError>;

    async fn user_count(&self) -> Result<u64, ClientError>;

    async fn token_count(&self) -> Result<u64, ClientError>;

    async fn project_count(&self) -> Result<u64, ClientError>;

    async fn project_labels(&self) -> Result<Vec<ProjectAttribute>, ClientError>;

    async fn project_annotations(&self) -> Result<Vec<ProjectAttribute>, ClientError>;

    async fn project_resource_quotas(&self) -> Result<Vec<ProjectResourceQuota>, ClientError>;

    /// Raw object counts of Rancher custom resources, keyed by resource
    /// kind name.
    async fn custom_resource_counts(&self) -> Result<HashMap<String, u64>, ClientError>;
}
