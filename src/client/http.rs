//! HTTP implementation of the Rancher capability interface.
//!
//! Counts come from the v3 collection endpoints, cluster and project
//! detail from the v3 objects, custom-resource counts from the Steve
//! `/v1/counts` resource, and the latest released version from the
//! GitHub release feed (overridable for testing).

use ahash::AHashMap as HashMap;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{
    ClientError, ClusterVersion, Distribution, DistributionCounts, ProjectAttribute,
    ProjectResourceQuota, RancherApi,
};
use crate::config::{Config, DEFAULT_REQUEST_TIMEOUT_SECS};

/// Release feed queried by the slow cycle when no override is configured.
pub const DEFAULT_LATEST_RELEASE_URL: &str =
    "https://api.github.com/repos/rancher/rancher/releases/latest";

const USER_AGENT: &str = concat!("rancher-exporter/", env!("CARGO_PKG_VERSION"));

/// Rancher API client backed by a shared `reqwest::Client`.
///
/// Cloning the inner client is cheap and all methods take `&self`, so a
/// single instance serves every concurrent fetcher of a cycle.
pub struct RancherHttpClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
    latest_release_url: String,
}

impl RancherHttpClient {
    pub fn new(config: &Config) -> Result<Self, Box<dyn std::error::Error>> {
        let base_url = config
            .rancher_url
            .as_deref()
            .ok_or("rancher_url is not configured")?
            .trim_end_matches('/')
            .to_string();

        let timeout = config
            .request_timeout_secs
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout))
            .user_agent(USER_AGENT)
            .danger_accept_invalid_certs(config.insecure_skip_verify.unwrap_or(false))
            .build()?;

        Ok(Self {
            http,
            base_url,
            token: config.rancher_token.clone(),
            latest_release_url: config
                .latest_release_url
                .clone()
                .unwrap_or_else(|| DEFAULT_LATEST_RELEASE_URL.to_string()),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ClientError> {
        let mut request = self.http.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| ClientError::Request {
            url: url.to_string(),
            source: e,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                status,
                url: url.to_string(),
            });
        }

        response.json::<T>().await.map_err(|e| ClientError::Request {
            url: url.to_string(),
            source: e,
        })
    }

    async fn get_v3<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        self.get_json(&url).await
    }

    /// Size of a v3 collection, preferring the server-side total over the
    /// page length.
    async fn collection_total(&self, path: &str) -> Result<u64, ClientError> {
        let collection: Collection<serde_json::Value> = self.get_v3(path).await?;
        Ok(collection
            .pagination
            .and_then(|p| p.total)
            .unwrap_or(collection.data.len() as u64))
    }

    async fn clusters(&self) -> Result<Vec<Cluster>, ClientError> {
        let collection: Collection<Cluster> = self.get_v3("/v3/clusters?limit=-1").await?;
        Ok(collection.data)
    }

    async fn projects(&self) -> Result<Vec<Project>, ClientError> {
        let collection: Collection<Project> = self.get_v3("/v3/projects?limit=-1").await?;
        Ok(collection.data)
    }
}

#[async_trait]
impl RancherApi for RancherHttpClient {
    async fn installed_rancher_version(&self) -> Result<String, ClientError> {
        let url = format!("{}/v3/settings/server-version", self.base_url);
        let setting: Setting = self.get_json(&url).await?;

        setting
            .value
            .filter(|v| !v.is_empty())
            .or(setting.default)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ClientError::Malformed {
                url,
                reason: "server-version setting has no value".to_string(),
            })
    }

    async fn latest_rancher_version(&self) -> Result<String, ClientError> {
        let release: Release = self.get_json(&self.latest_release_url).await?;

        release
            .tag_name
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ClientError::Malformed {
                url: self.latest_release_url.clone(),
                reason: "release has no tag_name".to_string(),
            })
    }

    async fn managed_cluster_count(&self) -> Result<u64, ClientError> {
        self.collection_total("/v3/clusters?limit=-1").await
    }

    async fn k8s_distributions(&self) -> Result<DistributionCounts, ClientError> {
        let mut counts = DistributionCounts::default();

        for cluster in self.clusters().await? {
            let driver = cluster
                .driver
                .as_deref()
                .or(cluster.provider.as_deref())
                .unwrap_or_default();

            match Distribution::from_driver(driver) {
                Some(distribution) => counts.increment(distribution),
                None => debug!(
                    "cluster {} has unrecognized driver {:?}",
                    cluster.id, driver
                ),
            }
        }

        Ok(counts)
    }

    async fn managed_node_count(&self) -> Result<u64, ClientError> {
        self.collection_total("/v3/nodes?limit=-1").await
    }

    async fn cluster_connected_states(&self) -> Result<HashMap<String, bool>, ClientError> {
        let mut states = HashMap::new();

        for cluster in self.clusters().await? {
            let connected = is_connected(&cluster.conditions);
            states.insert(cluster.display_name(), connected);
        }

        Ok(states)
    }

    async fn downstream_cluster_versions(&self) -> Result<Vec<ClusterVersion>, ClientError> {
        let mut versions = Vec::new();

        for cluster in self.clusters().await? {
            if let Some(git_version) = cluster.version.and_then(|v| v.git_version) {
                versions.push(ClusterVersion {
                    name: cluster
                        .name
                        .filter(|n| !n.is_empty())
                        .unwrap_or(cluster.id),
                    version: git_version,
                });
            }
        }

        Ok(versions)
    }

    async fn user_count(&self) -> Result<u64, ClientError> {
        self.collection_total("/v3/users?limit=-1").await
    }

    async fn token_count(&self) -> Result<u64, ClientError> {
        self.collection_total("/v3/tokens?limit=-1").await
    }

    async fn project_count(&self) -> Result<u64, ClientError> {
        self.collection_total("/v3/projects?limit=-1").await
    }

    async fn project_labels(&self) -> Result<Vec<ProjectAttribute>, ClientError> {
        let projects = self.projects().await?;
        Ok(collect_attributes(&projects, |p| &p.labels))
    }

    async fn project_annotations(&self) -> Result<Vec<ProjectAttribute>, ClientError> {
        let projects = self.projects().await?;
        Ok(collect_attributes(&projects, |p| &p.annotations))
    }

    async fn project_resource_quotas(&self) -> Result<Vec<ProjectResourceQuota>, ClientError> {
        let mut quotas = Vec::new();

        for project in self.projects().await? {
            let quota_maps = [
                ("limit", &project.resource_quota),
                ("namespace-default-limit", &project.namespace_default_resource_quota),
            ];

            for (resource_type, spec) in quota_maps {
                let Some(spec) = spec else { continue };

                for (key, raw) in &spec.limit {
                    let Some(value) = parse_quantity(raw) else {
                        debug!(
                            "project {} quota {}={:?} is not a parseable quantity",
                            project.id, key, raw
                        );
                        continue;
                    };

                    quotas.push(ProjectResourceQuota {
                        cluster_name: project.cluster_name(),
                        project_id: project.id.clone(),
                        project_display_name: project.display_name(),
                        resource_key: key.clone(),
                        resource_type: resource_type.to_string(),
                        value,
                    });
                }
            }
        }

        Ok(quotas)
    }

    async fn custom_resource_counts(&self) -> Result<HashMap<String, u64>, ClientError> {
        let url = format!("{}/v1/counts", self.base_url);
        let collection: CountsCollection = self.get_json(&url).await?;
        Ok(cattle_resource_counts(collection))
    }
}

// ---------------------------------------------------------------------------
// Response shapes. Only the fields the collector consumes are modeled.
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct Collection<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
    pagination: Option<Pagination>,
}

#[derive(Deserialize)]
struct Pagination {
    total: Option<u64>,
}

#[derive(Deserialize)]
struct Setting {
    value: Option<String>,
    default: Option<String>,
}

#[derive(Deserialize)]
struct Release {
    tag_name: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Cluster {
    id: String,
    name: Option<String>,
    driver: Option<String>,
    provider: Option<String>,
    version: Option<ClusterVersionInfo>,
    #[serde(default)]
    conditions: Vec<Condition>,
}

impl Cluster {
    fn display_name(&self) -> String {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.id)
            .to_string()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClusterVersionInfo {
    git_version: Option<String>,
}

#[derive(Deserialize)]
struct Condition {
    #[serde(rename = "type")]
    kind: String,
    status: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Project {
    id: String,
    name: Option<String>,
    cluster_id: Option<String>,
    #[serde(default)]
    labels: HashMap<String, String>,
    #[serde(default)]
    annotations: HashMap<String, String>,
    resource_quota: Option<QuotaSpec>,
    namespace_default_resource_quota: Option<QuotaSpec>,
}

impl Project {
    fn display_name(&self) -> String {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.id)
            .to_string()
    }

    /// Project ids carry the owning cluster as a `<cluster>:<project>`
    /// prefix; fall back to that when clusterId is absent.
    fn cluster_name(&self) -> String {
        self.cluster_id
            .as_deref()
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| self.id.split(':').next().unwrap_or(&self.id))
            .to_string()
    }
}

#[derive(Deserialize)]
struct QuotaSpec {
    #[serde(default)]
    limit: HashMap<String, String>,
}

#[derive(Deserialize)]
struct CountsCollection {
    #[serde(default = "Vec::new")]
    data: Vec<CountsItem>,
}

#[derive(Deserialize)]
struct CountsItem {
    #[serde(default)]
    counts: HashMap<String, ResourceCount>,
}

#[derive(Deserialize)]
struct ResourceCount {
    summary: Option<CountSummary>,
}

#[derive(Deserialize)]
struct CountSummary {
    count: Option<u64>,
}

fn is_connected(conditions: &[Condition]) -> bool {
    conditions
        .iter()
        .any(|c| c.kind == "Connected" && c.status.as_deref() == Some("True"))
}

fn collect_attributes<'a, F>(projects: &'a [Project], map_of: F) -> Vec<ProjectAttribute>
where
    F: Fn(&'a Project) -> &'a HashMap<String, String>,
{
    let mut attributes = Vec::new();

    for project in projects {
        for (key, value) in map_of(project) {
            attributes.push(ProjectAttribute {
                cluster_name: project.cluster_name(),
                project_id: project.id.clone(),
                project_display_name: project.display_name(),
                key: key.clone(),
                value: value.clone(),
            });
        }
    }

    attributes
}

fn cattle_resource_counts(collection: CountsCollection) -> HashMap<String, u64> {
    let mut counts = HashMap::new();

    for item in collection.data {
        for (resource, entry) in item.counts {
            if !resource.contains(".cattle.io") {
                continue;
            }
            let count = entry.summary.and_then(|s| s.count).unwrap_or(0);
            counts.insert(resource, count);
        }
    }

    counts
}

/// Parses a Kubernetes quantity string ("500m", "2Gi", "4") into a plain
/// number.
fn parse_quantity(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(value) = raw.parse::<f64>() {
        return Some(value);
    }

    let suffixes: [(&str, f64); 13] = [
        ("Ki", 1024.0),
        ("Mi", 1024.0 * 1024.0),
        ("Gi", 1024.0 * 1024.0 * 1024.0),
        ("Ti", 1024.0_f64.powi(4)),
        ("Pi", 1024.0_f64.powi(5)),
        ("Ei", 1024.0_f64.powi(6)),
        ("m", 1e-3),
        ("k", 1e3),
        ("M", 1e6),
        ("G", 1e9),
        ("T", 1e12),
        ("P", 1e15),
        ("E", 1e18),
    ];

    for (suffix, factor) in suffixes {
        if let Some(number) = raw.strip_suffix(suffix) {
            return number.parse::<f64>().ok().map(|v| v * factor);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_quantity_plain_and_milli() {
        assert_eq!(parse_quantity("4"), Some(4.0));
        assert_eq!(parse_quantity("2.5"), Some(2.5));
        assert_eq!(parse_quantity("500m"), Some(0.5));
    }

    #[test]
    fn parse_quantity_binary_and_decimal_suffixes() {
        assert_eq!(parse_quantity("1Ki"), Some(1024.0));
        assert_eq!(parse_quantity("2Gi"), Some(2.0 * 1024.0 * 1024.0 * 1024.0));
        assert_eq!(parse_quantity("3k"), Some(3000.0));
        assert_eq!(parse_quantity("1M"), Some(1_000_000.0));
    }

    #[test]
    fn parse_quantity_rejects_garbage() {
        assert_eq!(parse_quantity(""), None);
        assert_eq!(parse_quantity("lots"), None);
        assert_eq!(parse_quantity("Gi"), None);
    }

    #[test]
    fn connected_requires_true_status() {
        let conditions = vec![
            Condition {
                kind: "Ready".to_string(),
                status: Some("True".to_string()),
            },
            Condition {
                kind: "Connected".to_string(),
                status: Some("False".to_string()),
            },
        ];
        assert!(!is_connected(&conditions));

        let conditions = vec![Condition {
            kind: "Connected".to_string(),
            status: Some("True".to_string()),
        }];
        assert!(is_connected(&conditions));
    }

    #[test]
    fn counts_are_filtered_to_cattle_groups() {
        let payload = serde_json::json!({
            "data": [{
                "counts": {
                    "management.cattle.io.cluster": {"summary": {"count": 3}},
                    "apps.deployment": {"summary": {"count": 90}},
                    "provisioning.cattle.io.cluster": {"summary": {}}
                }
            }]
        });

        let collection: CountsCollection = serde_json::from_value(payload).unwrap();
        let counts = cattle_resource_counts(collection);

        assert_eq!(counts.get("management.cattle.io.cluster"), Some(&3));
        assert_eq!(counts.get("provisioning.cattle.io.cluster"), Some(&0));
        assert!(!counts.contains_key("apps.deployment"));
    }

    #[test]
    fn cluster_deserializes_from_v3_payload() {
        let payload = serde_json::json!({
            "id": "c-m-abc12345",
            "name": "prod-east",
            "driver": "rke2",
            "version": {"gitVersion": "v1.28.9+rke2r1"},
            "conditions": [
                {"type": "Connected", "status": "True"}
            ]
        });

        let cluster: Cluster = serde_json::from_value(payload).unwrap();
        assert_eq!(cluster.display_name(), "prod-east");
        assert_eq!(cluster.driver.as_deref(), Some("rke2"));
        assert!(is_connected(&cluster.conditions));
        assert_eq!(
            cluster.version.and_then(|v| v.git_version).as_deref(),
            Some("v1.28.9+rke2r1")
        );
    }
}
