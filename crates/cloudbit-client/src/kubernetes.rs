//! Managed Kubernetes clusters

use crate::client::{Client, Collection};
use crate::entities::{Kind, Location, Product, Reference};
use crate::error::Result;
use crate::order::Ordering;
use serde::{Deserialize, Serialize};

pub const CLUSTER_STATUS_RUNNING: &str = "running";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KubernetesCluster {
    pub id: i64,
    pub name: String,
    pub location: Location,
    pub network: Reference,
    pub security_group: Option<Reference>,
    pub public_address: Option<String>,
    pub dns_name: Option<String>,
    pub version: Reference,
    pub status: Kind,
    pub node_count: i64,
    pub node_product: Option<Product>,
}

impl KubernetesCluster {
    /// Clusters with an external address are reachable from the internet
    pub fn is_public(&self) -> bool {
        self.public_address.as_deref().is_some_and(|a| !a.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KubernetesClusterCreate {
    pub name: String,
    pub location_id: i64,
    pub network_id: i64,
    pub attach_external_ip: bool,
    pub worker_product_id: i64,
    pub worker_count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KubernetesClusterUpdate {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorkerNodesUpdate {
    pub worker_product_id: i64,
    pub worker_count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KubeConfig {
    pub kube_config: String,
}

pub struct KubernetesService<'a> {
    client: &'a Client,
}

impl<'a> KubernetesService<'a> {
    fn collection(&self) -> Collection<'a, KubernetesCluster> {
        self.client.collection("v4/kubernetes/clusters")
    }

    fn path(&self, id: i64) -> String {
        format!("v4/kubernetes/clusters/{}", id)
    }

    pub async fn list(&self) -> Result<Vec<KubernetesCluster>> {
        self.collection().list().await
    }

    pub async fn get(&self, id: i64) -> Result<KubernetesCluster> {
        self.collection().get(id).await
    }

    /// Order a new cluster
    pub async fn create(&self, body: &KubernetesClusterCreate) -> Result<Ordering> {
        self.client.post("v4/kubernetes/clusters", body).await
    }

    pub async fn update(&self, id: i64, body: &KubernetesClusterUpdate) -> Result<KubernetesCluster> {
        self.collection().update(id, body).await
    }

    pub async fn update_worker_nodes(&self, id: i64, body: &WorkerNodesUpdate) -> Result<()> {
        self.client
            .patch_no_content(&format!("{}/worker-nodes", self.path(id)), body)
            .await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.collection().delete(id).await
    }

    pub async fn kube_config(&self, id: i64) -> Result<KubeConfig> {
        self.client
            .get(&format!("{}/kube-config", self.path(id)))
            .await
    }
}

impl Client {
    pub fn kubernetes(&self) -> KubernetesService<'_> {
        KubernetesService { client: self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_public_from_address() {
        let mut cluster = KubernetesCluster::default();
        assert!(!cluster.is_public());

        cluster.public_address = Some(String::new());
        assert!(!cluster.is_public());

        cluster.public_address = Some("185.98.122.10".to_string());
        assert!(cluster.is_public());
    }
}
