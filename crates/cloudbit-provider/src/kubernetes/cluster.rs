//! `cloudbit_kubernetes_cluster`

use crate::common::{
    encode_all, found, id_attribute, id_filter, int_attr, location_attribute, wait_context,
};
use crate::config::ClientHandle;
use crate::error::{ClientResultExt, ProviderError, Result};
use crate::filter;
use crate::wait::{wait_for_deletion, wait_for_order, wait_for_status};
use async_trait::async_trait;
use cloudbit_client::{
    CLUSTER_STATUS_RUNNING, Client, KubernetesCluster, KubernetesClusterCreate,
    KubernetesClusterUpdate, WorkerNodesUpdate,
};
use cloudbit_plugin::{Attribute, DataSource, OperationContext, Resource, Schema, Validator, Value};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ClusterModel {
    id: Option<i64>,
    name: Option<String>,
    location_id: Option<i64>,
    network_id: Option<i64>,
    security_group_id: Option<i64>,
    public: Option<bool>,
    public_address: Option<String>,
    dns_name: Option<String>,
    version_id: Option<i64>,
    node_count: Option<i64>,
    node_product_id: Option<i64>,
    status: Option<String>,
}

impl From<&KubernetesCluster> for ClusterModel {
    fn from(cluster: &KubernetesCluster) -> Self {
        Self {
            id: Some(cluster.id),
            name: Some(cluster.name.clone()),
            location_id: Some(cluster.location.id),
            network_id: Some(cluster.network.id),
            security_group_id: cluster.security_group.as_ref().map(|g| g.id),
            public: Some(cluster.is_public()),
            public_address: cluster.public_address.clone().filter(|a| !a.is_empty()),
            dns_name: cluster.dns_name.clone().filter(|n| !n.is_empty()),
            version_id: Some(cluster.version.id),
            node_count: Some(cluster.node_count),
            node_product_id: cluster.node_product.as_ref().map(|p| p.id),
            status: Some(cluster.status.key.clone()),
        }
    }
}

async fn wait_for_cluster_running(ctx: &OperationContext, client: &Client, id: i64) -> Result<()> {
    wait_for_status(ctx, CLUSTER_STATUS_RUNNING, move || async move {
        let cluster = client
            .kubernetes()
            .get(id)
            .await
            .action("get kubernetes cluster")?;
        Ok(cluster.status.key)
    })
    .await
}

pub struct ClusterResource {
    client: ClientHandle,
}

impl ClusterResource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }

    async fn state(&self, client: &Client, id: i64) -> Result<Value> {
        let cluster = client
            .kubernetes()
            .get(id)
            .await
            .action("get kubernetes cluster")?;
        Ok(Value::encode(&ClusterModel::from(&cluster))?)
    }
}

#[async_trait]
impl Resource for ClusterResource {
    type Error = ProviderError;

    fn type_name(&self) -> &str {
        "cloudbit_kubernetes_cluster"
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![
            id_attribute("cluster"),
            Attribute::string("name")
                .description("name of the cluster")
                .required()
                .validator(Validator::NonEmpty),
            location_attribute("cluster"),
            Attribute::int64("network_id")
                .description("network the nodes are connected to")
                .required()
                .requires_replace(),
            Attribute::int64("security_group_id")
                .description("security group created for the cluster")
                .computed()
                .use_state_for_unknown(),
            Attribute::bool("public")
                .description("whether the API server is reachable from the internet")
                .optional()
                .requires_replace()
                .default(true),
            Attribute::string("public_address")
                .description("public address of the API server")
                .computed()
                .use_state_for_unknown(),
            Attribute::string("dns_name")
                .description("DNS name of the API server")
                .computed()
                .use_state_for_unknown(),
            Attribute::int64("version_id")
                .description("Kubernetes version of the cluster")
                .computed()
                .use_state_for_unknown(),
            Attribute::int64("node_count")
                .description("number of worker nodes")
                .required()
                .validator(Validator::int_range(1, 100)),
            Attribute::int64("node_product_id")
                .description("product of the worker nodes")
                .required(),
            Attribute::string("status")
                .description("status of the cluster")
                .computed(),
        ])
        .description("Managed Kubernetes cluster.")
    }

    async fn create(&self, ctx: &OperationContext, planned: &Value) -> Result<Value> {
        let client = self.client.get().await?;
        let plan: ClusterModel = planned.decode()?;

        let body = KubernetesClusterCreate {
            name: plan.name.unwrap_or_default(),
            location_id: plan.location_id.unwrap_or_default(),
            network_id: plan.network_id.unwrap_or_default(),
            attach_external_ip: plan.public.unwrap_or(true),
            worker_product_id: plan.node_product_id.unwrap_or_default(),
            worker_count: plan.node_count.unwrap_or_default(),
        };
        let ordering = client
            .kubernetes()
            .create(&body)
            .await
            .action("create kubernetes cluster")?;

        let ctx = wait_context(ctx);
        let order = wait_for_order(&ctx, &client.orders(), &ordering).await?;
        let id = order.product_instance_id.ok_or_else(|| {
            ProviderError::invalid_state(format!(
                "order {} did not reference a kubernetes cluster",
                order.id
            ))
        })?;
        info!(id, "kubernetes cluster ordered");

        wait_for_cluster_running(&ctx, &client, id).await?;
        self.state(&client, id).await
    }

    async fn read(&self, _ctx: &OperationContext, state: &Value) -> Result<Option<Value>> {
        let client = self.client.get().await?;
        let id = int_attr(state, "id")?;

        match found(client.kubernetes().get(id).await, "get kubernetes cluster")? {
            Some(cluster) => Ok(Some(Value::encode(&ClusterModel::from(&cluster))?)),
            None => Ok(None),
        }
    }

    async fn update(&self, ctx: &OperationContext, prior: &Value, planned: &Value) -> Result<Value> {
        let client = self.client.get().await?;
        let id = int_attr(prior, "id")?;
        let before: ClusterModel = prior.decode()?;
        let plan: ClusterModel = planned.decode()?;
        let ctx = wait_context(ctx);

        if plan.name != before.name {
            let body = KubernetesClusterUpdate {
                name: plan.name.clone().unwrap_or_default(),
            };
            client
                .kubernetes()
                .update(id, &body)
                .await
                .action("update kubernetes cluster")?;
        }

        if plan.node_count != before.node_count || plan.node_product_id != before.node_product_id {
            let body = WorkerNodesUpdate {
                worker_product_id: plan.node_product_id.unwrap_or_default(),
                worker_count: plan.node_count.unwrap_or_default(),
            };
            client
                .kubernetes()
                .update_worker_nodes(id, &body)
                .await
                .action("update kubernetes worker nodes")?;
            wait_for_cluster_running(&ctx, &client, id).await?;
        }

        self.state(&client, id).await
    }

    async fn delete(&self, ctx: &OperationContext, state: &Value) -> Result<()> {
        let client = self.client.get().await?;
        let id = int_attr(state, "id")?;

        if found(client.kubernetes().delete(id).await, "delete kubernetes cluster")?.is_none() {
            return Ok(());
        }

        let ctx = wait_context(ctx);
        let clusters = client.kubernetes();
        wait_for_deletion(&ctx, || clusters.get(id)).await
    }
}

pub struct ClusterDataSource {
    client: ClientHandle,
}

impl ClusterDataSource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for ClusterDataSource {
    type Error = ProviderError;

    fn type_name(&self) -> &str {
        "cloudbit_kubernetes_cluster"
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![
            id_filter("cluster"),
            Attribute::string("name")
                .description("name of the cluster")
                .optional()
                .computed(),
            Attribute::int64("location_id")
                .description("location of the cluster")
                .optional()
                .computed(),
            Attribute::int64("network_id")
                .description("network the nodes are connected to")
                .optional()
                .computed(),
            Attribute::int64("security_group_id")
                .description("security group of the cluster")
                .computed(),
            Attribute::bool("public")
                .description("whether the API server is reachable from the internet")
                .computed(),
            Attribute::string("public_address")
                .description("public address of the API server")
                .computed(),
            Attribute::string("dns_name")
                .description("DNS name of the API server")
                .computed(),
            Attribute::int64("version_id")
                .description("Kubernetes version of the cluster")
                .computed(),
            Attribute::int64("node_count")
                .description("number of worker nodes")
                .computed(),
            Attribute::int64("node_product_id")
                .description("product of the worker nodes")
                .computed(),
            Attribute::string("status")
                .description("status of the cluster")
                .computed(),
        ])
    }

    async fn read(&self, _ctx: &OperationContext, config: &Value) -> Result<Value> {
        let client = self.client.get().await?;
        let clusters = client
            .kubernetes()
            .list()
            .await
            .action("list kubernetes clusters")?;

        let candidates = encode_all::<_, ClusterModel>(&clusters)?;
        filter::find_one("kubernetes cluster", &self.schema(), config, candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudbit_client::{Product, Reference};

    #[test]
    fn test_cluster_model() {
        let cluster = KubernetesCluster {
            id: 12,
            name: "prod".to_string(),
            network: Reference {
                id: 3,
                name: "default".to_string(),
            },
            public_address: Some("185.98.122.10".to_string()),
            node_count: 3,
            node_product: Some(Product {
                id: 44,
                ..Product::default()
            }),
            ..KubernetesCluster::default()
        };

        let model = ClusterModel::from(&cluster);
        assert_eq!(model.public, Some(true));
        assert_eq!(model.network_id, Some(3));
        assert_eq!(model.node_product_id, Some(44));
        assert_eq!(model.security_group_id, None);
        assert_eq!(model.dns_name, None);
    }
}
