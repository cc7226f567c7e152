//! `cloudbit_kubernetes_kube_config`

use crate::common::int_attr;
use crate::config::ClientHandle;
use crate::error::{ClientResultExt, ProviderError, Result};
use async_trait::async_trait;
use cloudbit_plugin::{Attribute, DataSource, OperationContext, Schema, Value};

pub struct KubeConfigDataSource {
    client: ClientHandle,
}

impl KubeConfigDataSource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for KubeConfigDataSource {
    type Error = ProviderError;

    fn type_name(&self) -> &str {
        "cloudbit_kubernetes_kube_config"
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![
            Attribute::int64("cluster_id")
                .description("cluster to fetch the configuration of")
                .required(),
            Attribute::string("kube_config")
                .description("kubeconfig granting admin access to the cluster")
                .computed()
                .sensitive(),
        ])
        .description("Admin kubeconfig of a Kubernetes cluster.")
    }

    async fn read(&self, _ctx: &OperationContext, config: &Value) -> Result<Value> {
        let client = self.client.get().await?;
        let cluster_id = int_attr(config, "cluster_id")?;

        let kube_config = client
            .kubernetes()
            .kube_config(cluster_id)
            .await
            .action("get kube config")?;

        Ok(Value::object([
            ("cluster_id", Value::from(cluster_id)),
            ("kube_config", Value::from(kube_config.kube_config)),
        ]))
    }
}
