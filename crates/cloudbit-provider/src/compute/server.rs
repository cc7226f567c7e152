//! `cloudbit_compute_server`
//!
//! Servers are ordered: the create call returns an order that is polled
//! until it references the new instance, which is then polled until it is
//! running.

use crate::common::{
    encode_all, found, id_attribute, id_filter, int_attr, location_attribute, wait_context,
};
use crate::config::ClientHandle;
use crate::error::{ClientResultExt, ProviderError, Result};
use crate::filter;
use crate::wait::{STATUS_ERROR, wait_for_condition, wait_for_deletion, wait_for_order, wait_for_status};
use async_trait::async_trait;
use cloudbit_client::{
    Client, SERVER_ACTION_START, SERVER_ACTION_STOP, SERVER_STATUS_RUNNING,
    SERVER_STATUS_STOPPED, SERVER_STATUS_WORKING, Server, ServerCreate, ServerNetworkRequest,
    ServerUpdate,
};
use cloudbit_plugin::{Attribute, DataSource, OperationContext, Resource, Schema, Validator, Value};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const DEFAULT_BOOT_VOLUME_SIZE: i64 = 20;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ServerModel {
    id: Option<i64>,
    name: Option<String>,
    location_id: Option<i64>,
    image_id: Option<i64>,
    product_id: Option<i64>,
    network_id: Option<i64>,
    private_ip: Option<String>,
    public_ip: Option<String>,
    key_pair_id: Option<i64>,
    password: Option<String>,
    user_data: Option<String>,
    boot_volume_size: Option<i64>,
    status: Option<String>,
}

impl From<&Server> for ServerModel {
    fn from(server: &Server) -> Self {
        let primary = server.networks.first();
        Self {
            id: Some(server.id),
            name: Some(server.name.clone()),
            location_id: Some(server.location.id),
            image_id: Some(server.image.id),
            product_id: Some(server.product.id),
            network_id: primary.map(|n| n.network.id),
            private_ip: primary.map(|n| n.private_ip.clone()),
            public_ip: primary
                .and_then(|n| n.public_ip.clone())
                .filter(|ip| !ip.is_empty()),
            key_pair_id: server.key_pair.as_ref().map(|k| k.id),
            password: None,
            user_data: None,
            boot_volume_size: server.volumes.iter().find(|v| v.root).map(|v| v.size),
            status: Some(server.status.key.clone()),
        }
    }
}

impl ServerModel {
    /// Carry over what the API does not return
    fn merge_config(mut self, config: &ServerModel) -> Self {
        self.password = config.password.clone();
        self.user_data = config.user_data.clone();
        if self.boot_volume_size.is_none() {
            self.boot_volume_size = config.boot_volume_size;
        }
        self
    }
}

async fn wait_for_server_status(
    ctx: &OperationContext,
    client: &Client,
    id: i64,
    wanted: &str,
) -> Result<()> {
    wait_for_status(ctx, wanted, move || async move {
        let server = client.servers().get(id).await.action("get server")?;
        Ok(server.status.key)
    })
    .await
}

/// Wait until a server leaves the transitional `working` status
async fn wait_for_server_idle(ctx: &OperationContext, client: &Client, id: i64) -> Result<()> {
    wait_for_condition(ctx, move || async move {
        let server = client.servers().get(id).await.action("get server")?;
        if server.status.key == STATUS_ERROR {
            return Err(ProviderError::invalid_state(format!(
                "server {} entered status {:?}",
                id, server.status.key
            )));
        }
        Ok(server.status.key != SERVER_STATUS_WORKING)
    })
    .await
}

async fn set_server_status(
    ctx: &OperationContext,
    client: &Client,
    id: i64,
    wanted: &str,
) -> Result<()> {
    let action = match wanted {
        SERVER_STATUS_RUNNING => SERVER_ACTION_START,
        SERVER_STATUS_STOPPED => SERVER_ACTION_STOP,
        other => {
            return Err(ProviderError::invalid_state(format!(
                "unsupported server status {:?}",
                other
            )));
        }
    };

    debug!(id, action, "changing server status");
    client
        .servers()
        .action(id, action)
        .await
        .action(format!("{} server", action))?;
    wait_for_server_status(ctx, client, id, wanted).await
}

pub struct ServerResource {
    client: ClientHandle,
}

impl ServerResource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }

    async fn state(&self, client: &Client, id: i64, config: &ServerModel) -> Result<Value> {
        let server = client.servers().get(id).await.action("get server")?;
        Ok(Value::encode(&ServerModel::from(&server).merge_config(config))?)
    }
}

#[async_trait]
impl Resource for ServerResource {
    type Error = ProviderError;

    fn type_name(&self) -> &str {
        "cloudbit_compute_server"
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![
            id_attribute("server"),
            Attribute::string("name")
                .description("name of the server")
                .required()
                .validator(Validator::NonEmpty),
            location_attribute("server"),
            Attribute::int64("image_id")
                .description("operating system image of the server")
                .required()
                .requires_replace(),
            Attribute::int64("product_id")
                .description("product (flavor) of the server, changing it upgrades the server")
                .required(),
            Attribute::int64("network_id")
                .description("network of the primary interface")
                .required()
                .requires_replace(),
            Attribute::string("private_ip")
                .description("address of the primary interface")
                .optional()
                .computed()
                .requires_replace()
                .use_state_for_unknown()
                .validator(Validator::IpAddress),
            Attribute::string("public_ip")
                .description("public address attached to the primary interface")
                .computed(),
            Attribute::int64("key_pair_id")
                .description("key pair installed on the server")
                .optional()
                .requires_replace(),
            Attribute::string("password")
                .description("password of the default user (windows images)")
                .optional()
                .sensitive()
                .requires_replace(),
            Attribute::string("user_data")
                .description("cloud-init user data")
                .optional()
                .requires_replace(),
            Attribute::int64("boot_volume_size")
                .description("size of the boot volume in GiB")
                .optional()
                .requires_replace()
                .default(DEFAULT_BOOT_VOLUME_SIZE)
                .validator(Validator::int_range(5, 4096)),
            Attribute::string("status")
                .description("desired status of the server, `running` or `stopped`")
                .optional()
                .computed()
                .use_state_for_unknown()
                .validator(Validator::one_of([SERVER_STATUS_RUNNING, SERVER_STATUS_STOPPED])),
        ])
        .description("Compute instance.")
    }

    async fn create(&self, ctx: &OperationContext, planned: &Value) -> Result<Value> {
        let client = self.client.get().await?;
        let plan: ServerModel = planned.decode()?;

        let body = ServerCreate {
            name: plan.name.clone().unwrap_or_default(),
            location_id: plan.location_id.unwrap_or_default(),
            image_id: plan.image_id.unwrap_or_default(),
            product_id: plan.product_id.unwrap_or_default(),
            boot_volume_size: plan.boot_volume_size.unwrap_or(DEFAULT_BOOT_VOLUME_SIZE),
            key_pair_id: plan.key_pair_id,
            password: plan.password.clone(),
            user_data: plan.user_data.clone(),
            networks: vec![ServerNetworkRequest {
                network_id: plan.network_id.unwrap_or_default(),
                private_ip: plan.private_ip.clone(),
                security_group_ids: Vec::new(),
            }],
            volume_ids: Vec::new(),
        };

        let ordering = client.servers().create(&body).await.action("create server")?;

        let ctx = wait_context(ctx);
        let order = wait_for_order(&ctx, &client.orders(), &ordering).await?;
        let id = order.product_instance_id.ok_or_else(|| {
            ProviderError::invalid_state(format!("order {} did not reference a server", order.id))
        })?;
        info!(id, "server ordered");

        wait_for_server_status(&ctx, &client, id, SERVER_STATUS_RUNNING).await?;
        if plan.status.as_deref() == Some(SERVER_STATUS_STOPPED) {
            set_server_status(&ctx, &client, id, SERVER_STATUS_STOPPED).await?;
        }

        self.state(&client, id, &plan).await
    }

    async fn read(&self, _ctx: &OperationContext, state: &Value) -> Result<Option<Value>> {
        let client = self.client.get().await?;
        let current: ServerModel = state.decode()?;
        let id = int_attr(state, "id")?;

        match found(client.servers().get(id).await, "get server")? {
            Some(server) => Ok(Some(Value::encode(
                &ServerModel::from(&server).merge_config(&current),
            )?)),
            None => Ok(None),
        }
    }

    async fn update(&self, ctx: &OperationContext, prior: &Value, planned: &Value) -> Result<Value> {
        let client = self.client.get().await?;
        let id = int_attr(prior, "id")?;
        let before: ServerModel = prior.decode()?;
        let plan: ServerModel = planned.decode()?;
        let ctx = wait_context(ctx);

        if plan.name != before.name {
            let body = ServerUpdate {
                name: plan.name.clone().unwrap_or_default(),
            };
            client
                .servers()
                .update(id, &body)
                .await
                .action("update server")?;
        }

        if plan.product_id != before.product_id {
            let product_id = plan.product_id.unwrap_or_default();
            client
                .servers()
                .upgrade(id, product_id)
                .await
                .action("upgrade server")?;
            wait_for_server_idle(&ctx, &client, id).await?;
        }

        if let Some(wanted) = plan.status.as_deref() {
            let server = client.servers().get(id).await.action("get server")?;
            if server.status.key != wanted {
                set_server_status(&ctx, &client, id, wanted).await?;
            }
        }

        self.state(&client, id, &plan).await
    }

    async fn delete(&self, ctx: &OperationContext, state: &Value) -> Result<()> {
        let client = self.client.get().await?;
        let id = int_attr(state, "id")?;

        if found(client.servers().delete(id).await, "delete server")?.is_none() {
            return Ok(());
        }

        let ctx = wait_context(ctx);
        let servers = client.servers();
        wait_for_deletion(&ctx, || servers.get(id)).await
    }
}

pub struct ServerDataSource {
    client: ClientHandle,
}

impl ServerDataSource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for ServerDataSource {
    type Error = ProviderError;

    fn type_name(&self) -> &str {
        "cloudbit_compute_server"
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![
            id_filter("server"),
            Attribute::string("name")
                .description("name of the server")
                .optional()
                .computed(),
            Attribute::int64("location_id")
                .description("location of the server")
                .optional()
                .computed(),
            Attribute::string("status")
                .description("status of the server")
                .optional()
                .computed(),
            Attribute::int64("image_id")
                .description("operating system image of the server")
                .computed(),
            Attribute::int64("product_id")
                .description("product (flavor) of the server")
                .computed(),
            Attribute::int64("network_id")
                .description("network of the primary interface")
                .computed(),
            Attribute::string("private_ip")
                .description("address of the primary interface")
                .computed(),
            Attribute::string("public_ip")
                .description("public address attached to the primary interface")
                .computed(),
            Attribute::int64("key_pair_id")
                .description("key pair installed on the server")
                .computed(),
        ])
    }

    async fn read(&self, _ctx: &OperationContext, config: &Value) -> Result<Value> {
        let client = self.client.get().await?;
        let servers = client.servers().list().await.action("list servers")?;

        let candidates = encode_all::<_, ServerModel>(&servers)?;
        filter::find_one("server", &self.schema(), config, candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_keeps_secrets_from_config() {
        let server: Server = serde_json::from_value(serde_json::json!({
            "id": 11,
            "name": "web-1",
            "status": {"id": 1, "name": "Running", "key": "running"},
            "image": {"id": 3},
            "product": {"id": 4, "product_name": "b1.1x1"},
            "location": {"id": 1},
            "networks": [
                {"id": 20, "private_ip": "10.0.0.5", "network": {"id": 8, "name": "lan"}}
            ],
            "key_pair": {"id": 6, "name": "deploy"}
        }))
        .unwrap();

        let config = ServerModel {
            password: Some("hunter2".to_string()),
            boot_volume_size: Some(50),
            ..Default::default()
        };
        let model = ServerModel::from(&server).merge_config(&config);

        assert_eq!(model.network_id, Some(8));
        assert_eq!(model.private_ip.as_deref(), Some("10.0.0.5"));
        assert_eq!(model.public_ip, None);
        assert_eq!(model.key_pair_id, Some(6));
        assert_eq!(model.password.as_deref(), Some("hunter2"));
        assert_eq!(model.boot_volume_size, Some(50));
        assert_eq!(model.status.as_deref(), Some("running"));
    }
}
