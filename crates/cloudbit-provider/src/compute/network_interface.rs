//! `cloudbit_compute_network_interface`

use crate::common::{deleted, found, id_attribute, id_filter, int_attr};
use crate::config::ClientHandle;
use crate::error::{ClientResultExt, ProviderError, Result};
use crate::filter;
use async_trait::async_trait;
use cloudbit_client::{NetworkInterface, NetworkInterfaceCreate};
use cloudbit_plugin::{
    Attribute, AttributeType, DataSource, Diagnostics, OperationContext, Resource, Schema,
    Validator, Value, import_ids,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct NetworkInterfaceModel {
    id: Option<i64>,
    server_id: Option<i64>,
    network_id: Option<i64>,
    private_ip: Option<String>,
    mac_address: Option<String>,
    security: Option<bool>,
    security_group_ids: Option<Vec<i64>>,
    public_ip: Option<String>,
}

impl NetworkInterfaceModel {
    fn new(server_id: i64, interface: &NetworkInterface) -> Self {
        Self {
            id: Some(interface.id),
            server_id: Some(server_id),
            network_id: Some(interface.network.id),
            private_ip: Some(interface.private_ip.clone()),
            mac_address: Some(interface.mac_address.clone()),
            security: Some(interface.security),
            security_group_ids: Some(interface.security_groups.iter().map(|g| g.id).collect()),
            public_ip: interface.public_ip.clone().filter(|ip| !ip.is_empty()),
        }
    }
}

pub struct NetworkInterfaceResource {
    client: ClientHandle,
}

impl NetworkInterfaceResource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for NetworkInterfaceResource {
    type Error = ProviderError;

    fn type_name(&self) -> &str {
        "cloudbit_compute_network_interface"
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![
            id_attribute("network interface"),
            Attribute::int64("server_id")
                .description("server the interface is attached to")
                .required()
                .requires_replace(),
            Attribute::int64("network_id")
                .description("network the interface connects to")
                .required()
                .requires_replace(),
            Attribute::string("private_ip")
                .description("address of the interface within the network")
                .optional()
                .computed()
                .requires_replace()
                .use_state_for_unknown()
                .validator(Validator::IpAddress),
            Attribute::set("security_group_ids", AttributeType::Int64)
                .description("security groups applied to the interface")
                .optional()
                .computed()
                .use_state_for_unknown(),
            Attribute::string("mac_address")
                .description("hardware address of the interface")
                .computed()
                .use_state_for_unknown(),
            Attribute::bool("security")
                .description("whether port security is enabled")
                .computed()
                .use_state_for_unknown(),
            Attribute::string("public_ip")
                .description("elastic ip attached to the interface")
                .computed(),
        ])
        .description("Additional network interface of a server.")
    }

    async fn create(&self, _ctx: &OperationContext, planned: &Value) -> Result<Value> {
        let client = self.client.get().await?;
        let plan: NetworkInterfaceModel = planned.decode()?;
        let server_id = int_attr(planned, "server_id")?;

        let body = NetworkInterfaceCreate {
            network_id: plan.network_id.unwrap_or_default(),
            private_ip: plan.private_ip,
            security_group_ids: plan.security_group_ids.unwrap_or_default(),
        };
        let interface = client
            .servers()
            .network_interfaces(server_id)
            .create(&body)
            .await
            .action("create network interface")?;

        Ok(Value::encode(&NetworkInterfaceModel::new(server_id, &interface))?)
    }

    async fn read(&self, _ctx: &OperationContext, state: &Value) -> Result<Option<Value>> {
        let client = self.client.get().await?;
        let server_id = int_attr(state, "server_id")?;
        let id = int_attr(state, "id")?;

        match found(
            client.servers().network_interfaces(server_id).get(id).await,
            "get network interface",
        )? {
            Some(interface) => Ok(Some(Value::encode(&NetworkInterfaceModel::new(
                server_id, &interface,
            ))?)),
            None => Ok(None),
        }
    }

    async fn update(&self, _ctx: &OperationContext, prior: &Value, planned: &Value) -> Result<Value> {
        let client = self.client.get().await?;
        let server_id = int_attr(prior, "server_id")?;
        let id = int_attr(prior, "id")?;
        let plan: NetworkInterfaceModel = planned.decode()?;

        let interface = client
            .servers()
            .update_network_interface_security_groups(
                server_id,
                id,
                plan.security_group_ids.unwrap_or_default(),
            )
            .await
            .action("update network interface security groups")?;

        Ok(Value::encode(&NetworkInterfaceModel::new(server_id, &interface))?)
    }

    async fn delete(&self, _ctx: &OperationContext, state: &Value) -> Result<()> {
        let client = self.client.get().await?;
        let server_id = int_attr(state, "server_id")?;
        let id = int_attr(state, "id")?;
        deleted(
            client.servers().network_interfaces(server_id).delete(id).await,
            "delete network interface",
        )
    }

    fn import(&self, id: &str) -> std::result::Result<Value, Diagnostics> {
        import_ids(id, &["server_id", "id"])
    }
}

pub struct NetworkInterfaceDataSource {
    client: ClientHandle,
}

impl NetworkInterfaceDataSource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for NetworkInterfaceDataSource {
    type Error = ProviderError;

    fn type_name(&self) -> &str {
        "cloudbit_compute_network_interface"
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![
            Attribute::int64("server_id")
                .description("server the interface is attached to")
                .required(),
            id_filter("network interface"),
            Attribute::int64("network_id")
                .description("network the interface connects to")
                .optional()
                .computed(),
            Attribute::string("private_ip")
                .description("address of the interface within the network")
                .optional()
                .computed(),
            Attribute::set("security_group_ids", AttributeType::Int64)
                .description("security groups applied to the interface")
                .computed(),
            Attribute::string("mac_address")
                .description("hardware address of the interface")
                .computed(),
            Attribute::bool("security")
                .description("whether port security is enabled")
                .computed(),
            Attribute::string("public_ip")
                .description("elastic ip attached to the interface")
                .computed(),
        ])
    }

    async fn read(&self, _ctx: &OperationContext, config: &Value) -> Result<Value> {
        let client = self.client.get().await?;
        let server_id = int_attr(config, "server_id")?;
        let interfaces = client
            .servers()
            .network_interfaces(server_id)
            .list()
            .await
            .action("list network interfaces")?;

        let candidates = interfaces
            .iter()
            .map(|i| Value::encode(&NetworkInterfaceModel::new(server_id, i)))
            .collect::<cloudbit_plugin::Result<Vec<_>>>()?;
        filter::find_one("network interface", &self.schema(), config, candidates)
    }
}
