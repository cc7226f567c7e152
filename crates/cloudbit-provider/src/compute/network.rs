//! `cloudbit_compute_network`

use crate::common::{
    deleted, encode_all, found, id_attribute, id_filter, int_attr, location_attribute,
};
use crate::config::ClientHandle;
use crate::error::{ClientResultExt, ProviderError, Result};
use crate::filter;
use async_trait::async_trait;
use cloudbit_client::{Network, NetworkCreate, NetworkUpdate};
use cloudbit_plugin::{
    Attribute, AttributeType, DataSource, OperationContext, Resource, Schema, Validator, Value,
};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct NetworkModel {
    id: Option<i64>,
    name: Option<String>,
    description: Option<String>,
    location_id: Option<i64>,
    cidr: Option<String>,
    domain_name_servers: Option<Vec<String>>,
    allocation_pool_start: Option<String>,
    allocation_pool_end: Option<String>,
    gateway_ip: Option<String>,
    used_ips: Option<i64>,
    total_ips: Option<i64>,
}

impl From<&Network> for NetworkModel {
    fn from(network: &Network) -> Self {
        Self {
            id: Some(network.id),
            name: Some(network.name.clone()),
            description: Some(network.description.clone().unwrap_or_default()),
            location_id: Some(network.location.id),
            cidr: Some(network.cidr.clone()),
            domain_name_servers: Some(network.domain_name_servers.clone()),
            allocation_pool_start: Some(network.allocation_pool_start.clone()),
            allocation_pool_end: Some(network.allocation_pool_end.clone()),
            gateway_ip: Some(network.gateway_ip.clone().unwrap_or_default()),
            used_ips: Some(network.used_ips),
            total_ips: Some(network.total_ips),
        }
    }
}

pub struct NetworkResource {
    client: ClientHandle,
}

impl NetworkResource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for NetworkResource {
    type Error = ProviderError;

    fn type_name(&self) -> &str {
        "cloudbit_compute_network"
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![
            id_attribute("network"),
            Attribute::string("name")
                .description("name of the network")
                .required()
                .validator(Validator::NonEmpty),
            Attribute::string("description")
                .description("description of the network")
                .optional()
                .computed()
                .use_state_for_unknown(),
            location_attribute("network"),
            Attribute::string("cidr")
                .description("network address range in CIDR notation")
                .required()
                .requires_replace()
                .validator(Validator::Cidr),
            Attribute::list("domain_name_servers", AttributeType::String)
                .description("list of domain name servers")
                .optional()
                .computed()
                .use_state_for_unknown(),
            Attribute::string("allocation_pool_start")
                .description("first address handed out by DHCP")
                .optional()
                .computed()
                .use_state_for_unknown()
                .validator(Validator::IpAddress),
            Attribute::string("allocation_pool_end")
                .description("last address handed out by DHCP")
                .optional()
                .computed()
                .use_state_for_unknown()
                .validator(Validator::IpAddress),
            Attribute::string("gateway_ip")
                .description("gateway address of the network")
                .optional()
                .computed()
                .use_state_for_unknown()
                .validator(Validator::IpAddress),
        ])
        .description("Private network within a location.")
    }

    async fn create(&self, _ctx: &OperationContext, planned: &Value) -> Result<Value> {
        let client = self.client.get().await?;
        let plan: NetworkModel = planned.decode()?;

        let body = NetworkCreate {
            name: plan.name.unwrap_or_default(),
            description: plan.description,
            location_id: plan.location_id.unwrap_or_default(),
            cidr: plan.cidr.unwrap_or_default(),
            domain_name_servers: plan.domain_name_servers.unwrap_or_default(),
            allocation_pool_start: plan.allocation_pool_start,
            allocation_pool_end: plan.allocation_pool_end,
            gateway_ip: plan.gateway_ip,
        };

        let network = client.networks().create(&body).await.action("create network")?;
        info!(id = network.id, name = %network.name, "created network");

        Ok(Value::encode(&NetworkModel::from(&network))?)
    }

    async fn read(&self, _ctx: &OperationContext, state: &Value) -> Result<Option<Value>> {
        let client = self.client.get().await?;
        let id = int_attr(state, "id")?;

        match found(client.networks().get(id).await, "get network")? {
            Some(network) => Ok(Some(Value::encode(&NetworkModel::from(&network))?)),
            None => Ok(None),
        }
    }

    async fn update(&self, _ctx: &OperationContext, prior: &Value, planned: &Value) -> Result<Value> {
        let client = self.client.get().await?;
        let id = int_attr(prior, "id")?;
        let plan: NetworkModel = planned.decode()?;

        let body = NetworkUpdate {
            name: plan.name,
            description: plan.description,
            domain_name_servers: plan.domain_name_servers,
            allocation_pool_start: plan.allocation_pool_start,
            allocation_pool_end: plan.allocation_pool_end,
            gateway_ip: plan.gateway_ip,
        };

        let network = client.networks().update(id, &body).await.action("update network")?;
        Ok(Value::encode(&NetworkModel::from(&network))?)
    }

    async fn delete(&self, _ctx: &OperationContext, state: &Value) -> Result<()> {
        let client = self.client.get().await?;
        let id = int_attr(state, "id")?;
        deleted(client.networks().delete(id).await, "delete network")
    }
}

pub struct NetworkDataSource {
    client: ClientHandle,
}

impl NetworkDataSource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for NetworkDataSource {
    type Error = ProviderError;

    fn type_name(&self) -> &str {
        "cloudbit_compute_network"
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![
            id_filter("network"),
            Attribute::string("name")
                .description("name of the network")
                .optional()
                .computed(),
            Attribute::int64("location_id")
                .description("location of the network")
                .optional()
                .computed(),
            Attribute::string("cidr")
                .description("network address range in CIDR notation")
                .optional()
                .computed(),
            Attribute::string("description")
                .description("description of the network")
                .computed(),
            Attribute::list("domain_name_servers", AttributeType::String)
                .description("list of domain name servers")
                .computed(),
            Attribute::string("allocation_pool_start")
                .description("first address handed out by DHCP")
                .computed(),
            Attribute::string("allocation_pool_end")
                .description("last address handed out by DHCP")
                .computed(),
            Attribute::string("gateway_ip")
                .description("gateway address of the network")
                .computed(),
            Attribute::int64("used_ips")
                .description("number of addresses in use")
                .computed(),
            Attribute::int64("total_ips")
                .description("number of usable addresses")
                .computed(),
        ])
    }

    async fn read(&self, _ctx: &OperationContext, config: &Value) -> Result<Value> {
        let client = self.client.get().await?;
        let networks = client.networks().list().await.action("list networks")?;

        let candidates = encode_all::<_, NetworkModel>(&networks)?;
        filter::find_one("network", &self.schema(), config, candidates)
    }
}
