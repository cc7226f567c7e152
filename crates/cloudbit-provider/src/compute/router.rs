//! `cloudbit_compute_router`, `cloudbit_compute_router_interface` and
//! `cloudbit_compute_router_route`

use crate::common::{
    deleted, encode_all, found, id_attribute, id_filter, int_attr, location_attribute,
};
use crate::config::ClientHandle;
use crate::error::{ClientResultExt, ProviderError, Result};
use crate::filter;
use async_trait::async_trait;
use cloudbit_client::{
    Route, RouteCreate, Router, RouterCreate, RouterInterface, RouterInterfaceCreate,
    RouterUpdate,
};
use cloudbit_plugin::{
    Attribute, DataSource, Diagnostics, OperationContext, Resource, Schema, Validator, Value,
    import_ids,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RouterModel {
    id: Option<i64>,
    name: Option<String>,
    description: Option<String>,
    location_id: Option<i64>,
    public: Option<bool>,
    snat: Option<bool>,
    public_ip: Option<String>,
}

impl From<&Router> for RouterModel {
    fn from(router: &Router) -> Self {
        Self {
            id: Some(router.id),
            name: Some(router.name.clone()),
            description: Some(router.description.clone().unwrap_or_default()),
            location_id: Some(router.location.id),
            public: Some(router.public),
            snat: Some(router.snat),
            public_ip: router.public_ip.clone().filter(|ip| !ip.is_empty()),
        }
    }
}

pub struct RouterResource {
    client: ClientHandle,
}

impl RouterResource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for RouterResource {
    type Error = ProviderError;

    fn type_name(&self) -> &str {
        "cloudbit_compute_router"
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![
            id_attribute("router"),
            Attribute::string("name")
                .description("name of the router")
                .required()
                .validator(Validator::NonEmpty),
            Attribute::string("description")
                .description("description of the router")
                .optional()
                .computed()
                .use_state_for_unknown(),
            location_attribute("router"),
            Attribute::bool("public")
                .description("whether the router has a public gateway")
                .optional()
                .default(true),
            Attribute::bool("snat")
                .description("whether source NAT is enabled")
                .computed(),
            Attribute::string("public_ip")
                .description("public ip address of the gateway")
                .computed(),
        ])
        .description("Router connecting private networks with each other and the internet.")
    }

    async fn create(&self, _ctx: &OperationContext, planned: &Value) -> Result<Value> {
        let client = self.client.get().await?;
        let plan: RouterModel = planned.decode()?;

        let body = RouterCreate {
            name: plan.name.unwrap_or_default(),
            location_id: plan.location_id.unwrap_or_default(),
            description: plan.description,
            public: plan.public.unwrap_or(true),
        };
        let router = client.routers().create(&body).await.action("create router")?;

        Ok(Value::encode(&RouterModel::from(&router))?)
    }

    async fn read(&self, _ctx: &OperationContext, state: &Value) -> Result<Option<Value>> {
        let client = self.client.get().await?;
        let id = int_attr(state, "id")?;

        match found(client.routers().get(id).await, "get router")? {
            Some(router) => Ok(Some(Value::encode(&RouterModel::from(&router))?)),
            None => Ok(None),
        }
    }

    async fn update(&self, _ctx: &OperationContext, prior: &Value, planned: &Value) -> Result<Value> {
        let client = self.client.get().await?;
        let id = int_attr(prior, "id")?;
        let plan: RouterModel = planned.decode()?;

        let body = RouterUpdate {
            name: plan.name,
            description: plan.description,
            public: plan.public,
        };
        let router = client
            .routers()
            .update(id, &body)
            .await
            .action("update router")?;

        Ok(Value::encode(&RouterModel::from(&router))?)
    }

    async fn delete(&self, _ctx: &OperationContext, state: &Value) -> Result<()> {
        let client = self.client.get().await?;
        let id = int_attr(state, "id")?;
        deleted(client.routers().delete(id).await, "delete router")
    }
}

pub struct RouterDataSource {
    client: ClientHandle,
}

impl RouterDataSource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for RouterDataSource {
    type Error = ProviderError;

    fn type_name(&self) -> &str {
        "cloudbit_compute_router"
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![
            id_filter("router"),
            Attribute::string("name")
                .description("name of the router")
                .optional()
                .computed(),
            Attribute::int64("location_id")
                .description("location of the router")
                .optional()
                .computed(),
            Attribute::string("description")
                .description("description of the router")
                .computed(),
            Attribute::bool("public")
                .description("whether the router has a public gateway")
                .computed(),
            Attribute::bool("snat")
                .description("whether source NAT is enabled")
                .computed(),
            Attribute::string("public_ip")
                .description("public ip address of the gateway")
                .computed(),
        ])
    }

    async fn read(&self, _ctx: &OperationContext, config: &Value) -> Result<Value> {
        let client = self.client.get().await?;
        let routers = client.routers().list().await.action("list routers")?;

        let candidates = encode_all::<_, RouterModel>(&routers)?;
        filter::find_one("router", &self.schema(), config, candidates)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RouterInterfaceModel {
    id: Option<i64>,
    router_id: Option<i64>,
    network_id: Option<i64>,
    private_ip: Option<String>,
}

impl RouterInterfaceModel {
    fn new(router_id: i64, interface: &RouterInterface) -> Self {
        Self {
            id: Some(interface.id),
            router_id: Some(router_id),
            network_id: Some(interface.network.id),
            private_ip: Some(interface.private_ip.clone()),
        }
    }
}

pub struct RouterInterfaceResource {
    client: ClientHandle,
}

impl RouterInterfaceResource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for RouterInterfaceResource {
    type Error = ProviderError;

    fn type_name(&self) -> &str {
        "cloudbit_compute_router_interface"
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![
            id_attribute("router interface"),
            Attribute::int64("router_id")
                .description("router the interface belongs to")
                .required()
                .requires_replace(),
            Attribute::int64("network_id")
                .description("network the interface connects to")
                .required()
                .requires_replace(),
            Attribute::string("private_ip")
                .description("address of the router within the network")
                .optional()
                .computed()
                .requires_replace()
                .use_state_for_unknown()
                .validator(Validator::IpAddress),
        ])
        .description("Connection of a router to a private network.")
    }

    async fn create(&self, _ctx: &OperationContext, planned: &Value) -> Result<Value> {
        let client = self.client.get().await?;
        let plan: RouterInterfaceModel = planned.decode()?;
        let router_id = int_attr(planned, "router_id")?;

        let body = RouterInterfaceCreate {
            network_id: plan.network_id.unwrap_or_default(),
            private_ip: plan.private_ip,
        };
        let interface = client
            .router_interfaces(router_id)
            .create(&body)
            .await
            .action("create router interface")?;

        Ok(Value::encode(&RouterInterfaceModel::new(router_id, &interface))?)
    }

    async fn read(&self, _ctx: &OperationContext, state: &Value) -> Result<Option<Value>> {
        let client = self.client.get().await?;
        let router_id = int_attr(state, "router_id")?;
        let id = int_attr(state, "id")?;

        match found(
            client.router_interfaces(router_id).get(id).await,
            "get router interface",
        )? {
            Some(interface) => Ok(Some(Value::encode(&RouterInterfaceModel::new(
                router_id, &interface,
            ))?)),
            None => Ok(None),
        }
    }

    async fn update(&self, _ctx: &OperationContext, _prior: &Value, _planned: &Value) -> Result<Value> {
        Err(ProviderError::UpdateNotSupported(
            "cloudbit_compute_router_interface".to_string(),
        ))
    }

    async fn delete(&self, _ctx: &OperationContext, state: &Value) -> Result<()> {
        let client = self.client.get().await?;
        let router_id = int_attr(state, "router_id")?;
        let id = int_attr(state, "id")?;
        deleted(
            client.router_interfaces(router_id).delete(id).await,
            "delete router interface",
        )
    }

    fn import(&self, id: &str) -> std::result::Result<Value, Diagnostics> {
        import_ids(id, &["router_id", "id"])
    }
}

pub struct RouterInterfaceDataSource {
    client: ClientHandle,
}

impl RouterInterfaceDataSource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for RouterInterfaceDataSource {
    type Error = ProviderError;

    fn type_name(&self) -> &str {
        "cloudbit_compute_router_interface"
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![
            Attribute::int64("router_id")
                .description("router the interface belongs to")
                .required(),
            id_filter("router interface"),
            Attribute::int64("network_id")
                .description("network the interface connects to")
                .optional()
                .computed(),
            Attribute::string("private_ip")
                .description("address of the router within the network")
                .optional()
                .computed(),
        ])
    }

    async fn read(&self, _ctx: &OperationContext, config: &Value) -> Result<Value> {
        let client = self.client.get().await?;
        let router_id = int_attr(config, "router_id")?;
        let interfaces = client
            .router_interfaces(router_id)
            .list()
            .await
            .action("list router interfaces")?;

        let candidates = interfaces
            .iter()
            .map(|i| Value::encode(&RouterInterfaceModel::new(router_id, i)))
            .collect::<cloudbit_plugin::Result<Vec<_>>>()?;
        filter::find_one("router interface", &self.schema(), config, candidates)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RouteModel {
    id: Option<i64>,
    router_id: Option<i64>,
    destination: Option<String>,
    next_hop: Option<String>,
}

impl RouteModel {
    fn new(router_id: i64, route: &Route) -> Self {
        Self {
            id: Some(route.id),
            router_id: Some(router_id),
            destination: Some(route.destination.clone()),
            next_hop: Some(route.next_hop.clone()),
        }
    }
}

pub struct RouteResource {
    client: ClientHandle,
}

impl RouteResource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for RouteResource {
    type Error = ProviderError;

    fn type_name(&self) -> &str {
        "cloudbit_compute_router_route"
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![
            id_attribute("route"),
            Attribute::int64("router_id")
                .description("router the route belongs to")
                .required()
                .requires_replace(),
            Attribute::string("destination")
                .description("destination network in CIDR notation")
                .required()
                .requires_replace()
                .validator(Validator::Cidr),
            Attribute::string("next_hop")
                .description("address of the next hop")
                .required()
                .requires_replace()
                .validator(Validator::IpAddress),
        ])
        .description("Static route of a router.")
    }

    async fn create(&self, _ctx: &OperationContext, planned: &Value) -> Result<Value> {
        let client = self.client.get().await?;
        let plan: RouteModel = planned.decode()?;
        let router_id = int_attr(planned, "router_id")?;

        let body = RouteCreate {
            destination: plan.destination.unwrap_or_default(),
            next_hop: plan.next_hop.unwrap_or_default(),
        };
        let route = client
            .routes(router_id)
            .create(&body)
            .await
            .action("create route")?;

        Ok(Value::encode(&RouteModel::new(router_id, &route))?)
    }

    async fn read(&self, _ctx: &OperationContext, state: &Value) -> Result<Option<Value>> {
        let client = self.client.get().await?;
        let router_id = int_attr(state, "router_id")?;
        let id = int_attr(state, "id")?;

        match found(client.routes(router_id).get(id).await, "get route")? {
            Some(route) => Ok(Some(Value::encode(&RouteModel::new(router_id, &route))?)),
            None => Ok(None),
        }
    }

    async fn update(&self, _ctx: &OperationContext, _prior: &Value, _planned: &Value) -> Result<Value> {
        Err(ProviderError::UpdateNotSupported(
            "cloudbit_compute_router_route".to_string(),
        ))
    }

    async fn delete(&self, _ctx: &OperationContext, state: &Value) -> Result<()> {
        let client = self.client.get().await?;
        let router_id = int_attr(state, "router_id")?;
        let id = int_attr(state, "id")?;
        deleted(client.routes(router_id).delete(id).await, "delete route")
    }

    fn import(&self, id: &str) -> std::result::Result<Value, Diagnostics> {
        import_ids(id, &["router_id", "id"])
    }
}

pub struct RouteDataSource {
    client: ClientHandle,
}

impl RouteDataSource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for RouteDataSource {
    type Error = ProviderError;

    fn type_name(&self) -> &str {
        "cloudbit_compute_router_route"
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![
            Attribute::int64("router_id")
                .description("router the route belongs to")
                .required(),
            id_filter("route"),
            Attribute::string("destination")
                .description("destination network in CIDR notation")
                .optional()
                .computed(),
            Attribute::string("next_hop")
                .description("address of the next hop")
                .optional()
                .computed(),
        ])
    }

    async fn read(&self, _ctx: &OperationContext, config: &Value) -> Result<Value> {
        let client = self.client.get().await?;
        let router_id = int_attr(config, "router_id")?;
        let routes = client
            .routes(router_id)
            .list()
            .await
            .action("list routes")?;

        let candidates = routes
            .iter()
            .map(|r| Value::encode(&RouteModel::new(router_id, r)))
            .collect::<cloudbit_plugin::Result<Vec<_>>>()?;
        filter::find_one("route", &self.schema(), config, candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_private_router_has_no_public_ip() {
        let router = Router {
            id: 2,
            name: "private".to_string(),
            public: false,
            public_ip: None,
            ..Router::default()
        };

        let value = Value::encode(&RouterModel::from(&router)).unwrap();
        assert!(value.attr("public_ip").is_null());
        assert_eq!(value.attr("public").as_bool(), Some(false));

        let router = Router {
            public: true,
            public_ip: Some("185.98.122.4".to_string()),
            ..router
        };
        let value = Value::encode(&RouterModel::from(&router)).unwrap();
        assert_eq!(value.attr("public_ip").as_str(), Some("185.98.122.4"));
    }
}
