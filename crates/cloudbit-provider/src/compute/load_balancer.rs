//! Load balancers, their pools and pool members
//!
//! Changes to pools and members are applied by the load balancer in the
//! background. Every change waits for the load balancer to become active
//! again before the next one is sent.

use crate::common::{
    deleted, encode_all, found, id_attribute, id_filter, int_attr, location_attribute,
    wait_context,
};
use crate::config::ClientHandle;
use crate::error::{ClientResultExt, ProviderError, Result};
use crate::filter;
use crate::wait::{wait_for_deletion, wait_for_order, wait_for_status};
use async_trait::async_trait;
use cloudbit_client::{
    Client, Kind, LOAD_BALANCER_STATUS_ACTIVE, LoadBalancer, LoadBalancerCreate,
    LoadBalancerMember, LoadBalancerMemberCreate, LoadBalancerMemberUpdate, LoadBalancerPool,
    LoadBalancerPoolOptions, LoadBalancerUpdate,
};
use cloudbit_plugin::{
    Attribute, DataSource, Diagnostics, OperationContext, Resource, Schema, Validator, Value,
    import_ids,
};
use serde::{Deserialize, Serialize};
use tracing::info;

async fn wait_for_load_balancer(ctx: &OperationContext, client: &Client, id: i64) -> Result<()> {
    let ctx = wait_context(ctx);
    wait_for_status(&ctx, LOAD_BALANCER_STATUS_ACTIVE, move || async move {
        let load_balancer = client
            .load_balancers()
            .get(id)
            .await
            .action("get load balancer")?;
        Ok(load_balancer.status.key)
    })
    .await
}

/// Wait for the load balancer before removing one of its children. Returns
/// false when the load balancer is gone, which takes its children along.
async fn load_balancer_settled(ctx: &OperationContext, client: &Client, id: i64) -> Result<bool> {
    match wait_for_load_balancer(ctx, client, id).await {
        Ok(()) => Ok(true),
        Err(ProviderError::Client { source, .. }) if source.is_not_found() => Ok(false),
        Err(err) => Err(err),
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LoadBalancerModel {
    id: Option<i64>,
    name: Option<String>,
    location_id: Option<i64>,
    network_id: Option<i64>,
    private_ip: Option<String>,
    attach_external_ip: Option<bool>,
    public_ip: Option<String>,
    status: Option<String>,
}

impl From<&LoadBalancer> for LoadBalancerModel {
    fn from(load_balancer: &LoadBalancer) -> Self {
        let network = load_balancer.networks.first();
        let public_ip = load_balancer.public_ip.clone().filter(|ip| !ip.is_empty());
        Self {
            id: Some(load_balancer.id),
            name: Some(load_balancer.name.clone()),
            location_id: Some(load_balancer.location.id),
            network_id: network.map(|n| n.network.id),
            private_ip: network.map(|n| n.private_ip.clone()),
            attach_external_ip: Some(public_ip.is_some()),
            public_ip,
            status: Some(load_balancer.status.key.clone()),
        }
    }
}

pub struct LoadBalancerResource {
    client: ClientHandle,
}

impl LoadBalancerResource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for LoadBalancerResource {
    type Error = ProviderError;

    fn type_name(&self) -> &str {
        "cloudbit_compute_load_balancer"
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![
            id_attribute("load balancer"),
            Attribute::string("name")
                .description("name of the load balancer")
                .required()
                .validator(Validator::NonEmpty),
            location_attribute("load balancer"),
            Attribute::int64("network_id")
                .description("network the load balancer is connected to")
                .required()
                .requires_replace(),
            Attribute::bool("attach_external_ip")
                .description("whether the load balancer gets a public address")
                .optional()
                .requires_replace()
                .default(true),
            Attribute::string("private_ip")
                .description("address of the load balancer within the network")
                .computed()
                .use_state_for_unknown(),
            Attribute::string("public_ip")
                .description("public address of the load balancer")
                .computed()
                .use_state_for_unknown(),
            Attribute::string("status")
                .description("status of the load balancer")
                .computed(),
        ])
        .description("Managed layer 4/7 load balancer.")
    }

    async fn create(&self, ctx: &OperationContext, planned: &Value) -> Result<Value> {
        let client = self.client.get().await?;
        let plan: LoadBalancerModel = planned.decode()?;

        let body = LoadBalancerCreate {
            name: plan.name.unwrap_or_default(),
            location_id: plan.location_id.unwrap_or_default(),
            network_id: plan.network_id.unwrap_or_default(),
            attach_external_ip: plan.attach_external_ip.unwrap_or(true),
        };
        let ordering = client
            .load_balancers()
            .create(&body)
            .await
            .action("create load balancer")?;

        let order = wait_for_order(&wait_context(ctx), &client.orders(), &ordering).await?;
        let id = order.product_instance_id.ok_or_else(|| {
            ProviderError::invalid_state(format!(
                "order {} did not reference a load balancer",
                order.id
            ))
        })?;
        info!(id, "load balancer ordered");

        wait_for_load_balancer(ctx, &client, id).await?;

        let load_balancer = client
            .load_balancers()
            .get(id)
            .await
            .action("get load balancer")?;
        Ok(Value::encode(&LoadBalancerModel::from(&load_balancer))?)
    }

    async fn read(&self, _ctx: &OperationContext, state: &Value) -> Result<Option<Value>> {
        let client = self.client.get().await?;
        let id = int_attr(state, "id")?;

        match found(client.load_balancers().get(id).await, "get load balancer")? {
            Some(load_balancer) => Ok(Some(Value::encode(&LoadBalancerModel::from(
                &load_balancer,
            ))?)),
            None => Ok(None),
        }
    }

    async fn update(&self, _ctx: &OperationContext, prior: &Value, planned: &Value) -> Result<Value> {
        let client = self.client.get().await?;
        let id = int_attr(prior, "id")?;
        let plan: LoadBalancerModel = planned.decode()?;

        let body = LoadBalancerUpdate {
            name: plan.name.unwrap_or_default(),
        };
        let load_balancer = client
            .load_balancers()
            .update(id, &body)
            .await
            .action("update load balancer")?;

        Ok(Value::encode(&LoadBalancerModel::from(&load_balancer))?)
    }

    async fn delete(&self, ctx: &OperationContext, state: &Value) -> Result<()> {
        let client = self.client.get().await?;
        let id = int_attr(state, "id")?;

        if found(client.load_balancers().delete(id).await, "delete load balancer")?.is_none() {
            return Ok(());
        }

        let ctx = wait_context(ctx);
        let load_balancers = client.load_balancers();
        wait_for_deletion(&ctx, || load_balancers.get(id)).await
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct HealthCheckModel {
    type_id: Option<i64>,
    interval: Option<i64>,
    timeout: Option<i64>,
    max_retries: Option<i64>,
    http_method: Option<String>,
    http_path: Option<String>,
    http_status_codes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PoolModel {
    id: Option<i64>,
    load_balancer_id: Option<i64>,
    name: Option<String>,
    entry_protocol_id: Option<i64>,
    target_protocol_id: Option<i64>,
    entry_port: Option<i64>,
    algorithm_id: Option<i64>,
    sticky_session: Option<bool>,
    certificate_id: Option<i64>,
    health_check: Option<HealthCheckModel>,
    status: Option<String>,
}

impl PoolModel {
    fn new(load_balancer_id: i64, pool: &LoadBalancerPool) -> Self {
        let check = &pool.health_check;
        Self {
            id: Some(pool.id),
            load_balancer_id: Some(load_balancer_id),
            name: Some(pool.name.clone()),
            entry_protocol_id: Some(pool.entry_protocol.id),
            target_protocol_id: Some(pool.target_protocol.id),
            entry_port: Some(pool.entry_port),
            algorithm_id: Some(pool.algorithm.id),
            sticky_session: Some(pool.sticky_session),
            certificate_id: pool.certificate.as_ref().map(|c| c.id),
            health_check: Some(HealthCheckModel {
                type_id: Some(check.check_type.id),
                interval: Some(check.interval),
                timeout: Some(check.timeout),
                max_retries: Some(check.max_retries),
                http_method: check.http_method.clone(),
                http_path: check.http_path.clone(),
                http_status_codes: check.http_status_codes.clone(),
            }),
            status: Some(pool.status.key.clone()),
        }
    }

    fn options(&self) -> LoadBalancerPoolOptions {
        let check = self.health_check.clone().unwrap_or_default();
        LoadBalancerPoolOptions {
            name: self.name.clone().unwrap_or_default(),
            entry_protocol_id: self.entry_protocol_id.unwrap_or_default(),
            target_protocol_id: self.target_protocol_id.unwrap_or_default(),
            entry_port: self.entry_port.unwrap_or_default(),
            algorithm_id: self.algorithm_id.unwrap_or_default(),
            sticky_session: self.sticky_session.unwrap_or_default(),
            certificate_id: self.certificate_id,
            health_check_type_id: check.type_id.unwrap_or_default(),
            health_check_interval: check.interval.unwrap_or(HEALTH_CHECK_INTERVAL),
            health_check_timeout: check.timeout.unwrap_or(HEALTH_CHECK_TIMEOUT),
            health_check_max_retries: check.max_retries.unwrap_or(HEALTH_CHECK_MAX_RETRIES),
            health_check_http_method: check.http_method,
            health_check_http_path: check.http_path,
            health_check_http_status_codes: check.http_status_codes,
        }
    }
}

const HEALTH_CHECK_INTERVAL: i64 = 5;
const HEALTH_CHECK_TIMEOUT: i64 = 5;
const HEALTH_CHECK_MAX_RETRIES: i64 = 3;

fn health_check_attributes(read_only: bool) -> Vec<Attribute> {
    if read_only {
        return vec![
            Attribute::int64("type_id").description("health check type").computed(),
            Attribute::int64("interval").description("seconds between checks").computed(),
            Attribute::int64("timeout").description("seconds until a check fails").computed(),
            Attribute::int64("max_retries")
                .description("failed checks until a member is marked down")
                .computed(),
            Attribute::string("http_method").description("http method").computed(),
            Attribute::string("http_path").description("http path").computed(),
            Attribute::string("http_status_codes")
                .description("expected http status codes")
                .computed(),
        ];
    }

    vec![
        Attribute::int64("type_id")
            .description("health check type, see `cloudbit_compute_load_balancer_health_check_type`")
            .required(),
        Attribute::int64("interval")
            .description("seconds between checks")
            .optional()
            .default(HEALTH_CHECK_INTERVAL)
            .validator(Validator::int_range(1, 3600)),
        Attribute::int64("timeout")
            .description("seconds until a check fails")
            .optional()
            .default(HEALTH_CHECK_TIMEOUT)
            .validator(Validator::int_range(1, 3600)),
        Attribute::int64("max_retries")
            .description("failed checks until a member is marked down")
            .optional()
            .default(HEALTH_CHECK_MAX_RETRIES)
            .validator(Validator::int_range(1, 10)),
        Attribute::string("http_method")
            .description("http method of http checks")
            .optional(),
        Attribute::string("http_path")
            .description("http path of http checks")
            .optional(),
        Attribute::string("http_status_codes")
            .description("expected http status codes of http checks, e.g. `200-299`")
            .optional(),
    ]
}

pub struct LoadBalancerPoolResource {
    client: ClientHandle,
}

impl LoadBalancerPoolResource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for LoadBalancerPoolResource {
    type Error = ProviderError;

    fn type_name(&self) -> &str {
        "cloudbit_compute_load_balancer_pool"
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![
            id_attribute("pool"),
            Attribute::int64("load_balancer_id")
                .description("load balancer the pool belongs to")
                .required()
                .requires_replace(),
            Attribute::string("name")
                .description("name of the pool")
                .required()
                .validator(Validator::NonEmpty),
            Attribute::int64("entry_protocol_id")
                .description("protocol clients connect with")
                .required()
                .requires_replace(),
            Attribute::int64("target_protocol_id")
                .description("protocol used towards the members")
                .required()
                .requires_replace(),
            Attribute::int64("entry_port")
                .description("port clients connect to")
                .required()
                .requires_replace()
                .validator(Validator::int_range(1, 65535)),
            Attribute::int64("algorithm_id")
                .description("balancing algorithm")
                .required(),
            Attribute::bool("sticky_session")
                .description("whether clients stick to one member")
                .optional()
                .default(false),
            Attribute::int64("certificate_id")
                .description("certificate for TLS termination")
                .optional(),
            Attribute::single_nested("health_check", health_check_attributes(false))
                .description("health check of the members")
                .required(),
            Attribute::string("status")
                .description("status of the pool")
                .computed(),
        ])
        .description("Listener of a load balancer forwarding to a set of members.")
    }

    async fn create(&self, ctx: &OperationContext, planned: &Value) -> Result<Value> {
        let client = self.client.get().await?;
        let plan: PoolModel = planned.decode()?;
        let load_balancer_id = int_attr(planned, "load_balancer_id")?;

        wait_for_load_balancer(ctx, &client, load_balancer_id).await?;
        let pool = client
            .load_balancers()
            .pools(load_balancer_id)
            .create(&plan.options())
            .await
            .action("create load balancer pool")?;
        wait_for_load_balancer(ctx, &client, load_balancer_id).await?;

        let pool = client
            .load_balancers()
            .pools(load_balancer_id)
            .get(pool.id)
            .await
            .action("get load balancer pool")?;
        Ok(Value::encode(&PoolModel::new(load_balancer_id, &pool))?)
    }

    async fn read(&self, _ctx: &OperationContext, state: &Value) -> Result<Option<Value>> {
        let client = self.client.get().await?;
        let load_balancer_id = int_attr(state, "load_balancer_id")?;
        let id = int_attr(state, "id")?;

        match found(
            client.load_balancers().pools(load_balancer_id).get(id).await,
            "get load balancer pool",
        )? {
            Some(pool) => Ok(Some(Value::encode(&PoolModel::new(load_balancer_id, &pool))?)),
            None => Ok(None),
        }
    }

    async fn update(&self, ctx: &OperationContext, prior: &Value, planned: &Value) -> Result<Value> {
        let client = self.client.get().await?;
        let load_balancer_id = int_attr(prior, "load_balancer_id")?;
        let id = int_attr(prior, "id")?;
        let plan: PoolModel = planned.decode()?;

        wait_for_load_balancer(ctx, &client, load_balancer_id).await?;
        client
            .load_balancers()
            .pools(load_balancer_id)
            .update(id, &plan.options())
            .await
            .action("update load balancer pool")?;
        wait_for_load_balancer(ctx, &client, load_balancer_id).await?;

        let pool = client
            .load_balancers()
            .pools(load_balancer_id)
            .get(id)
            .await
            .action("get load balancer pool")?;
        Ok(Value::encode(&PoolModel::new(load_balancer_id, &pool))?)
    }

    async fn delete(&self, ctx: &OperationContext, state: &Value) -> Result<()> {
        let client = self.client.get().await?;
        let load_balancer_id = int_attr(state, "load_balancer_id")?;
        let id = int_attr(state, "id")?;

        if !load_balancer_settled(ctx, &client, load_balancer_id).await? {
            return Ok(());
        }
        deleted(
            client.load_balancers().pools(load_balancer_id).delete(id).await,
            "delete load balancer pool",
        )
    }

    fn import(&self, id: &str) -> std::result::Result<Value, Diagnostics> {
        import_ids(id, &["load_balancer_id", "id"])
    }
}

pub struct LoadBalancerPoolDataSource {
    client: ClientHandle,
}

impl LoadBalancerPoolDataSource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for LoadBalancerPoolDataSource {
    type Error = ProviderError;

    fn type_name(&self) -> &str {
        "cloudbit_compute_load_balancer_pool"
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![
            Attribute::int64("load_balancer_id")
                .description("load balancer the pool belongs to")
                .required(),
            id_filter("pool"),
            Attribute::string("name")
                .description("name of the pool")
                .optional()
                .computed(),
            Attribute::int64("entry_port")
                .description("port clients connect to")
                .optional()
                .computed(),
            Attribute::int64("entry_protocol_id")
                .description("protocol clients connect with")
                .computed(),
            Attribute::int64("target_protocol_id")
                .description("protocol used towards the members")
                .computed(),
            Attribute::int64("algorithm_id")
                .description("balancing algorithm")
                .computed(),
            Attribute::bool("sticky_session")
                .description("whether clients stick to one member")
                .computed(),
            Attribute::int64("certificate_id")
                .description("certificate for TLS termination")
                .computed(),
            Attribute::single_nested("health_check", health_check_attributes(true))
                .description("health check of the members")
                .computed(),
            Attribute::string("status")
                .description("status of the pool")
                .computed(),
        ])
    }

    async fn read(&self, _ctx: &OperationContext, config: &Value) -> Result<Value> {
        let client = self.client.get().await?;
        let load_balancer_id = int_attr(config, "load_balancer_id")?;
        let pools = client
            .load_balancers()
            .pools(load_balancer_id)
            .list()
            .await
            .action("list load balancer pools")?;

        let candidates = pools
            .iter()
            .map(|p| Value::encode(&PoolModel::new(load_balancer_id, p)))
            .collect::<cloudbit_plugin::Result<Vec<_>>>()?;
        filter::find_one("load balancer pool", &self.schema(), config, candidates)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct MemberModel {
    id: Option<i64>,
    load_balancer_id: Option<i64>,
    pool_id: Option<i64>,
    name: Option<String>,
    address: Option<String>,
    port: Option<i64>,
    status: Option<String>,
}

impl MemberModel {
    fn new(load_balancer_id: i64, pool_id: i64, member: &LoadBalancerMember) -> Self {
        Self {
            id: Some(member.id),
            load_balancer_id: Some(load_balancer_id),
            pool_id: Some(pool_id),
            name: Some(member.name.clone()),
            address: Some(member.address.clone()),
            port: Some(member.port),
            status: Some(member.status.key.clone()),
        }
    }
}

pub struct LoadBalancerMemberResource {
    client: ClientHandle,
}

impl LoadBalancerMemberResource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for LoadBalancerMemberResource {
    type Error = ProviderError;

    fn type_name(&self) -> &str {
        "cloudbit_compute_load_balancer_member"
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![
            id_attribute("member"),
            Attribute::int64("load_balancer_id")
                .description("load balancer the member belongs to")
                .required()
                .requires_replace(),
            Attribute::int64("pool_id")
                .description("pool the member belongs to")
                .required()
                .requires_replace(),
            Attribute::string("name")
                .description("name of the member")
                .required()
                .validator(Validator::NonEmpty),
            Attribute::string("address")
                .description("address traffic is forwarded to")
                .required()
                .requires_replace()
                .validator(Validator::IpAddress),
            Attribute::int64("port")
                .description("port traffic is forwarded to")
                .required()
                .requires_replace()
                .validator(Validator::int_range(1, 65535)),
            Attribute::string("status")
                .description("status of the member")
                .computed(),
        ])
        .description("Backend of a load balancer pool.")
    }

    async fn create(&self, ctx: &OperationContext, planned: &Value) -> Result<Value> {
        let client = self.client.get().await?;
        let plan: MemberModel = planned.decode()?;
        let load_balancer_id = int_attr(planned, "load_balancer_id")?;
        let pool_id = int_attr(planned, "pool_id")?;

        let body = LoadBalancerMemberCreate {
            name: plan.name.unwrap_or_default(),
            address: plan.address.unwrap_or_default(),
            port: plan.port.unwrap_or_default(),
        };

        wait_for_load_balancer(ctx, &client, load_balancer_id).await?;
        let member = client
            .load_balancers()
            .members(load_balancer_id, pool_id)
            .create(&body)
            .await
            .action("create load balancer member")?;
        wait_for_load_balancer(ctx, &client, load_balancer_id).await?;

        Ok(Value::encode(&MemberModel::new(load_balancer_id, pool_id, &member))?)
    }

    async fn read(&self, _ctx: &OperationContext, state: &Value) -> Result<Option<Value>> {
        let client = self.client.get().await?;
        let load_balancer_id = int_attr(state, "load_balancer_id")?;
        let pool_id = int_attr(state, "pool_id")?;
        let id = int_attr(state, "id")?;

        match found(
            client
                .load_balancers()
                .members(load_balancer_id, pool_id)
                .get(id)
                .await,
            "get load balancer member",
        )? {
            Some(member) => Ok(Some(Value::encode(&MemberModel::new(
                load_balancer_id,
                pool_id,
                &member,
            ))?)),
            None => Ok(None),
        }
    }

    async fn update(&self, ctx: &OperationContext, prior: &Value, planned: &Value) -> Result<Value> {
        let client = self.client.get().await?;
        let load_balancer_id = int_attr(prior, "load_balancer_id")?;
        let pool_id = int_attr(prior, "pool_id")?;
        let id = int_attr(prior, "id")?;
        let plan: MemberModel = planned.decode()?;

        let body = LoadBalancerMemberUpdate {
            name: plan.name.unwrap_or_default(),
        };

        wait_for_load_balancer(ctx, &client, load_balancer_id).await?;
        let member = client
            .load_balancers()
            .members(load_balancer_id, pool_id)
            .update(id, &body)
            .await
            .action("update load balancer member")?;

        Ok(Value::encode(&MemberModel::new(load_balancer_id, pool_id, &member))?)
    }

    async fn delete(&self, ctx: &OperationContext, state: &Value) -> Result<()> {
        let client = self.client.get().await?;
        let load_balancer_id = int_attr(state, "load_balancer_id")?;
        let pool_id = int_attr(state, "pool_id")?;
        let id = int_attr(state, "id")?;

        if !load_balancer_settled(ctx, &client, load_balancer_id).await? {
            return Ok(());
        }
        deleted(
            client
                .load_balancers()
                .members(load_balancer_id, pool_id)
                .delete(id)
                .await,
            "delete load balancer member",
        )
    }

    fn import(&self, id: &str) -> std::result::Result<Value, Diagnostics> {
        import_ids(id, &["load_balancer_id", "pool_id", "id"])
    }
}

pub struct LoadBalancerMemberDataSource {
    client: ClientHandle,
}

impl LoadBalancerMemberDataSource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for LoadBalancerMemberDataSource {
    type Error = ProviderError;

    fn type_name(&self) -> &str {
        "cloudbit_compute_load_balancer_member"
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![
            Attribute::int64("load_balancer_id")
                .description("load balancer the member belongs to")
                .required(),
            Attribute::int64("pool_id")
                .description("pool the member belongs to")
                .required(),
            id_filter("member"),
            Attribute::string("name")
                .description("name of the member")
                .optional()
                .computed(),
            Attribute::string("address")
                .description("address traffic is forwarded to")
                .optional()
                .computed(),
            Attribute::int64("port")
                .description("port traffic is forwarded to")
                .optional()
                .computed(),
            Attribute::string("status")
                .description("status of the member")
                .computed(),
        ])
    }

    async fn read(&self, _ctx: &OperationContext, config: &Value) -> Result<Value> {
        let client = self.client.get().await?;
        let load_balancer_id = int_attr(config, "load_balancer_id")?;
        let pool_id = int_attr(config, "pool_id")?;
        let members = client
            .load_balancers()
            .members(load_balancer_id, pool_id)
            .list()
            .await
            .action("list load balancer members")?;

        let candidates = members
            .iter()
            .map(|m| Value::encode(&MemberModel::new(load_balancer_id, pool_id, m)))
            .collect::<cloudbit_plugin::Result<Vec<_>>>()?;
        filter::find_one("load balancer member", &self.schema(), config, candidates)
    }
}

#[derive(Debug, Clone, Copy)]
enum KindSource {
    Protocol,
    Algorithm,
    HealthCheckType,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct KindModel {
    id: i64,
    name: String,
    key: String,
}

impl From<&Kind> for KindModel {
    fn from(kind: &Kind) -> Self {
        Self {
            id: kind.id,
            name: kind.name.clone(),
            key: kind.key.clone(),
        }
    }
}

/// Lookup of the fixed enumerations pools are configured with
pub struct LoadBalancerKindDataSource {
    client: ClientHandle,
    source: KindSource,
}

impl LoadBalancerKindDataSource {
    pub fn protocol(client: ClientHandle) -> Self {
        Self {
            client,
            source: KindSource::Protocol,
        }
    }

    pub fn algorithm(client: ClientHandle) -> Self {
        Self {
            client,
            source: KindSource::Algorithm,
        }
    }

    pub fn health_check_type(client: ClientHandle) -> Self {
        Self {
            client,
            source: KindSource::HealthCheckType,
        }
    }

    fn what(&self) -> &'static str {
        match self.source {
            KindSource::Protocol => "load balancer protocol",
            KindSource::Algorithm => "load balancer algorithm",
            KindSource::HealthCheckType => "load balancer health check type",
        }
    }
}

#[async_trait]
impl DataSource for LoadBalancerKindDataSource {
    type Error = ProviderError;

    fn type_name(&self) -> &str {
        match self.source {
            KindSource::Protocol => "cloudbit_compute_load_balancer_protocol",
            KindSource::Algorithm => "cloudbit_compute_load_balancer_algorithm",
            KindSource::HealthCheckType => "cloudbit_compute_load_balancer_health_check_type",
        }
    }

    fn schema(&self) -> Schema {
        let what = self.what();
        Schema::new(vec![
            id_filter(what),
            Attribute::string("name")
                .description(format!("name of the {}", what))
                .optional()
                .computed(),
            Attribute::string("key")
                .description(format!("unique key of the {}", what))
                .optional()
                .computed(),
        ])
    }

    async fn read(&self, _ctx: &OperationContext, config: &Value) -> Result<Value> {
        let client = self.client.get().await?;
        let load_balancers = client.load_balancers();
        let kinds = match self.source {
            KindSource::Protocol => load_balancers.protocols().list().await,
            KindSource::Algorithm => load_balancers.algorithms().list().await,
            KindSource::HealthCheckType => load_balancers.health_check_types().list().await,
        }
        .action(format!("list {}s", self.what()))?;

        let candidates = encode_all::<_, KindModel>(&kinds)?;
        filter::find_one(self.what(), &self.schema(), config, candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_ip_follows_public_ip() {
        let load_balancer = LoadBalancer {
            id: 30,
            name: "internal".to_string(),
            public_ip: Some(String::new()),
            ..LoadBalancer::default()
        };

        let value = Value::encode(&LoadBalancerModel::from(&load_balancer)).unwrap();
        assert!(value.attr("public_ip").is_null());
        assert_eq!(value.attr("attach_external_ip").as_bool(), Some(false));

        let load_balancer = LoadBalancer {
            public_ip: Some("185.98.122.30".to_string()),
            ..load_balancer
        };
        let value = Value::encode(&LoadBalancerModel::from(&load_balancer)).unwrap();
        assert_eq!(value.attr("public_ip").as_str(), Some("185.98.122.30"));
        assert_eq!(value.attr("attach_external_ip").as_bool(), Some(true));
    }
}
