//! Protocol service tests against an in-memory provider

use async_trait::async_trait;
use cloudbit_plugin::proto::tfplugin6::{
    self, DynamicValue, apply_resource_change, configure_provider, get_metadata,
    get_provider_schema, import_resource_state, plan_resource_change, provider_server::Provider as _,
    read_data_source, read_resource, stop_provider, upgrade_resource_state,
    validate_resource_config,
};
use cloudbit_plugin::{
    Attribute, DataSource, Diagnostic, Diagnostics, OperationContext, PluginService, Provider,
    Resource, Schema, Validator, Value, msgpack,
};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use tonic::Request;

#[derive(Debug)]
struct FakeError(String);

impl From<FakeError> for Diagnostics {
    fn from(err: FakeError) -> Self {
        Diagnostic::error("Client Error", err.0).into()
    }
}

#[derive(Default)]
struct Store {
    next_id: AtomicI64,
    networks: Mutex<BTreeMap<i64, Value>>,
    configured: AtomicBool,
}

struct FakeProvider {
    store: Arc<Store>,
}

#[async_trait]
impl Provider for FakeProvider {
    type Error = FakeError;

    fn type_name(&self) -> &str {
        "fake"
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![Attribute::string("token").optional().sensitive()])
    }

    async fn configure(&self, _ctx: &OperationContext, config: &Value) -> Result<(), FakeError> {
        if config.attr("token").is_null() {
            return Err(FakeError("missing token".into()));
        }
        self.store.configured.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn resources(&self) -> Vec<Arc<dyn Resource<Error = FakeError>>> {
        vec![Arc::new(NetworkResource {
            store: self.store.clone(),
        })]
    }

    fn data_sources(&self) -> Vec<Arc<dyn DataSource<Error = FakeError>>> {
        vec![Arc::new(NetworkDataSource {
            store: self.store.clone(),
        })]
    }
}

struct NetworkResource {
    store: Arc<Store>,
}

fn network_schema() -> Schema {
    Schema::new(vec![
        Attribute::int64("id").computed().use_state_for_unknown(),
        Attribute::string("name").required(),
        Attribute::string("cidr")
            .required()
            .requires_replace()
            .validator(Validator::Cidr),
        Attribute::string("gateway_ip").computed(),
    ])
}

#[async_trait]
impl Resource for NetworkResource {
    type Error = FakeError;

    fn type_name(&self) -> &str {
        "fake_network"
    }

    fn schema(&self) -> Schema {
        network_schema()
    }

    async fn create(&self, _ctx: &OperationContext, planned: &Value) -> Result<Value, FakeError> {
        let id = self.store.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let mut state = planned.clone();
        state.set_attr("id", Value::from(id));
        state.set_attr("gateway_ip", Value::from("10.0.0.1"));
        state.set_attr("unexpected", Value::from("dropped"));
        self.store.networks.lock().unwrap().insert(id, state.clone());
        Ok(state)
    }

    async fn read(
        &self,
        _ctx: &OperationContext,
        state: &Value,
    ) -> Result<Option<Value>, FakeError> {
        let id = state.attr("id").as_i64().unwrap_or_default();
        Ok(self.store.networks.lock().unwrap().get(&id).cloned())
    }

    async fn update(
        &self,
        _ctx: &OperationContext,
        _prior: &Value,
        planned: &Value,
    ) -> Result<Value, FakeError> {
        Err(FakeError(format!(
            "cannot rename to {}",
            planned.attr("name").as_str().unwrap_or_default()
        )))
    }

    async fn delete(&self, _ctx: &OperationContext, state: &Value) -> Result<(), FakeError> {
        let id = state.attr("id").as_i64().unwrap_or_default();
        self.store.networks.lock().unwrap().remove(&id);
        Ok(())
    }
}

struct NetworkDataSource {
    store: Arc<Store>,
}

#[async_trait]
impl DataSource for NetworkDataSource {
    type Error = FakeError;

    fn type_name(&self) -> &str {
        "fake_network"
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![
            Attribute::int64("id").optional().computed(),
            Attribute::string("name").optional().computed(),
        ])
    }

    async fn read(&self, _ctx: &OperationContext, config: &Value) -> Result<Value, FakeError> {
        let networks = self.store.networks.lock().unwrap();
        networks
            .values()
            .find(|n| n.attr("name") == config.attr("name"))
            .cloned()
            .ok_or_else(|| FakeError("no network found".into()))
    }
}

fn service() -> (PluginService<FakeProvider>, Arc<Store>) {
    let store = Arc::new(Store::default());
    let service = PluginService::new(FakeProvider {
        store: store.clone(),
    });
    (service, store)
}

fn dynamic(value: &Value) -> Option<DynamicValue> {
    Some(DynamicValue {
        msgpack: msgpack::encode(value).unwrap(),
        json: Vec::new(),
    })
}

fn decode(value: Option<DynamicValue>) -> Value {
    msgpack::decode(&value.unwrap().msgpack).unwrap()
}

fn config(name: &str, cidr: &str) -> Value {
    Value::object([
        ("id", Value::Null),
        ("name", Value::from(name)),
        ("cidr", Value::from(cidr)),
        ("gateway_ip", Value::Null),
    ])
}

#[tokio::test]
async fn test_metadata_and_schema() {
    let (service, _) = service();

    let metadata = service
        .get_metadata(Request::new(get_metadata::Request {}))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(metadata.resources.len(), 1);
    assert_eq!(metadata.resources[0].type_name, "fake_network");
    assert!(metadata.server_capabilities.unwrap().plan_destroy);

    let schema = service
        .get_provider_schema(Request::new(get_provider_schema::Request {}))
        .await
        .unwrap()
        .into_inner();
    assert!(schema.resource_schemas.contains_key("fake_network"));
    assert!(schema.data_source_schemas.contains_key("fake_network"));
    let block = schema.provider.unwrap().block.unwrap();
    assert!(block.attributes[0].sensitive);
}

#[tokio::test]
async fn test_configure_reports_diagnostics() {
    let (service, store) = service();

    let response = service
        .configure_provider(Request::new(configure_provider::Request {
            terraform_version: "1.9.0".into(),
            config: dynamic(&Value::object([("token", Value::Null)])),
        }))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(response.diagnostics.len(), 1);
    assert_eq!(response.diagnostics[0].summary, "Client Error");

    let response = service
        .configure_provider(Request::new(configure_provider::Request {
            terraform_version: "1.9.0".into(),
            config: dynamic(&Value::object([("token", Value::from("secret"))])),
        }))
        .await
        .unwrap()
        .into_inner();
    assert!(response.diagnostics.is_empty());
    assert!(store.configured.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_validate_resource_config() {
    let (service, _) = service();

    let response = service
        .validate_resource_config(Request::new(validate_resource_config::Request {
            type_name: "fake_network".into(),
            config: dynamic(&config("backend", "10.0.0.0")),
        }))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(response.diagnostics.len(), 1);
    assert_eq!(response.diagnostics[0].summary, "Invalid Attribute Value");

    let response = service
        .validate_resource_config(Request::new(validate_resource_config::Request {
            type_name: "fake_unknown".into(),
            config: dynamic(&Value::Null),
        }))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(response.diagnostics[0].summary, "Resource Type Not Found");
}

#[tokio::test]
async fn test_resource_lifecycle() {
    let (service, store) = service();
    let cfg = config("backend", "10.0.0.0/24");

    let plan = service
        .plan_resource_change(Request::new(plan_resource_change::Request {
            type_name: "fake_network".into(),
            prior_state: dynamic(&Value::Null),
            proposed_new_state: dynamic(&cfg),
            config: dynamic(&cfg),
            ..Default::default()
        }))
        .await
        .unwrap()
        .into_inner();
    assert!(plan.diagnostics.is_empty());
    let planned = decode(plan.planned_state);
    assert!(planned.attr("id").is_unknown());
    assert!(planned.attr("gateway_ip").is_unknown());

    let apply = service
        .apply_resource_change(Request::new(apply_resource_change::Request {
            type_name: "fake_network".into(),
            prior_state: dynamic(&Value::Null),
            planned_state: dynamic(&planned),
            config: dynamic(&cfg),
            ..Default::default()
        }))
        .await
        .unwrap()
        .into_inner();
    assert!(apply.diagnostics.is_empty());
    let state = decode(apply.new_state);
    assert_eq!(state.attr("id").as_i64(), Some(1));
    assert!(state.get("unexpected").is_none());

    let read = service
        .read_resource(Request::new(read_resource::Request {
            type_name: "fake_network".into(),
            current_state: dynamic(&state),
            ..Default::default()
        }))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(decode(read.new_state), state);

    let destroy = service
        .apply_resource_change(Request::new(apply_resource_change::Request {
            type_name: "fake_network".into(),
            prior_state: dynamic(&state),
            planned_state: dynamic(&Value::Null),
            ..Default::default()
        }))
        .await
        .unwrap()
        .into_inner();
    assert!(destroy.diagnostics.is_empty());
    assert!(decode(destroy.new_state).is_null());
    assert!(store.networks.lock().unwrap().is_empty());

    let gone = service
        .read_resource(Request::new(read_resource::Request {
            type_name: "fake_network".into(),
            current_state: dynamic(&state),
            ..Default::default()
        }))
        .await
        .unwrap()
        .into_inner();
    assert!(decode(gone.new_state).is_null());
}

#[tokio::test]
async fn test_plan_requires_replace() {
    let (service, _) = service();
    let prior = Value::object([
        ("id", Value::from(3)),
        ("name", Value::from("backend")),
        ("cidr", Value::from("10.0.0.0/24")),
        ("gateway_ip", Value::from("10.0.0.1")),
    ]);
    let cfg = config("backend", "10.1.0.0/24");
    let mut proposed = prior.clone();
    proposed.set_attr("cidr", Value::from("10.1.0.0/24"));

    let plan = service
        .plan_resource_change(Request::new(plan_resource_change::Request {
            type_name: "fake_network".into(),
            prior_state: dynamic(&prior),
            proposed_new_state: dynamic(&proposed),
            config: dynamic(&cfg),
            ..Default::default()
        }))
        .await
        .unwrap()
        .into_inner();

    assert_eq!(plan.requires_replace.len(), 1);
    let planned = decode(plan.planned_state);
    assert_eq!(planned.attr("id").as_i64(), Some(3));
    assert!(planned.attr("gateway_ip").is_unknown());
}

#[tokio::test]
async fn test_failed_update_keeps_prior_state() {
    let (service, _) = service();
    let prior = Value::object([
        ("id", Value::from(3)),
        ("name", Value::from("backend")),
        ("cidr", Value::from("10.0.0.0/24")),
        ("gateway_ip", Value::from("10.0.0.1")),
    ]);
    let mut planned = prior.clone();
    planned.set_attr("name", Value::from("frontend"));

    let apply = service
        .apply_resource_change(Request::new(apply_resource_change::Request {
            type_name: "fake_network".into(),
            prior_state: dynamic(&prior),
            planned_state: dynamic(&planned),
            ..Default::default()
        }))
        .await
        .unwrap()
        .into_inner();

    assert_eq!(apply.diagnostics.len(), 1);
    assert_eq!(
        apply.diagnostics[0].severity,
        tfplugin6::diagnostic::Severity::Error as i32
    );
    assert_eq!(decode(apply.new_state), prior);
}

#[tokio::test]
async fn test_import_reads_remote_object() {
    let (service, store) = service();
    store.networks.lock().unwrap().insert(
        12,
        Value::object([
            ("id", Value::from(12)),
            ("name", Value::from("imported")),
            ("cidr", Value::from("172.16.0.0/16")),
            ("gateway_ip", Value::from("172.16.0.1")),
        ]),
    );

    let response = service
        .import_resource_state(Request::new(import_resource_state::Request {
            type_name: "fake_network".into(),
            id: "12".into(),
        }))
        .await
        .unwrap()
        .into_inner();
    assert!(response.diagnostics.is_empty());
    let state = decode(response.imported_resources[0].state.clone());
    assert_eq!(state.attr("name"), &Value::from("imported"));

    let missing = service
        .import_resource_state(Request::new(import_resource_state::Request {
            type_name: "fake_network".into(),
            id: "99".into(),
        }))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(
        missing.diagnostics[0].summary,
        "Cannot Import Non-Existent Remote Object"
    );
}

#[tokio::test]
async fn test_upgrade_drops_removed_attributes() {
    let (service, _) = service();
    let raw = serde_json::json!({
        "id": 5,
        "name": "legacy",
        "cidr": "10.0.0.0/24",
        "gateway_ip": "10.0.0.1",
        "domain_name_servers": ["1.1.1.1"]
    });

    let response = service
        .upgrade_resource_state(Request::new(upgrade_resource_state::Request {
            type_name: "fake_network".into(),
            version: 0,
            raw_state: Some(tfplugin6::RawState {
                json: serde_json::to_vec(&raw).unwrap(),
                flatmap: Default::default(),
            }),
        }))
        .await
        .unwrap()
        .into_inner();

    assert!(response.diagnostics.is_empty());
    let state = decode(response.upgraded_state);
    assert!(state.get("domain_name_servers").is_none());
    assert_eq!(state.attr("id").as_i64(), Some(5));
}

#[tokio::test]
async fn test_read_data_source() {
    let (service, store) = service();
    store.networks.lock().unwrap().insert(
        1,
        Value::object([("id", Value::from(1)), ("name", Value::from("default"))]),
    );

    let response = service
        .read_data_source(Request::new(read_data_source::Request {
            type_name: "fake_network".into(),
            config: dynamic(&Value::object([
                ("id", Value::Null),
                ("name", Value::from("default")),
            ])),
            provider_meta: None,
        }))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(decode(response.state).attr("id").as_i64(), Some(1));

    let response = service
        .read_data_source(Request::new(read_data_source::Request {
            type_name: "fake_network".into(),
            config: dynamic(&Value::object([("name", Value::from("other"))])),
            provider_meta: None,
        }))
        .await
        .unwrap()
        .into_inner();
    assert!(response.state.is_none());
    assert_eq!(response.diagnostics[0].detail, "no network found");
}

#[tokio::test]
async fn test_stop_provider_cancels_operations() {
    let (service, _) = service();
    let token = service.stop_token();

    service
        .stop_provider(Request::new(stop_provider::Request {}))
        .await
        .unwrap();
    assert!(token.is_cancelled());
}
