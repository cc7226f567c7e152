//! Shared helpers for provider tests against a mock cloudbit API

use cloudbit_plugin::{DataSource, OperationContext, Provider, Resource, Value};
use cloudbit_provider::{CloudbitProvider, ProviderError};
use std::sync::Arc;
use wiremock::MockServer;

pub async fn configured_provider(server: &MockServer) -> CloudbitProvider {
    let provider = CloudbitProvider::new("test");
    let config = Value::object([
        ("token", Value::from("test-token")),
        ("endpoint", Value::from(server.uri())),
    ]);
    provider
        .configure(&OperationContext::background(), &config)
        .await
        .expect("configure provider");
    provider
}

pub fn resource(
    provider: &CloudbitProvider,
    type_name: &str,
) -> Arc<dyn Resource<Error = ProviderError>> {
    provider
        .resources()
        .into_iter()
        .find(|r| r.type_name() == type_name)
        .unwrap_or_else(|| panic!("resource {} is not registered", type_name))
}

pub fn data_source(
    provider: &CloudbitProvider,
    type_name: &str,
) -> Arc<dyn DataSource<Error = ProviderError>> {
    provider
        .data_sources()
        .into_iter()
        .find(|d| d.type_name() == type_name)
        .unwrap_or_else(|| panic!("data source {} is not registered", type_name))
}
