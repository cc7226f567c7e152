//! The `cloudbit` provider

use crate::config::{self, ClientHandle, ProviderConfig};
use crate::error::{ProviderError, Result};
use crate::{compute, entities, kubernetes};
use async_trait::async_trait;
use cloudbit_client::DEFAULT_ENDPOINT;
use cloudbit_plugin::{DataSource, OperationContext, Provider, Resource, Schema, Value};
use std::sync::Arc;
use tracing::{debug, info};

pub struct CloudbitProvider {
    version: String,
    default_endpoint: String,
    client: ClientHandle,
}

impl CloudbitProvider {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            default_endpoint: DEFAULT_ENDPOINT.to_string(),
            client: ClientHandle::new(),
        }
    }

    /// Endpoint used when neither the configuration nor the environment
    /// names one
    pub fn with_default_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.default_endpoint = endpoint.into();
        self
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn client(&self) -> &ClientHandle {
        &self.client
    }
}

#[async_trait]
impl Provider for CloudbitProvider {
    type Error = ProviderError;

    fn type_name(&self) -> &str {
        "cloudbit"
    }

    fn schema(&self) -> Schema {
        config::schema()
    }

    async fn configure(&self, _ctx: &OperationContext, config: &Value) -> Result<()> {
        if self.client.is_configured().await {
            debug!("provider already configured");
            return Ok(());
        }

        let resolved = ProviderConfig::from_value(config)?.resolve(&self.default_endpoint)?;
        let client = resolved.build_client(&self.version)?;

        if self.client.set(client).await {
            info!(endpoint = %resolved.endpoint, version = %self.version, "configured cloudbit client");
        }
        Ok(())
    }

    fn resources(&self) -> Vec<Arc<dyn Resource<Error = Self::Error>>> {
        let mut resources = compute::resources(&self.client);
        resources.extend(kubernetes::resources(&self.client));
        resources
    }

    fn data_sources(&self) -> Vec<Arc<dyn DataSource<Error = Self::Error>>> {
        let mut data_sources = entities::data_sources(&self.client);
        data_sources.extend(compute::data_sources(&self.client));
        data_sources.extend(kubernetes::data_sources(&self.client));
        data_sources
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_type_names_are_unique() {
        let provider = CloudbitProvider::new("test");

        let resources: BTreeSet<String> = provider
            .resources()
            .iter()
            .map(|r| r.type_name().to_string())
            .collect();
        assert_eq!(resources.len(), provider.resources().len());
        assert_eq!(resources.len(), 19);
        assert!(resources.iter().all(|name| name.starts_with("cloudbit_")));

        let data_sources: BTreeSet<String> = provider
            .data_sources()
            .iter()
            .map(|d| d.type_name().to_string())
            .collect();
        assert_eq!(data_sources.len(), provider.data_sources().len());
        assert_eq!(data_sources.len(), 24);
        assert!(data_sources.contains("cloudbit_kubernetes_kube_config"));
    }

    #[tokio::test]
    async fn test_configure_with_explicit_token() {
        let provider = CloudbitProvider::new("1.2.3");
        let config = Value::object([
            ("token", Value::from("secret")),
            ("endpoint", Value::from("https://api.example.test/")),
        ]);

        provider
            .configure(&OperationContext::background(), &config)
            .await
            .unwrap();

        let client = provider.client().get().await.unwrap();
        assert_eq!(client.base_url().as_str(), "https://api.example.test/");
    }

    #[tokio::test]
    async fn test_configure_twice_keeps_first_client() {
        let provider = CloudbitProvider::new("1.2.3");
        let first = Value::object([
            ("token", Value::from("secret")),
            ("endpoint", Value::from("https://first.example.test/")),
        ]);
        let second = Value::object([
            ("token", Value::from("secret")),
            ("endpoint", Value::from("https://second.example.test/")),
        ]);

        let ctx = OperationContext::background();
        provider.configure(&ctx, &first).await.unwrap();
        provider.configure(&ctx, &second).await.unwrap();

        let client = provider.client().get().await.unwrap();
        assert_eq!(client.base_url().as_str(), "https://first.example.test/");
    }
}
