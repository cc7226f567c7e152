//! Provider configuration
//!
//! Values from the provider block take precedence. A missing `token` is read
//! from `CLOUDBIT_TOKEN`, a missing `endpoint` from `CLOUDBIT_ENDPOINT`
//! before falling back to the default endpoint.

use crate::error::{ClientResultExt, ProviderError, Result};
use cloudbit_client::Client;
use cloudbit_plugin::{Attribute, Schema, Value};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::RwLock;

pub const TOKEN_ENV: &str = "CLOUDBIT_TOKEN";
pub const ENDPOINT_ENV: &str = "CLOUDBIT_ENDPOINT";

pub fn schema() -> Schema {
    Schema::new(vec![
        Attribute::string("token")
            .description("authentication token for the cloudbit api")
            .optional()
            .sensitive(),
        Attribute::string("endpoint")
            .description("endpoint of the cloudbit api")
            .optional(),
    ])
}

/// The provider block as written by the user
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderConfig {
    pub token: Option<String>,
    pub endpoint: Option<String>,
}

/// Configuration after environment fallback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub token: String,
    pub endpoint: String,
}

impl ProviderConfig {
    pub fn from_value(value: &Value) -> Result<Self> {
        Ok(value.decode()?)
    }

    pub fn resolve(self, default_endpoint: &str) -> Result<ResolvedConfig> {
        let token = match self.token {
            Some(token) => token,
            None => std::env::var(TOKEN_ENV).map_err(|_| ProviderError::MissingToken)?,
        };

        let endpoint = match self.endpoint {
            Some(endpoint) => endpoint,
            None => std::env::var(ENDPOINT_ENV).unwrap_or_else(|_| default_endpoint.to_string()),
        };

        Ok(ResolvedConfig { token, endpoint })
    }
}

impl ResolvedConfig {
    pub fn build_client(&self, version: &str) -> Result<Client> {
        Client::builder(&self.token)
            .endpoint(&self.endpoint)
            .user_agent(format!("terraform-provider-cloudbit/{}", version))
            .build()
            .action("create api client")
    }
}

/// The API client shared by all resources and data sources, set once by
/// the provider's Configure call
#[derive(Debug, Clone, Default)]
pub struct ClientHandle(Arc<RwLock<Option<Arc<Client>>>>);

impl ClientHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self) -> Result<Arc<Client>> {
        self.0.read().await.clone().ok_or(ProviderError::Unconfigured)
    }

    pub async fn is_configured(&self) -> bool {
        self.0.read().await.is_some()
    }

    /// Install the client unless one is already set. Returns whether the
    /// client was installed.
    pub async fn set(&self, client: Client) -> bool {
        let mut slot = self.0.write().await;
        if slot.is_some() {
            return false;
        }
        *slot = Some(Arc::new(client));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const DEFAULT: &str = "https://api.cloudbit.ch/";

    #[test]
    #[serial]
    fn test_explicit_values_win() {
        temp_env::with_vars(
            [
                (TOKEN_ENV, Some("env-token")),
                (ENDPOINT_ENV, Some("https://env.example.test/")),
            ],
            || {
                let config = ProviderConfig {
                    token: Some("config-token".to_string()),
                    endpoint: Some("https://config.example.test/".to_string()),
                };
                let resolved = config.resolve(DEFAULT).unwrap();
                assert_eq!(resolved.token, "config-token");
                assert_eq!(resolved.endpoint, "https://config.example.test/");
            },
        );
    }

    #[test]
    #[serial]
    fn test_env_fallback() {
        temp_env::with_vars(
            [
                (TOKEN_ENV, Some("env-token")),
                (ENDPOINT_ENV, Some("https://env.example.test/")),
            ],
            || {
                let resolved = ProviderConfig::default().resolve(DEFAULT).unwrap();
                assert_eq!(resolved.token, "env-token");
                assert_eq!(resolved.endpoint, "https://env.example.test/");
            },
        );
    }

    #[test]
    #[serial]
    fn test_default_endpoint() {
        temp_env::with_vars(
            [(TOKEN_ENV, Some("env-token")), (ENDPOINT_ENV, None)],
            || {
                let resolved = ProviderConfig::default().resolve(DEFAULT).unwrap();
                assert_eq!(resolved.endpoint, DEFAULT);
            },
        );
    }

    #[test]
    #[serial]
    fn test_missing_token() {
        temp_env::with_var_unset(TOKEN_ENV, || {
            let err = ProviderConfig::default().resolve(DEFAULT).unwrap_err();
            assert!(matches!(err, ProviderError::MissingToken));
        });
    }

    #[test]
    fn test_config_from_value() {
        let value = Value::object([
            ("token", Value::from("abc")),
            ("endpoint", Value::Null),
        ]);
        let config = ProviderConfig::from_value(&value).unwrap();
        assert_eq!(config.token.as_deref(), Some("abc"));
        assert!(config.endpoint.is_none());
    }

    #[tokio::test]
    async fn test_client_handle_set_once() {
        let handle = ClientHandle::new();
        assert!(matches!(handle.get().await, Err(ProviderError::Unconfigured)));

        let first = Client::builder("a").endpoint("https://one.example.test/").build().unwrap();
        let second = Client::builder("b").endpoint("https://two.example.test/").build().unwrap();
        assert!(handle.set(first).await);
        assert!(!handle.set(second).await);

        let client = handle.get().await.unwrap();
        assert_eq!(client.base_url().as_str(), "https://one.example.test/");
    }
}
