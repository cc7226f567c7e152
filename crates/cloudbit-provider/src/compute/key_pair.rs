//! `cloudbit_compute_key_pair`

use crate::common::{deleted, encode_all, found, id_attribute, id_filter, int_attr};
use crate::config::ClientHandle;
use crate::error::{ClientResultExt, ProviderError, Result};
use crate::filter;
use async_trait::async_trait;
use cloudbit_client::{KeyPair, KeyPairCreate};
use cloudbit_plugin::{Attribute, DataSource, OperationContext, Resource, Schema, Validator, Value};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct KeyPairModel {
    id: Option<i64>,
    name: Option<String>,
    public_key: Option<String>,
    fingerprint: Option<String>,
}

impl From<&KeyPair> for KeyPairModel {
    fn from(key_pair: &KeyPair) -> Self {
        Self {
            id: Some(key_pair.id),
            name: Some(key_pair.name.clone()),
            public_key: None,
            fingerprint: Some(key_pair.fingerprint.clone()),
        }
    }
}

pub struct KeyPairResource {
    client: ClientHandle,
}

impl KeyPairResource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for KeyPairResource {
    type Error = ProviderError;

    fn type_name(&self) -> &str {
        "cloudbit_compute_key_pair"
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![
            id_attribute("key pair"),
            Attribute::string("name")
                .description("name of the key pair")
                .required()
                .requires_replace(),
            Attribute::string("public_key")
                .description("public key in OpenSSH format")
                .required()
                .requires_replace()
                .validator(Validator::NonEmpty),
            Attribute::string("fingerprint")
                .description("fingerprint of the public key")
                .computed()
                .use_state_for_unknown(),
        ])
        .description("SSH key pair injected into new servers.")
    }

    async fn create(&self, _ctx: &OperationContext, planned: &Value) -> Result<Value> {
        let client = self.client.get().await?;
        let plan: KeyPairModel = planned.decode()?;

        let body = KeyPairCreate {
            name: plan.name.unwrap_or_default(),
            public_key: plan.public_key.clone().unwrap_or_default(),
        };
        let key_pair = client.key_pairs().create(&body).await.action("create key pair")?;

        let mut state = KeyPairModel::from(&key_pair);
        state.public_key = plan.public_key;
        Ok(Value::encode(&state)?)
    }

    async fn read(&self, _ctx: &OperationContext, state: &Value) -> Result<Option<Value>> {
        let client = self.client.get().await?;
        let current: KeyPairModel = state.decode()?;
        let id = int_attr(state, "id")?;

        let Some(key_pair) = found(client.key_pairs().get(id).await, "get key pair")? else {
            return Ok(None);
        };

        let mut refreshed = KeyPairModel::from(&key_pair);
        refreshed.public_key = current.public_key;
        Ok(Some(Value::encode(&refreshed)?))
    }

    async fn update(&self, _ctx: &OperationContext, _prior: &Value, _planned: &Value) -> Result<Value> {
        Err(ProviderError::UpdateNotSupported(
            "cloudbit_compute_key_pair".to_string(),
        ))
    }

    async fn delete(&self, _ctx: &OperationContext, state: &Value) -> Result<()> {
        let client = self.client.get().await?;
        let id = int_attr(state, "id")?;
        deleted(client.key_pairs().delete(id).await, "delete key pair")
    }
}

pub struct KeyPairDataSource {
    client: ClientHandle,
}

impl KeyPairDataSource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for KeyPairDataSource {
    type Error = ProviderError;

    fn type_name(&self) -> &str {
        "cloudbit_compute_key_pair"
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![
            id_filter("key pair"),
            Attribute::string("name")
                .description("name of the key pair")
                .optional()
                .computed(),
            Attribute::string("fingerprint")
                .description("fingerprint of the public key")
                .optional()
                .computed(),
        ])
    }

    async fn read(&self, _ctx: &OperationContext, config: &Value) -> Result<Value> {
        let client = self.client.get().await?;
        let key_pairs = client.key_pairs().list().await.action("list key pairs")?;

        let candidates = encode_all::<_, KeyPairModel>(&key_pairs)?;
        filter::find_one("key pair", &self.schema(), config, candidates)
    }
}
