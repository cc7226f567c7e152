//! `cloudbit_compute_elastic_ip` and `cloudbit_compute_elastic_ip_server_attachment`

use crate::common::{
    deleted, encode_all, found, id_attribute, id_filter, int_attr, location_attribute,
};
use crate::config::ClientHandle;
use crate::error::{ClientResultExt, ProviderError, Result};
use crate::filter;
use async_trait::async_trait;
use cloudbit_client::{ElasticIp, ElasticIpCreate};
use cloudbit_plugin::{
    Attribute, DataSource, Diagnostics, OperationContext, Resource, Schema, Value, import_ids,
};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct AttachmentModel {
    id: i64,
    name: String,
    #[serde(rename = "type")]
    attachment_type: String,
    private_ip: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ElasticIpModel {
    id: Option<i64>,
    location_id: Option<i64>,
    public_ip: Option<String>,
    attachment: Option<AttachmentModel>,
}

impl From<&ElasticIp> for ElasticIpModel {
    fn from(elastic_ip: &ElasticIp) -> Self {
        Self {
            id: Some(elastic_ip.id),
            location_id: Some(elastic_ip.location.id),
            public_ip: Some(elastic_ip.public_ip.clone()),
            attachment: elastic_ip.attached_to().map(|a| AttachmentModel {
                id: a.id,
                name: a.name.clone(),
                attachment_type: a.attachment_type.clone(),
                private_ip: elastic_ip.private_ip.clone().unwrap_or_default(),
            }),
        }
    }
}

pub struct ElasticIpResource {
    client: ClientHandle,
}

impl ElasticIpResource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for ElasticIpResource {
    type Error = ProviderError;

    fn type_name(&self) -> &str {
        "cloudbit_compute_elastic_ip"
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![
            id_attribute("elastic ip"),
            location_attribute("elastic ip"),
            Attribute::string("public_ip")
                .description("public ip address")
                .computed()
                .use_state_for_unknown(),
        ])
        .description("Public IPv4 address that can be attached to servers.")
    }

    async fn create(&self, _ctx: &OperationContext, planned: &Value) -> Result<Value> {
        let client = self.client.get().await?;
        let plan: ElasticIpModel = planned.decode()?;

        let body = ElasticIpCreate {
            location_id: plan.location_id.unwrap_or_default(),
        };
        let elastic_ip = client
            .elastic_ips()
            .create(&body)
            .await
            .action("create elastic ip")?;
        info!(id = elastic_ip.id, public_ip = %elastic_ip.public_ip, "created elastic ip");

        Ok(Value::encode(&ElasticIpModel::from(&elastic_ip))?)
    }

    async fn read(&self, _ctx: &OperationContext, state: &Value) -> Result<Option<Value>> {
        let client = self.client.get().await?;
        let id = int_attr(state, "id")?;

        match found(client.elastic_ips().get(id).await, "get elastic ip")? {
            Some(elastic_ip) => Ok(Some(Value::encode(&ElasticIpModel::from(&elastic_ip))?)),
            None => Ok(None),
        }
    }

    async fn update(&self, _ctx: &OperationContext, _prior: &Value, _planned: &Value) -> Result<Value> {
        Err(ProviderError::UpdateNotSupported(
            "cloudbit_compute_elastic_ip".to_string(),
        ))
    }

    async fn delete(&self, _ctx: &OperationContext, state: &Value) -> Result<()> {
        let client = self.client.get().await?;
        let id = int_attr(state, "id")?;
        deleted(client.elastic_ips().delete(id).await, "delete elastic ip")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ServerAttachmentModel {
    server_id: Option<i64>,
    elastic_ip_id: Option<i64>,
    network_interface_id: Option<i64>,
    public_ip: Option<String>,
    private_ip: Option<String>,
}

pub struct ElasticIpServerAttachmentResource {
    client: ClientHandle,
}

impl ElasticIpServerAttachmentResource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }

    async fn fetch(&self, current: ServerAttachmentModel) -> Result<Option<ServerAttachmentModel>> {
        let client = self.client.get().await?;
        let elastic_ip_id = current.elastic_ip_id.unwrap_or_default();
        let server_id = current.server_id.unwrap_or_default();

        let Some(elastic_ip) = found(
            client.elastic_ips().get(elastic_ip_id).await,
            "get elastic ip",
        )?
        else {
            return Ok(None);
        };

        match elastic_ip.attached_to() {
            Some(attachment) if attachment.id == server_id => Ok(Some(ServerAttachmentModel {
                public_ip: Some(elastic_ip.public_ip.clone()),
                private_ip: Some(elastic_ip.private_ip.clone().unwrap_or_default()),
                ..current
            })),
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl Resource for ElasticIpServerAttachmentResource {
    type Error = ProviderError;

    fn type_name(&self) -> &str {
        "cloudbit_compute_elastic_ip_server_attachment"
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![
            Attribute::int64("server_id")
                .description("server to attach the elastic ip to")
                .required()
                .requires_replace(),
            Attribute::int64("elastic_ip_id")
                .description("elastic ip to attach")
                .required()
                .requires_replace(),
            Attribute::int64("network_interface_id")
                .description("network interface of the server receiving the elastic ip")
                .required()
                .requires_replace(),
            Attribute::string("public_ip")
                .description("public ip address of the elastic ip")
                .computed()
                .use_state_for_unknown(),
            Attribute::string("private_ip")
                .description("private ip address the elastic ip is mapped to")
                .computed()
                .use_state_for_unknown(),
        ])
        .description("Attachment of an elastic ip to a server network interface.")
    }

    async fn create(&self, _ctx: &OperationContext, planned: &Value) -> Result<Value> {
        let client = self.client.get().await?;
        let plan: ServerAttachmentModel = planned.decode()?;
        let server_id = int_attr(planned, "server_id")?;
        let elastic_ip_id = int_attr(planned, "elastic_ip_id")?;
        let network_interface_id = int_attr(planned, "network_interface_id")?;

        client
            .servers()
            .attach_elastic_ip(server_id, elastic_ip_id, network_interface_id)
            .await
            .action("attach elastic ip")?;

        let state = self.fetch(plan).await?.ok_or_else(|| {
            ProviderError::invalid_state(format!(
                "elastic ip {} is not attached to server {} after attaching it",
                elastic_ip_id, server_id
            ))
        })?;
        Ok(Value::encode(&state)?)
    }

    async fn read(&self, _ctx: &OperationContext, state: &Value) -> Result<Option<Value>> {
        let current: ServerAttachmentModel = state.decode()?;
        match self.fetch(current).await? {
            Some(state) => Ok(Some(Value::encode(&state)?)),
            None => Ok(None),
        }
    }

    async fn update(&self, _ctx: &OperationContext, _prior: &Value, _planned: &Value) -> Result<Value> {
        Err(ProviderError::UpdateNotSupported(
            "cloudbit_compute_elastic_ip_server_attachment".to_string(),
        ))
    }

    async fn delete(&self, _ctx: &OperationContext, state: &Value) -> Result<()> {
        let client = self.client.get().await?;
        let server_id = int_attr(state, "server_id")?;
        let elastic_ip_id = int_attr(state, "elastic_ip_id")?;

        deleted(
            client.servers().detach_elastic_ip(server_id, elastic_ip_id).await,
            "detach elastic ip",
        )
    }

    fn import(&self, id: &str) -> std::result::Result<Value, Diagnostics> {
        import_ids(id, &["server_id", "elastic_ip_id"])
    }
}

pub struct ElasticIpDataSource {
    client: ClientHandle,
}

impl ElasticIpDataSource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for ElasticIpDataSource {
    type Error = ProviderError;

    fn type_name(&self) -> &str {
        "cloudbit_compute_elastic_ip"
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![
            id_filter("elastic ip"),
            Attribute::int64("location_id")
                .description("location of the elastic ip")
                .optional()
                .computed(),
            Attribute::string("public_ip")
                .description("public ip address")
                .optional()
                .computed(),
            Attribute::single_nested(
                "attachment",
                vec![
                    Attribute::int64("id")
                        .description("unique identifier of the attachment")
                        .computed(),
                    Attribute::string("name")
                        .description("name of the attachment")
                        .computed(),
                    Attribute::string("type")
                        .description("type of the attachment")
                        .computed(),
                    Attribute::string("private_ip")
                        .description("private ip address of the attachment")
                        .computed(),
                ],
            )
            .description("attachment of the elastic ip")
            .computed(),
        ])
    }

    async fn read(&self, _ctx: &OperationContext, config: &Value) -> Result<Value> {
        let client = self.client.get().await?;
        let elastic_ips = client
            .elastic_ips()
            .list()
            .await
            .action("list elastic ips")?;

        let candidates = encode_all::<_, ElasticIpModel>(&elastic_ips)?;
        filter::find_one("elastic ip", &self.schema(), config, candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudbit_client::ElasticIpAttachment;

    #[test]
    fn test_unattached_elastic_ip_has_no_attachment() {
        let elastic_ip = ElasticIp {
            id: 3,
            public_ip: "185.98.122.1".to_string(),
            attachment: Some(ElasticIpAttachment::default()),
            ..Default::default()
        };
        let model = ElasticIpModel::from(&elastic_ip);
        assert!(model.attachment.is_none());

        let value = Value::encode(&model).unwrap();
        assert!(value.attr("attachment").is_null());
    }

    #[test]
    fn test_attachment_carries_private_ip() {
        let elastic_ip = ElasticIp {
            id: 3,
            private_ip: Some("10.0.0.4".to_string()),
            attachment: Some(ElasticIpAttachment {
                id: 9,
                name: "web-1".to_string(),
                attachment_type: "server".to_string(),
            }),
            ..Default::default()
        };

        let value = Value::encode(&ElasticIpModel::from(&elastic_ip)).unwrap();
        let attachment = value.attr("attachment");
        assert_eq!(attachment.attr("id").as_i64(), Some(9));
        assert_eq!(attachment.attr("type").as_str(), Some("server"));
        assert_eq!(attachment.attr("private_ip").as_str(), Some("10.0.0.4"));
    }
}
