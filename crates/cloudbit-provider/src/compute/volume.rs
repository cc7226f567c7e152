//! `cloudbit_compute_volume` and `cloudbit_compute_volume_attachment`

use crate::common::{
    encode_all, found, id_attribute, id_filter, int_attr, location_attribute,
    wait_context,
};
use crate::config::ClientHandle;
use crate::error::{ClientResultExt, ProviderError, Result};
use crate::filter;
use crate::wait::{wait_for_deletion, wait_for_status};
use async_trait::async_trait;
use cloudbit_client::{
    Client, VOLUME_STATUS_AVAILABLE, VOLUME_STATUS_IN_USE, Volume, VolumeCreate, VolumeUpdate,
};
use cloudbit_plugin::{
    Attribute, DataSource, Diagnostics, OperationContext, Resource, Schema, Validator, Value,
    import_ids,
};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct VolumeModel {
    id: Option<i64>,
    name: Option<String>,
    size: Option<i64>,
    location_id: Option<i64>,
    restore_from_snapshot_id: Option<i64>,
    status: Option<String>,
    serial_number: Option<String>,
    server_id: Option<i64>,
}

impl From<&Volume> for VolumeModel {
    fn from(volume: &Volume) -> Self {
        Self {
            id: Some(volume.id),
            name: Some(volume.name.clone()),
            size: Some(volume.size),
            location_id: Some(volume.location.id),
            restore_from_snapshot_id: volume.snapshot.as_ref().map(|s| s.id),
            status: Some(volume.status.key.clone()),
            serial_number: Some(volume.serial_number.clone()),
            server_id: volume.attached_server(),
        }
    }
}

async fn wait_for_volume_status(
    ctx: &OperationContext,
    client: &Client,
    id: i64,
    wanted: &str,
) -> Result<()> {
    wait_for_status(ctx, wanted, move || async move {
        let volume = client.volumes().get(id).await.action("get volume")?;
        Ok(volume.status.key)
    })
    .await
}

pub struct VolumeResource {
    client: ClientHandle,
}

impl VolumeResource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for VolumeResource {
    type Error = ProviderError;

    fn type_name(&self) -> &str {
        "cloudbit_compute_volume"
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![
            id_attribute("volume"),
            Attribute::string("name")
                .description("name of the volume")
                .required()
                .validator(Validator::NonEmpty),
            Attribute::int64("size")
                .description("size of the volume in GiB, can only be increased")
                .required()
                .validator(Validator::int_range(1, 16384)),
            location_attribute("volume"),
            Attribute::int64("restore_from_snapshot_id")
                .description("snapshot the volume is restored from")
                .optional()
                .requires_replace(),
            Attribute::string("status")
                .description("status of the volume")
                .computed(),
            Attribute::string("serial_number")
                .description("serial number of the volume")
                .computed()
                .use_state_for_unknown(),
            Attribute::int64("server_id")
                .description("server the volume is attached to")
                .computed(),
        ])
        .description("Block storage volume.")
    }

    async fn create(&self, ctx: &OperationContext, planned: &Value) -> Result<Value> {
        let client = self.client.get().await?;
        let plan: VolumeModel = planned.decode()?;

        let body = VolumeCreate {
            name: plan.name.unwrap_or_default(),
            size: plan.size.unwrap_or_default(),
            location_id: plan.location_id.unwrap_or_default(),
            snapshot_id: plan.restore_from_snapshot_id,
        };
        let volume = client.volumes().create(&body).await.action("create volume")?;
        info!(id = volume.id, size = volume.size, "created volume");

        let ctx = wait_context(ctx);
        wait_for_volume_status(&ctx, &client, volume.id, VOLUME_STATUS_AVAILABLE).await?;

        let volume = client.volumes().get(volume.id).await.action("get volume")?;
        Ok(Value::encode(&VolumeModel::from(&volume))?)
    }

    async fn read(&self, _ctx: &OperationContext, state: &Value) -> Result<Option<Value>> {
        let client = self.client.get().await?;
        let id = int_attr(state, "id")?;

        match found(client.volumes().get(id).await, "get volume")? {
            Some(volume) => Ok(Some(Value::encode(&VolumeModel::from(&volume))?)),
            None => Ok(None),
        }
    }

    async fn update(&self, ctx: &OperationContext, prior: &Value, planned: &Value) -> Result<Value> {
        let client = self.client.get().await?;
        let id = int_attr(prior, "id")?;
        let before: VolumeModel = prior.decode()?;
        let plan: VolumeModel = planned.decode()?;

        let (current, wanted) = (before.size.unwrap_or_default(), plan.size.unwrap_or_default());
        if wanted < current {
            return Err(ProviderError::invalid_state(format!(
                "volume size can not be reduced from {} GiB to {} GiB",
                current, wanted
            )));
        }

        if plan.name != before.name {
            let body = VolumeUpdate {
                name: plan.name.clone().unwrap_or_default(),
            };
            client
                .volumes()
                .update(id, &body)
                .await
                .action("update volume")?;
        }

        if wanted > current {
            client
                .expand_volume(id, wanted)
                .await
                .action("expand volume")?;

            let ctx = wait_context(ctx);
            let status = before.status.unwrap_or_else(|| VOLUME_STATUS_AVAILABLE.to_string());
            wait_for_volume_status(&ctx, &client, id, &status).await?;
        }

        let volume = client.volumes().get(id).await.action("get volume")?;
        Ok(Value::encode(&VolumeModel::from(&volume))?)
    }

    async fn delete(&self, ctx: &OperationContext, state: &Value) -> Result<()> {
        let client = self.client.get().await?;
        let id = int_attr(state, "id")?;

        if found(client.volumes().delete(id).await, "delete volume")?.is_none() {
            return Ok(());
        }

        let ctx = wait_context(ctx);
        let volumes = client.volumes();
        wait_for_deletion(&ctx, || volumes.get(id)).await
    }
}

pub struct VolumeDataSource {
    client: ClientHandle,
}

impl VolumeDataSource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for VolumeDataSource {
    type Error = ProviderError;

    fn type_name(&self) -> &str {
        "cloudbit_compute_volume"
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![
            id_filter("volume"),
            Attribute::string("name")
                .description("name of the volume")
                .optional()
                .computed(),
            Attribute::int64("location_id")
                .description("location of the volume")
                .optional()
                .computed(),
            Attribute::string("serial_number")
                .description("serial number of the volume")
                .optional()
                .computed(),
            Attribute::int64("size")
                .description("size of the volume in GiB")
                .computed(),
            Attribute::int64("restore_from_snapshot_id")
                .description("snapshot the volume was restored from")
                .computed(),
            Attribute::string("status")
                .description("status of the volume")
                .computed(),
            Attribute::int64("server_id")
                .description("server the volume is attached to")
                .computed(),
        ])
    }

    async fn read(&self, _ctx: &OperationContext, config: &Value) -> Result<Value> {
        let client = self.client.get().await?;
        let volumes = client.volumes().list().await.action("list volumes")?;

        let candidates = encode_all::<_, VolumeModel>(&volumes)?;
        filter::find_one("volume", &self.schema(), config, candidates)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct VolumeAttachmentModel {
    server_id: Option<i64>,
    volume_id: Option<i64>,
}

pub struct VolumeAttachmentResource {
    client: ClientHandle,
}

impl VolumeAttachmentResource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for VolumeAttachmentResource {
    type Error = ProviderError;

    fn type_name(&self) -> &str {
        "cloudbit_compute_volume_attachment"
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![
            Attribute::int64("server_id")
                .description("server to attach the volume to")
                .required()
                .requires_replace(),
            Attribute::int64("volume_id")
                .description("volume to attach")
                .required()
                .requires_replace(),
        ])
        .description("Attachment of a volume to a server.")
    }

    async fn create(&self, ctx: &OperationContext, planned: &Value) -> Result<Value> {
        let client = self.client.get().await?;
        let server_id = int_attr(planned, "server_id")?;
        let volume_id = int_attr(planned, "volume_id")?;

        client
            .servers()
            .attach_volume(server_id, volume_id)
            .await
            .action("attach volume")?;

        let ctx = wait_context(ctx);
        wait_for_volume_status(&ctx, &client, volume_id, VOLUME_STATUS_IN_USE).await?;

        Ok(Value::encode(&VolumeAttachmentModel {
            server_id: Some(server_id),
            volume_id: Some(volume_id),
        })?)
    }

    async fn read(&self, _ctx: &OperationContext, state: &Value) -> Result<Option<Value>> {
        let client = self.client.get().await?;
        let server_id = int_attr(state, "server_id")?;
        let volume_id = int_attr(state, "volume_id")?;

        let Some(volume) = found(client.volumes().get(volume_id).await, "get volume")? else {
            return Ok(None);
        };

        if volume.attachments.iter().any(|a| a.server.id == server_id) {
            Ok(Some(state.clone()))
        } else {
            Ok(None)
        }
    }

    async fn update(&self, _ctx: &OperationContext, _prior: &Value, _planned: &Value) -> Result<Value> {
        Err(ProviderError::UpdateNotSupported(
            "cloudbit_compute_volume_attachment".to_string(),
        ))
    }

    async fn delete(&self, ctx: &OperationContext, state: &Value) -> Result<()> {
        let client = self.client.get().await?;
        let server_id = int_attr(state, "server_id")?;
        let volume_id = int_attr(state, "volume_id")?;

        let detached = found(
            client.servers().detach_volume(server_id, volume_id).await,
            "detach volume",
        )?;
        if detached.is_none() {
            return Ok(());
        }

        let ctx = wait_context(ctx);
        wait_for_volume_status(&ctx, &client, volume_id, VOLUME_STATUS_AVAILABLE).await
    }

    fn import(&self, id: &str) -> std::result::Result<Value, Diagnostics> {
        import_ids(id, &["server_id", "volume_id"])
    }
}
