//! `cloudbit_compute_snapshot`

use crate::common::{encode_all, found, id_attribute, id_filter, int_attr, wait_context};
use crate::config::ClientHandle;
use crate::error::{ClientResultExt, ProviderError, Result};
use crate::filter;
use crate::wait::{wait_for_deletion, wait_for_status};
use async_trait::async_trait;
use cloudbit_client::{Client, SNAPSHOT_STATUS_AVAILABLE, Snapshot, SnapshotCreate, SnapshotUpdate};
use cloudbit_plugin::{Attribute, DataSource, OperationContext, Resource, Schema, Validator, Value};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SnapshotModel {
    id: Option<i64>,
    name: Option<String>,
    volume_id: Option<i64>,
    size: Option<i64>,
    status: Option<String>,
    created_at: Option<String>,
}

impl From<&Snapshot> for SnapshotModel {
    fn from(snapshot: &Snapshot) -> Self {
        Self {
            id: Some(snapshot.id),
            name: Some(snapshot.name.clone()),
            volume_id: Some(snapshot.volume.id),
            size: Some(snapshot.size),
            status: Some(snapshot.status.key.clone()),
            created_at: Some(snapshot.created_at.clone()),
        }
    }
}

pub struct SnapshotResource {
    client: ClientHandle,
}

impl SnapshotResource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for SnapshotResource {
    type Error = ProviderError;

    fn type_name(&self) -> &str {
        "cloudbit_compute_snapshot"
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![
            id_attribute("snapshot"),
            Attribute::string("name")
                .description("name of the snapshot")
                .required()
                .validator(Validator::NonEmpty),
            Attribute::int64("volume_id")
                .description("volume to snapshot")
                .required()
                .requires_replace(),
            Attribute::int64("size")
                .description("size of the snapshot in GiB")
                .computed()
                .use_state_for_unknown(),
            Attribute::string("status")
                .description("status of the snapshot")
                .computed(),
            Attribute::string("created_at")
                .description("creation time of the snapshot")
                .computed()
                .use_state_for_unknown(),
        ])
        .description("Point in time copy of a volume.")
    }

    async fn create(&self, ctx: &OperationContext, planned: &Value) -> Result<Value> {
        let client = self.client.get().await?;
        let plan: SnapshotModel = planned.decode()?;

        let body = SnapshotCreate {
            name: plan.name.unwrap_or_default(),
            volume_id: plan.volume_id.unwrap_or_default(),
        };
        let snapshot = client
            .snapshots()
            .create(&body)
            .await
            .action("create snapshot")?;

        let ctx = wait_context(ctx);
        let id = snapshot.id;
        let api: &Client = &client;
        wait_for_status(&ctx, SNAPSHOT_STATUS_AVAILABLE, move || async move {
            let snapshot = api.snapshots().get(id).await.action("get snapshot")?;
            Ok(snapshot.status.key)
        })
        .await?;

        let snapshot = client.snapshots().get(id).await.action("get snapshot")?;
        Ok(Value::encode(&SnapshotModel::from(&snapshot))?)
    }

    async fn read(&self, _ctx: &OperationContext, state: &Value) -> Result<Option<Value>> {
        let client = self.client.get().await?;
        let id = int_attr(state, "id")?;

        match found(client.snapshots().get(id).await, "get snapshot")? {
            Some(snapshot) => Ok(Some(Value::encode(&SnapshotModel::from(&snapshot))?)),
            None => Ok(None),
        }
    }

    async fn update(&self, _ctx: &OperationContext, prior: &Value, planned: &Value) -> Result<Value> {
        let client = self.client.get().await?;
        let id = int_attr(prior, "id")?;
        let plan: SnapshotModel = planned.decode()?;

        let body = SnapshotUpdate {
            name: plan.name.unwrap_or_default(),
        };
        let snapshot = client
            .snapshots()
            .update(id, &body)
            .await
            .action("update snapshot")?;

        Ok(Value::encode(&SnapshotModel::from(&snapshot))?)
    }

    async fn delete(&self, ctx: &OperationContext, state: &Value) -> Result<()> {
        let client = self.client.get().await?;
        let id = int_attr(state, "id")?;

        if found(client.snapshots().delete(id).await, "delete snapshot")?.is_none() {
            return Ok(());
        }

        let ctx = wait_context(ctx);
        let snapshots = client.snapshots();
        wait_for_deletion(&ctx, || snapshots.get(id)).await
    }
}

pub struct SnapshotDataSource {
    client: ClientHandle,
}

impl SnapshotDataSource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for SnapshotDataSource {
    type Error = ProviderError;

    fn type_name(&self) -> &str {
        "cloudbit_compute_snapshot"
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![
            id_filter("snapshot"),
            Attribute::string("name")
                .description("name of the snapshot")
                .optional()
                .computed(),
            Attribute::int64("volume_id")
                .description("volume the snapshot was taken of")
                .optional()
                .computed(),
            Attribute::int64("size")
                .description("size of the snapshot in GiB")
                .computed(),
            Attribute::string("status")
                .description("status of the snapshot")
                .computed(),
            Attribute::string("created_at")
                .description("creation time of the snapshot")
                .computed(),
        ])
    }

    async fn read(&self, _ctx: &OperationContext, config: &Value) -> Result<Value> {
        let client = self.client.get().await?;
        let snapshots = client.snapshots().list().await.action("list snapshots")?;

        let candidates = encode_all::<_, SnapshotModel>(&snapshots)?;
        filter::find_one("snapshot", &self.schema(), config, candidates)
    }
}
