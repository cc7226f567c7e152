//! Volume snapshots

use crate::client::{Client, Collection};
use crate::entities::{Kind, Reference};
use serde::{Deserialize, Serialize};

pub const SNAPSHOT_STATUS_AVAILABLE: &str = "available";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub id: i64,
    pub name: String,
    pub size: i64,
    pub status: Kind,
    pub volume: Reference,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SnapshotCreate {
    pub name: String,
    pub volume_id: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SnapshotUpdate {
    pub name: String,
}

impl Client {
    pub fn snapshots(&self) -> Collection<'_, Snapshot> {
        self.collection("v4/compute/snapshots")
    }
}
