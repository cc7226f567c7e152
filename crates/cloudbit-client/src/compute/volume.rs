//! Block storage volumes

use crate::client::{Client, Collection};
use crate::entities::{Kind, Location, Reference};
use crate::error::Result;
use serde::{Deserialize, Serialize};

pub const VOLUME_STATUS_AVAILABLE: &str = "available";
pub const VOLUME_STATUS_IN_USE: &str = "in-use";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeAttachment {
    pub id: i64,
    pub server: Reference,
    pub device: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Volume {
    pub id: i64,
    pub name: String,
    pub size: i64,
    pub status: Kind,
    pub location: Location,
    pub snapshot: Option<Reference>,
    pub serial_number: String,
    pub bootable: bool,
    pub root: bool,
    pub attachments: Vec<VolumeAttachment>,
}

impl Volume {
    /// Id of the server the volume is attached to
    pub fn attached_server(&self) -> Option<i64> {
        self.attachments.first().map(|a| a.server.id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VolumeCreate {
    pub name: String,
    pub size: i64,
    pub location_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VolumeUpdate {
    pub name: String,
}

impl Client {
    pub fn volumes(&self) -> Collection<'_, Volume> {
        self.collection("v4/compute/volumes")
    }

    /// Grow a volume; shrinking is rejected by the API
    pub async fn expand_volume(&self, id: i64, size: i64) -> Result<()> {
        self.post_no_content(
            &format!("v4/compute/volumes/{}/expand", id),
            &serde_json::json!({ "size": size }),
        )
        .await
    }
}
