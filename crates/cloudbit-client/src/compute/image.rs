//! Operating system images

use crate::client::{Client, Collection};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Image {
    pub id: i64,
    pub os_type: String,
    pub os_version: String,
    pub key: String,
    pub category: String,
    #[serde(rename = "type")]
    pub image_type: String,
    pub min_root_disk_size: i64,
    pub username: String,
}

impl Client {
    pub fn images(&self) -> Collection<'_, Image> {
        self.collection("v4/entities/compute/images")
    }
}
