//! Elastic IPs

use crate::client::{Client, Collection};
use crate::entities::{Location, Reference};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElasticIpAttachment {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub attachment_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElasticIp {
    pub id: i64,
    pub product: Reference,
    pub location: Location,
    pub price: f64,
    pub public_ip: String,
    pub private_ip: Option<String>,
    pub attachment: Option<ElasticIpAttachment>,
}

impl ElasticIp {
    /// Attachment, if the elastic IP is attached to anything
    pub fn attached_to(&self) -> Option<&ElasticIpAttachment> {
        self.attachment.as_ref().filter(|a| a.id != 0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElasticIpCreate {
    pub location_id: i64,
}

impl Client {
    pub fn elastic_ips(&self) -> Collection<'_, ElasticIp> {
        self.collection("v4/compute/elastic-ips")
    }
}
