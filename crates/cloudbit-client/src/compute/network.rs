//! Private networks

use crate::client::{Client, Collection};
use crate::entities::Location;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Network {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub cidr: String,
    pub location: Location,
    pub domain_name_servers: Vec<String>,
    pub allocation_pool_start: String,
    pub allocation_pool_end: String,
    pub gateway_ip: Option<String>,
    pub used_ips: i64,
    pub total_ips: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NetworkCreate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub location_id: i64,
    pub cidr: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub domain_name_servers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allocation_pool_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allocation_pool_end: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_ip: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NetworkUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_name_servers: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allocation_pool_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allocation_pool_end: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_ip: Option<String>,
}

impl Client {
    pub fn networks(&self) -> Collection<'_, Network> {
        self.collection("v4/compute/networks")
    }
}
