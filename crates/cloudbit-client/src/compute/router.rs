//! Routers with their interfaces and static routes

use crate::client::{Client, Collection};
use crate::entities::Location;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Router {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub location: Location,
    pub public: bool,
    pub snat: bool,
    pub public_ip: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RouterCreate {
    pub name: String,
    pub location_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub public: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RouterUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterInterfaceNetwork {
    pub id: i64,
    pub name: String,
    pub cidr: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterInterface {
    pub id: i64,
    pub private_ip: String,
    pub network: RouterInterfaceNetwork,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RouterInterfaceCreate {
    pub network_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_ip: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Route {
    pub id: i64,
    pub destination: String,
    #[serde(rename = "nexthop")]
    pub next_hop: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RouteCreate {
    pub destination: String,
    #[serde(rename = "nexthop")]
    pub next_hop: String,
}

impl Client {
    pub fn routers(&self) -> Collection<'_, Router> {
        self.collection("v4/compute/routers")
    }

    pub fn router_interfaces(&self, router_id: i64) -> Collection<'_, RouterInterface> {
        self.collection(format!("v4/compute/routers/{}/router-interfaces", router_id))
    }

    pub fn routes(&self, router_id: i64) -> Collection<'_, Route> {
        self.collection(format!("v4/compute/routers/{}/routes", router_id))
    }
}
