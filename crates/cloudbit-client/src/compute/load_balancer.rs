//! Load balancers, pools and pool members

use crate::client::{Client, Collection};
use crate::compute::Certificate;
use crate::entities::{Kind, Location, Reference};
use crate::error::Result;
use crate::order::Ordering;
use serde::{Deserialize, Serialize};

pub const LOAD_BALANCER_STATUS_ACTIVE: &str = "active";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadBalancerNetwork {
    pub id: i64,
    pub private_ip: String,
    pub network: Reference,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadBalancer {
    pub id: i64,
    pub name: String,
    pub location: Location,
    pub status: Kind,
    pub networks: Vec<LoadBalancerNetwork>,
    pub public_ip: Option<String>,
}

impl LoadBalancer {
    pub fn is_active(&self) -> bool {
        self.status.key == LOAD_BALANCER_STATUS_ACTIVE
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadBalancerCreate {
    pub name: String,
    pub location_id: i64,
    pub network_id: i64,
    pub attach_external_ip: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadBalancerUpdate {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthCheck {
    #[serde(rename = "type")]
    pub check_type: Kind,
    pub interval: i64,
    pub timeout: i64,
    pub max_retries: i64,
    pub http_method: Option<String>,
    pub http_path: Option<String>,
    pub http_status_codes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadBalancerPool {
    pub id: i64,
    pub name: String,
    pub entry_protocol: Kind,
    pub target_protocol: Kind,
    pub entry_port: i64,
    pub algorithm: Kind,
    pub sticky_session: bool,
    pub certificate: Option<Certificate>,
    pub health_check: HealthCheck,
    pub status: Kind,
}

/// Body for creating and updating a pool
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadBalancerPoolOptions {
    pub name: String,
    pub entry_protocol_id: i64,
    pub target_protocol_id: i64,
    pub entry_port: i64,
    pub algorithm_id: i64,
    pub sticky_session: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_id: Option<i64>,
    pub health_check_type_id: i64,
    pub health_check_interval: i64,
    pub health_check_timeout: i64,
    pub health_check_max_retries: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_check_http_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_check_http_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_check_http_status_codes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadBalancerMember {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub port: i64,
    pub status: Kind,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadBalancerMemberCreate {
    pub name: String,
    pub address: String,
    pub port: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadBalancerMemberUpdate {
    pub name: String,
}

pub type LoadBalancerProtocol = Kind;
pub type LoadBalancerAlgorithm = Kind;
pub type LoadBalancerHealthCheckType = Kind;

pub struct LoadBalancerService<'a> {
    client: &'a Client,
}

impl<'a> LoadBalancerService<'a> {
    fn collection(&self) -> Collection<'a, LoadBalancer> {
        self.client.collection("v4/compute/load-balancers")
    }

    pub async fn list(&self) -> Result<Vec<LoadBalancer>> {
        self.collection().list().await
    }

    pub async fn get(&self, id: i64) -> Result<LoadBalancer> {
        self.collection().get(id).await
    }

    /// Order a new load balancer
    pub async fn create(&self, body: &LoadBalancerCreate) -> Result<Ordering> {
        self.client.post("v4/compute/load-balancers", body).await
    }

    pub async fn update(&self, id: i64, body: &LoadBalancerUpdate) -> Result<LoadBalancer> {
        self.collection().update(id, body).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.collection().delete(id).await
    }

    pub fn pools(&self, load_balancer_id: i64) -> Collection<'a, LoadBalancerPool> {
        self.client.collection(format!(
            "v4/compute/load-balancers/{}/pools",
            load_balancer_id
        ))
    }

    pub fn members(&self, load_balancer_id: i64, pool_id: i64) -> Collection<'a, LoadBalancerMember> {
        self.client.collection(format!(
            "v4/compute/load-balancers/{}/pools/{}/members",
            load_balancer_id, pool_id
        ))
    }

    pub fn protocols(&self) -> Collection<'a, LoadBalancerProtocol> {
        self.client
            .collection("v4/entities/compute/load-balancers/protocols")
    }

    pub fn algorithms(&self) -> Collection<'a, LoadBalancerAlgorithm> {
        self.client
            .collection("v4/entities/compute/load-balancers/algorithms")
    }

    pub fn health_check_types(&self) -> Collection<'a, LoadBalancerHealthCheckType> {
        self.client
            .collection("v4/entities/compute/load-balancers/health-check-types")
    }
}

impl Client {
    pub fn load_balancers(&self) -> LoadBalancerService<'_> {
        LoadBalancerService { client: self }
    }
}
