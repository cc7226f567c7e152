//! Compute instances
//!
//! Servers are ordered products: [`ServerService::create`] returns an
//! [`Ordering`] that has to be polled until the order references the new
//! instance.

use crate::client::{Client, Collection};
use crate::compute::{Image, KeyPair, Volume};
use crate::entities::{Kind, Location, Product, Reference};
use crate::error::Result;
use crate::order::Ordering;
use serde::{Deserialize, Serialize};

pub const SERVER_STATUS_RUNNING: &str = "running";
pub const SERVER_STATUS_STOPPED: &str = "stopped";
pub const SERVER_STATUS_WORKING: &str = "working";
pub const SERVER_STATUS_ERROR: &str = "error";

pub const SERVER_ACTION_START: &str = "start";
pub const SERVER_ACTION_STOP: &str = "stop";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkInterface {
    pub id: i64,
    pub private_ip: String,
    pub mac_address: String,
    pub network: Reference,
    pub security: bool,
    pub security_groups: Vec<Reference>,
    pub public_ip: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NetworkInterfaceCreate {
    pub network_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_ip: Option<String>,
    pub security_group_ids: Vec<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NetworkInterfaceSecurityGroups {
    pub security_group_ids: Vec<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Server {
    pub id: i64,
    pub name: String,
    pub hostname: String,
    pub status: Kind,
    pub image: Image,
    pub product: Product,
    pub location: Location,
    pub networks: Vec<NetworkInterface>,
    pub volumes: Vec<Volume>,
    pub key_pair: Option<KeyPair>,
}

impl Server {
    pub fn is_running(&self) -> bool {
        self.status.key == SERVER_STATUS_RUNNING
    }
}

/// Interface requested at order time
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ServerNetworkRequest {
    pub network_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_ip: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub security_group_ids: Vec<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ServerCreate {
    pub name: String,
    pub location_id: i64,
    pub image_id: i64,
    pub product_id: i64,
    pub boot_volume_size: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_pair_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_data: Option<String>,
    pub networks: Vec<ServerNetworkRequest>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub volume_ids: Vec<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ServerUpdate {
    pub name: String,
}

pub struct ServerService<'a> {
    client: &'a Client,
}

impl<'a> ServerService<'a> {
    fn collection(&self) -> Collection<'a, Server> {
        self.client.collection("v4/compute/instances")
    }

    fn path(&self, id: i64) -> String {
        format!("v4/compute/instances/{}", id)
    }

    pub async fn list(&self) -> Result<Vec<Server>> {
        self.collection().list().await
    }

    pub async fn get(&self, id: i64) -> Result<Server> {
        self.collection().get(id).await
    }

    /// Order a new server
    pub async fn create(&self, body: &ServerCreate) -> Result<Ordering> {
        self.client.post("v4/compute/instances", body).await
    }

    pub async fn update(&self, id: i64, body: &ServerUpdate) -> Result<Server> {
        self.collection().update(id, body).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.collection().delete(id).await
    }

    /// `start` or `stop`
    pub async fn action(&self, id: i64, action: &str) -> Result<()> {
        self.client
            .post_no_content(
                &format!("{}/action", self.path(id)),
                &serde_json::json!({ "action": action }),
            )
            .await
    }

    /// Switch to another product (flavor)
    pub async fn upgrade(&self, id: i64, product_id: i64) -> Result<()> {
        self.client
            .post_no_content(
                &format!("{}/upgrade", self.path(id)),
                &serde_json::json!({ "product_id": product_id }),
            )
            .await
    }

    pub async fn attach_elastic_ip(&self, id: i64, elastic_ip_id: i64, network_interface_id: i64) -> Result<()> {
        self.client
            .post_no_content(
                &format!("{}/elastic-ips", self.path(id)),
                &serde_json::json!({
                    "elastic_ip_id": elastic_ip_id,
                    "network_interface_id": network_interface_id,
                }),
            )
            .await
    }

    pub async fn detach_elastic_ip(&self, id: i64, elastic_ip_id: i64) -> Result<()> {
        self.client
            .delete(&format!("{}/elastic-ips/{}", self.path(id), elastic_ip_id))
            .await
    }

    pub async fn attach_volume(&self, id: i64, volume_id: i64) -> Result<()> {
        self.client
            .post_no_content(
                &format!("{}/volumes", self.path(id)),
                &serde_json::json!({ "volume_id": volume_id }),
            )
            .await
    }

    pub async fn detach_volume(&self, id: i64, volume_id: i64) -> Result<()> {
        self.client
            .delete(&format!("{}/volumes/{}", self.path(id), volume_id))
            .await
    }

    pub fn network_interfaces(&self, id: i64) -> Collection<'a, NetworkInterface> {
        self.client
            .collection(format!("v4/compute/instances/{}/network-interfaces", id))
    }

    pub async fn update_network_interface_security_groups(
        &self,
        id: i64,
        interface_id: i64,
        security_group_ids: Vec<i64>,
    ) -> Result<NetworkInterface> {
        self.client
            .patch(
                &format!(
                    "{}/network-interfaces/{}/security-groups",
                    self.path(id),
                    interface_id
                ),
                &NetworkInterfaceSecurityGroups { security_group_ids },
            )
            .await
    }
}

impl Client {
    pub fn servers(&self) -> ServerService<'_> {
        ServerService { client: self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_with_null_key_pair() {
        let server: Server = serde_json::from_value(serde_json::json!({
            "id": 7,
            "name": "web-1",
            "status": {"id": 1, "name": "Running", "key": "running"},
            "networks": [
                {"id": 3, "private_ip": "10.0.0.5", "network": {"id": 2, "name": "lan"}, "public_ip": null}
            ],
            "key_pair": null
        }))
        .unwrap();

        assert!(server.is_running());
        assert!(server.key_pair.is_none());
        assert_eq!(server.networks[0].network.id, 2);
        assert!(server.networks[0].public_ip.is_none());
    }

    #[test]
    fn test_server_create_skips_empty_options() {
        let body = serde_json::to_value(ServerCreate {
            name: "web-1".to_string(),
            location_id: 1,
            image_id: 2,
            product_id: 3,
            boot_volume_size: 20,
            networks: vec![ServerNetworkRequest {
                network_id: 4,
                ..Default::default()
            }],
            ..Default::default()
        })
        .unwrap();

        assert!(body.get("key_pair_id").is_none());
        assert!(body.get("volume_ids").is_none());
        assert_eq!(body["networks"][0], serde_json::json!({"network_id": 4}));
    }
}
