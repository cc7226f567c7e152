//! Security groups and their firewall rules

use crate::client::{Client, Collection};
use crate::entities::{Location, Reference};
use serde::{Deserialize, Serialize};

pub const DIRECTION_INGRESS: &str = "ingress";
pub const DIRECTION_EGRESS: &str = "egress";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityGroup {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub location: Location,
    pub default: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SecurityGroupCreate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub location_id: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SecurityGroupUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityGroupRule {
    pub id: i64,
    pub direction: String,
    pub protocol: String,
    pub from_port: Option<i64>,
    pub to_port: Option<i64>,
    pub icmp_type: Option<i64>,
    pub icmp_code: Option<i64>,
    pub ip_range: Option<String>,
    pub remote_security_group: Option<Reference>,
}

/// Body for creating and updating a rule
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SecurityGroupRuleOptions {
    pub direction: String,
    pub protocol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_port: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_port: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icmp_type: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icmp_code: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_security_group_id: Option<i64>,
}

impl Client {
    pub fn security_groups(&self) -> Collection<'_, SecurityGroup> {
        self.collection("v4/compute/security-groups")
    }

    pub fn security_group_rules(&self, security_group_id: i64) -> Collection<'_, SecurityGroupRule> {
        self.collection(format!(
            "v4/compute/security-groups/{}/rules",
            security_group_id
        ))
    }
}
