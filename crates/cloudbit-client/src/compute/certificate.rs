//! TLS certificates used by load balancer pools

use crate::client::{Client, Collection};
use crate::entities::Location;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CertificateDetails {
    pub subject: String,
    pub issuer: String,
    pub valid_from: String,
    pub valid_to: String,
    pub serial: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Certificate {
    pub id: i64,
    pub name: String,
    pub location: Location,
    pub details: CertificateDetails,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CertificateCreate {
    pub name: String,
    pub location_id: i64,
    pub certificate: String,
    pub private_key: String,
}

impl Client {
    pub fn certificates(&self) -> Collection<'_, Certificate> {
        self.collection("v4/compute/certificates")
    }
}
