//! SSH key pairs

use crate::client::{Client, Collection};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyPair {
    pub id: i64,
    pub name: String,
    pub fingerprint: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyPairCreate {
    pub name: String,
    pub public_key: String,
}

impl Client {
    pub fn key_pairs(&self) -> Collection<'_, KeyPair> {
        self.collection("v4/compute/key-pairs")
    }
}
