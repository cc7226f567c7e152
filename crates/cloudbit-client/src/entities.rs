//! Shared entities: locations, modules, products and common references

use crate::client::{Client, Collection};
use serde::{Deserialize, Serialize};

/// A data center location
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    pub id: i64,
    pub name: String,
    pub key: String,
    pub city: String,
}

/// Minimal reference to another entity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Reference {
    pub id: i64,
    pub name: String,
}

/// Keyed enumeration value such as a status or product type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Kind {
    pub id: i64,
    pub name: String,
    pub key: String,
}

/// A product module (compute, kubernetes, ...)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Module {
    pub id: i64,
    pub name: String,
    pub parent: Option<Reference>,
    pub locations: Vec<Location>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageCycle {
    pub id: i64,
    pub name: String,
    pub duration: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductItem {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub amount: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductAvailability {
    pub location: Location,
    pub available: i64,
}

/// An orderable product
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Product {
    pub id: i64,
    #[serde(rename = "product_name")]
    pub name: String,
    #[serde(rename = "type")]
    pub product_type: Kind,
    pub visibility: String,
    pub usage_cycle: UsageCycle,
    pub items: Vec<ProductItem>,
    pub price: f64,
    pub availability: Vec<ProductAvailability>,
}

impl Product {
    /// Whether the product can be ordered in the given location
    pub fn available_at(&self, location_id: i64) -> bool {
        self.availability
            .iter()
            .any(|a| a.location.id == location_id && a.available > 0)
    }
}

impl Client {
    pub fn locations(&self) -> Collection<'_, Location> {
        self.collection("v4/entities/locations")
    }

    pub fn modules(&self) -> Collection<'_, Module> {
        self.collection("v4/entities/modules")
    }

    pub fn products(&self) -> Collection<'_, Product> {
        self.collection("v4/entities/products")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_uses_product_name() {
        let product: Product = serde_json::from_value(serde_json::json!({
            "id": 44,
            "product_name": "b1.2x4",
            "type": {"id": 1, "name": "Compute Engine", "key": "compute-engine-vm"},
            "price": 27.5,
            "availability": [
                {"location": {"id": 1, "name": "Lucerne", "key": "LUC1"}, "available": 10},
                {"location": {"id": 2, "name": "Zurich", "key": "ZRH1"}, "available": 0}
            ]
        }))
        .unwrap();

        assert_eq!(product.name, "b1.2x4");
        assert_eq!(product.product_type.key, "compute-engine-vm");
        assert!(product.available_at(1));
        assert!(!product.available_at(2));
        assert!(product.items.is_empty());
    }
}
