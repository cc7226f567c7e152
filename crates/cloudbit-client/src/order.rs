//! Orders
//!
//! Creating billable products (servers, load balancers, clusters) does not
//! return the entity itself but an [`Ordering`] pointing at an order. The
//! order is processed asynchronously and eventually references the created
//! product instance.

use crate::client::Client;
use crate::entities::Kind;
use crate::error::{ClientError, Result};
use serde::{Deserialize, Serialize};

pub const ORDER_STATUS_NEW: i64 = 1;
pub const ORDER_STATUS_PROCESSING: i64 = 2;
pub const ORDER_STATUS_PROCESSED: i64 = 3;
pub const ORDER_STATUS_FAILED: i64 = 4;

/// Receipt of an asynchronous create
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ordering {
    #[serde(rename = "ref")]
    pub reference: String,
}

impl Ordering {
    /// Order id parsed from the reference (`/v4/orders/{id}`)
    pub fn order_id(&self) -> Result<i64> {
        self.reference
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .and_then(|id| id.parse().ok())
            .ok_or_else(|| ClientError::InvalidOrderRef(self.reference.clone()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Order {
    pub id: i64,
    #[serde(rename = "type")]
    pub order_type: Kind,
    pub status: Kind,
    pub product_instance_id: Option<i64>,
}

impl Order {
    pub fn is_processed(&self) -> bool {
        self.status.id == ORDER_STATUS_PROCESSED
    }

    pub fn is_failed(&self) -> bool {
        self.status.id == ORDER_STATUS_FAILED
    }

    /// Processed or failed
    pub fn is_done(&self) -> bool {
        self.is_processed() || self.is_failed()
    }
}

pub struct OrderService<'a> {
    client: &'a Client,
}

impl OrderService<'_> {
    pub async fn get(&self, id: i64) -> Result<Order> {
        self.client.get(&format!("v4/orders/{}", id)).await
    }

    pub async fn get_by_ordering(&self, ordering: &Ordering) -> Result<Order> {
        self.get(ordering.order_id()?).await
    }
}

impl Client {
    pub fn orders(&self) -> OrderService<'_> {
        OrderService { client: self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_id_from_ref() {
        let ordering = Ordering {
            reference: "/v4/orders/8123".to_string(),
        };
        assert_eq!(ordering.order_id().unwrap(), 8123);

        let ordering = Ordering {
            reference: "/v4/orders/".to_string(),
        };
        assert!(ordering.order_id().is_err());
    }

    #[test]
    fn test_order_states() {
        let mut order = Order::default();
        order.status.id = ORDER_STATUS_PROCESSING;
        assert!(!order.is_done());

        order.status.id = ORDER_STATUS_FAILED;
        assert!(order.is_done());
        assert!(!order.is_processed());
    }
}
