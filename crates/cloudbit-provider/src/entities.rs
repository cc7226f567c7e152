//! Data sources for shared entities: locations, modules and products

use crate::common::{encode_all, id_filter};
use crate::config::ClientHandle;
use crate::error::{ClientResultExt, ProviderError, Result};
use crate::filter;
use async_trait::async_trait;
use cloudbit_client::{Location, Module, Product};
use cloudbit_plugin::{Attribute, AttributeType, DataSource, OperationContext, Schema, Value};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn data_sources(client: &ClientHandle) -> Vec<Arc<dyn DataSource<Error = ProviderError>>> {
    vec![
        Arc::new(LocationDataSource::new(client.clone())),
        Arc::new(ModuleDataSource::new(client.clone())),
        Arc::new(ProductDataSource::new(client.clone())),
    ]
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LocationModel {
    id: i64,
    name: String,
    key: String,
    city: String,
}

impl From<&Location> for LocationModel {
    fn from(location: &Location) -> Self {
        Self {
            id: location.id,
            name: location.name.clone(),
            key: location.key.clone(),
            city: location.city.clone(),
        }
    }
}

pub struct LocationDataSource {
    client: ClientHandle,
}

impl LocationDataSource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for LocationDataSource {
    type Error = ProviderError;

    fn type_name(&self) -> &str {
        "cloudbit_location"
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![
            id_filter("location"),
            Attribute::string("name")
                .description("name of the location")
                .optional()
                .computed(),
            Attribute::string("key")
                .description("short key of the location, e.g. `LUC1`")
                .optional()
                .computed(),
            Attribute::string("city")
                .description("city the data center is located in")
                .optional()
                .computed(),
        ])
        .description("Data center location.")
    }

    async fn read(&self, _ctx: &OperationContext, config: &Value) -> Result<Value> {
        let client = self.client.get().await?;
        let locations = client.locations().list().await.action("list locations")?;

        let candidates = encode_all::<_, LocationModel>(&locations)?;
        filter::find_one("location", &self.schema(), config, candidates)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ModuleModel {
    id: i64,
    name: String,
    parent_id: Option<i64>,
    location_ids: Vec<i64>,
}

impl From<&Module> for ModuleModel {
    fn from(module: &Module) -> Self {
        Self {
            id: module.id,
            name: module.name.clone(),
            parent_id: module.parent.as_ref().map(|p| p.id),
            location_ids: module.locations.iter().map(|l| l.id).collect(),
        }
    }
}

pub struct ModuleDataSource {
    client: ClientHandle,
}

impl ModuleDataSource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for ModuleDataSource {
    type Error = ProviderError;

    fn type_name(&self) -> &str {
        "cloudbit_module"
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![
            id_filter("module"),
            Attribute::string("name")
                .description("name of the module")
                .optional()
                .computed(),
            Attribute::int64("parent_id")
                .description("parent module")
                .optional()
                .computed(),
            Attribute::list("location_ids", AttributeType::Int64)
                .description("locations the module is available in")
                .computed(),
        ])
        .description("Product module such as compute or Kubernetes.")
    }

    async fn read(&self, _ctx: &OperationContext, config: &Value) -> Result<Value> {
        let client = self.client.get().await?;
        let modules = client.modules().list().await.action("list modules")?;

        let candidates = encode_all::<_, ModuleModel>(&modules)?;
        filter::find_one("module", &self.schema(), config, candidates)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ProductModel {
    id: i64,
    name: String,
    #[serde(rename = "type")]
    product_type: String,
    visibility: String,
    usage_cycle: String,
    price: f64,
    location_ids: Vec<i64>,
}

impl From<&Product> for ProductModel {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            product_type: product.product_type.key.clone(),
            visibility: product.visibility.clone(),
            usage_cycle: product.usage_cycle.name.clone(),
            price: product.price,
            location_ids: product
                .availability
                .iter()
                .filter(|a| product.available_at(a.location.id))
                .map(|a| a.location.id)
                .collect(),
        }
    }
}

pub struct ProductDataSource {
    client: ClientHandle,
}

impl ProductDataSource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for ProductDataSource {
    type Error = ProviderError;

    fn type_name(&self) -> &str {
        "cloudbit_product"
    }

    fn schema(&self) -> Schema {
        Schema::new(vec![
            id_filter("product"),
            Attribute::string("name")
                .description("name of the product, e.g. `b1.2x4`")
                .optional()
                .computed(),
            Attribute::string("type")
                .description("key of the product type, e.g. `compute-engine-vm`")
                .optional()
                .computed(),
            Attribute::string("visibility")
                .description("visibility of the product")
                .computed(),
            Attribute::string("usage_cycle")
                .description("billing cycle of the product")
                .computed(),
            Attribute::number("price")
                .description("price per usage cycle")
                .computed(),
            Attribute::list("location_ids", AttributeType::Int64)
                .description("locations the product can currently be ordered in")
                .computed(),
        ])
        .description("Orderable product.")
    }

    async fn read(&self, _ctx: &OperationContext, config: &Value) -> Result<Value> {
        let client = self.client.get().await?;
        let products = client.products().list().await.action("list products")?;

        let candidates = encode_all::<_, ProductModel>(&products)?;
        filter::find_one("product", &self.schema(), config, candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudbit_client::{Kind, ProductAvailability, Reference};

    #[test]
    fn test_module_model() {
        let module = Module {
            id: 4,
            name: "Kubernetes".to_string(),
            parent: Some(Reference {
                id: 1,
                name: "Compute".to_string(),
            }),
            locations: vec![Location {
                id: 1,
                ..Location::default()
            }],
        };

        let model = ModuleModel::from(&module);
        assert_eq!(model.parent_id, Some(1));
        assert_eq!(model.location_ids, vec![1]);
    }

    #[test]
    fn test_product_model_lists_available_locations() {
        let product = Product {
            id: 44,
            name: "b1.2x4".to_string(),
            product_type: Kind {
                id: 1,
                name: "Compute Engine".to_string(),
                key: "compute-engine-vm".to_string(),
            },
            availability: vec![
                ProductAvailability {
                    location: Location {
                        id: 1,
                        ..Location::default()
                    },
                    available: 4,
                },
                ProductAvailability {
                    location: Location {
                        id: 2,
                        ..Location::default()
                    },
                    available: 0,
                },
            ],
            ..Product::default()
        };

        let value = Value::encode(&ProductModel::from(&product)).unwrap();
        assert_eq!(value.attr("type").as_str(), Some("compute-engine-vm"));
        assert_eq!(
            value.attr("location_ids"),
            &Value::List(vec![Value::from(1)])
        );
    }
}
