//! `cloudbit_compute_image` data source

use crate::common::{encode_all, id_filter};
use crate::config::ClientHandle;
use crate::error::{ClientResultExt, ProviderError, Result};
use crate::filter;
use async_trait::async_trait;
use cloudbit_client::Image;
use cloudbit_plugin::{Attribute, DataSource, OperationContext, Schema, Value};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ImageModel {
    id: Option<i64>,
    os_type: Option<String>,
    os_version: Option<String>,
    key: Option<String>,
    category: Option<String>,
    #[serde(rename = "type")]
    image_type: Option<String>,
    min_root_disk_size: Option<i64>,
    username: Option<String>,
}

impl From<&Image> for ImageModel {
    fn from(image: &Image) -> Self {
        Self {
            id: Some(image.id),
            os_type: Some(image.os_type.clone()),
            os_version: Some(image.os_version.clone()),
            key: Some(image.key.clone()),
            category: Some(image.category.clone()),
            image_type: Some(image.image_type.clone()),
            min_root_disk_size: Some(image.min_root_disk_size),
            username: Some(image.username.clone()),
        }
    }
}

pub struct ImageDataSource {
    client: ClientHandle,
}

impl ImageDataSource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for ImageDataSource {
    type Error = ProviderError;

    fn type_name(&self) -> &str {
        "cloudbit_compute_image"
    }

    fn schema(&self) -> Schema {
        let string_filter = |name: &str, description: &str| {
            Attribute::string(name)
                .description(description)
                .optional()
                .computed()
        };

        Schema::new(vec![
            id_filter("image"),
            string_filter("os_type", "type of the operating system, e.g. `linux`"),
            string_filter("os_version", "version of the operating system"),
            string_filter("key", "unique key of the image, e.g. `linux-ubuntu-22.04-lts`"),
            string_filter("category", "category of the image"),
            string_filter("type", "type of the image"),
            Attribute::int64("min_root_disk_size")
                .description("minimal size of the boot volume in GiB")
                .computed(),
            Attribute::string("username")
                .description("name of the default user")
                .computed(),
        ])
        .description("Operating system image for servers.")
    }

    async fn read(&self, _ctx: &OperationContext, config: &Value) -> Result<Value> {
        let client = self.client.get().await?;
        let images = client.images().list().await.action("list images")?;

        let candidates = encode_all::<_, ImageModel>(&images)?;
        filter::find_one("image", &self.schema(), config, candidates)
    }
}
