//! Managed Kubernetes

pub mod cluster;
pub mod kube_config;

use crate::config::ClientHandle;
use crate::error::ProviderError;
use cloudbit_plugin::{DataSource, Resource};
use std::sync::Arc;

pub fn resources(client: &ClientHandle) -> Vec<Arc<dyn Resource<Error = ProviderError>>> {
    vec![Arc::new(cluster::ClusterResource::new(client.clone()))]
}

pub fn data_sources(client: &ClientHandle) -> Vec<Arc<dyn DataSource<Error = ProviderError>>> {
    vec![
        Arc::new(cluster::ClusterDataSource::new(client.clone())),
        Arc::new(kube_config::KubeConfigDataSource::new(client.clone())),
    ]
}
