//! Compute resources and data sources

pub mod certificate;
pub mod elastic_ip;
pub mod image;
pub mod key_pair;
pub mod load_balancer;
pub mod network;
pub mod network_interface;
pub mod router;
pub mod security_group;
pub mod server;
pub mod snapshot;
pub mod volume;

use crate::config::ClientHandle;
use crate::error::ProviderError;
use cloudbit_plugin::{DataSource, Resource};
use std::sync::Arc;

pub fn resources(client: &ClientHandle) -> Vec<Arc<dyn Resource<Error = ProviderError>>> {
    vec![
        Arc::new(certificate::CertificateResource::new(client.clone())),
        Arc::new(elastic_ip::ElasticIpResource::new(client.clone())),
        Arc::new(elastic_ip::ElasticIpServerAttachmentResource::new(client.clone())),
        Arc::new(key_pair::KeyPairResource::new(client.clone())),
        Arc::new(load_balancer::LoadBalancerResource::new(client.clone())),
        Arc::new(load_balancer::LoadBalancerPoolResource::new(client.clone())),
        Arc::new(load_balancer::LoadBalancerMemberResource::new(client.clone())),
        Arc::new(network::NetworkResource::new(client.clone())),
        Arc::new(network_interface::NetworkInterfaceResource::new(client.clone())),
        Arc::new(router::RouterResource::new(client.clone())),
        Arc::new(router::RouterInterfaceResource::new(client.clone())),
        Arc::new(router::RouteResource::new(client.clone())),
        Arc::new(security_group::SecurityGroupResource::new(client.clone())),
        Arc::new(security_group::SecurityGroupRuleResource::new(client.clone())),
        Arc::new(server::ServerResource::new(client.clone())),
        Arc::new(snapshot::SnapshotResource::new(client.clone())),
        Arc::new(volume::VolumeResource::new(client.clone())),
        Arc::new(volume::VolumeAttachmentResource::new(client.clone())),
    ]
}

pub fn data_sources(client: &ClientHandle) -> Vec<Arc<dyn DataSource<Error = ProviderError>>> {
    vec![
        Arc::new(certificate::CertificateDataSource::new(client.clone())),
        Arc::new(elastic_ip::ElasticIpDataSource::new(client.clone())),
        Arc::new(image::ImageDataSource::new(client.clone())),
        Arc::new(key_pair::KeyPairDataSource::new(client.clone())),
        Arc::new(load_balancer::LoadBalancerKindDataSource::algorithm(client.clone())),
        Arc::new(load_balancer::LoadBalancerKindDataSource::health_check_type(client.clone())),
        Arc::new(load_balancer::LoadBalancerMemberDataSource::new(client.clone())),
        Arc::new(load_balancer::LoadBalancerPoolDataSource::new(client.clone())),
        Arc::new(load_balancer::LoadBalancerKindDataSource::protocol(client.clone())),
        Arc::new(network::NetworkDataSource::new(client.clone())),
        Arc::new(network_interface::NetworkInterfaceDataSource::new(client.clone())),
        Arc::new(router::RouterDataSource::new(client.clone())),
        Arc::new(router::RouterInterfaceDataSource::new(client.clone())),
        Arc::new(router::RouteDataSource::new(client.clone())),
        Arc::new(security_group::SecurityGroupDataSource::new(client.clone())),
        Arc::new(security_group::SecurityGroupRuleDataSource::new(client.clone())),
        Arc::new(server::ServerDataSource::new(client.clone())),
        Arc::new(snapshot::SnapshotDataSource::new(client.clone())),
        Arc::new(volume::VolumeDataSource::new(client.clone())),
    ]
}
