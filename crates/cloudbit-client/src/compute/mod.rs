//! Compute API: servers, networking, storage and load balancing

pub mod certificate;
pub mod elastic_ip;
pub mod image;
pub mod key_pair;
pub mod load_balancer;
pub mod network;
pub mod router;
pub mod security_group;
pub mod server;
pub mod snapshot;
pub mod volume;

pub use certificate::*;
pub use elastic_ip::*;
pub use image::*;
pub use key_pair::*;
pub use load_balancer::*;
pub use network::*;
pub use router::*;
pub use security_group::*;
pub use server::*;
pub use snapshot::*;
pub use volume::*;
