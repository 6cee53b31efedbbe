pub mod cluster_config;
pub mod config;

pub use cluster_config::{ClusterConfig, NodeInfo};
pub use config::{AcceptorConfig, CoordinatorConfig, NetworkConfig};
