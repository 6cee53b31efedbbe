use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::config::{CoordinatorConfig, NetworkConfig};
use crate::util::errors::{PaxosError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    #[serde(default)]
    pub coordinator: CoordinatorConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    pub nodes: Vec<NodeInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeInfo {
    /// `host:port` of the acceptor
    pub address: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl ClusterConfig {
    /// Load cluster configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            PaxosError::InvalidConfig(format!("Failed to read config file: {}", e))
        })?;

        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: ClusterConfig = toml::from_str(contents).map_err(|e| {
            PaxosError::InvalidConfig(format!("Failed to parse config file: {}", e))
        })?;

        // Validate
        if config.nodes.is_empty() {
            return Err(PaxosError::InvalidConfig("No nodes configured".to_string()));
        }
        config
            .coordinator
            .validate()
            .and_then(|_| config.network.validate())
            .map_err(PaxosError::InvalidConfig)?;

        Ok(config)
    }

    /// Build a cluster from a plain address list with default coordinator settings
    pub fn from_addresses<I, S>(addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            coordinator: CoordinatorConfig::default(),
            network: NetworkConfig::default(),
            nodes: addresses
                .into_iter()
                .map(|address| NodeInfo {
                    address: address.into(),
                    enabled: true,
                })
                .collect(),
        }
    }

    /// Addresses of all enabled nodes, in configured order
    pub fn enabled_addresses(&self) -> Vec<String> {
        self.nodes
            .iter()
            .filter(|n| n.enabled)
            .map(|n| n.address.clone())
            .collect()
    }
}
