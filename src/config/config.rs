use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::paxos::event_log::{DEFAULT_LOG_CAPACITY, DEFAULT_STATUS_LOG_LIMIT};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcceptorConfig {
    /// Identifier this node reports in its responses
    pub node_id: String,

    /// Address the acceptor listens on (e.g., "127.0.0.1:50051")
    pub listen_addr: String,

    /// Maximum number of retained log entries (e.g., 100)
    #[serde(default = "default_log_capacity")]
    pub log_capacity: usize,

    /// Maximum number of log entries returned by a status query (e.g., 20)
    #[serde(default = "default_status_log_limit")]
    pub status_log_limit: usize,
}

fn default_log_capacity() -> usize {
    DEFAULT_LOG_CAPACITY
}

fn default_status_log_limit() -> usize {
    DEFAULT_STATUS_LOG_LIMIT
}

impl AcceptorConfig {
    /// Config for a node listening on `listen_addr`, identified as `S<port>`
    pub fn for_listen_addr(listen_addr: &str) -> Self {
        let port = listen_addr.rsplit(':').next().unwrap_or(listen_addr);
        Self {
            node_id: format!("S{}", port),
            listen_addr: listen_addr.to_string(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.node_id.is_empty() {
            return Err("node_id cannot be empty".to_string());
        }

        if self.listen_addr.is_empty() {
            return Err("listen_addr cannot be empty".to_string());
        }

        if self.status_log_limit == 0 {
            return Err("status_log_limit must be positive".to_string());
        }

        if self.status_log_limit > self.log_capacity {
            return Err("status_log_limit cannot exceed log_capacity".to_string());
        }

        Ok(())
    }
}

impl Default for AcceptorConfig {
    fn default() -> Self {
        Self {
            node_id: "S50051".to_string(),
            listen_addr: "127.0.0.1:50051".to_string(),
            log_capacity: DEFAULT_LOG_CAPACITY,
            status_log_limit: DEFAULT_STATUS_LOG_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Deadline for connecting to a node and for each call (e.g., 1000)
    #[serde(default = "default_rpc_timeout_ms")]
    pub rpc_timeout_ms: u64,

    /// Grace period for closing connections at round end (e.g., 1000)
    #[serde(default = "default_close_grace_ms")]
    pub close_grace_ms: u64,

    /// Election numbers are drawn from [1, max_election_number]
    #[serde(default = "default_max_election_number")]
    pub max_election_number: i64,

    /// Proposed values are drawn from [0, max_proposed_value)
    #[serde(default = "default_max_proposed_value")]
    pub max_proposed_value: i64,
}

fn default_rpc_timeout_ms() -> u64 {
    1000
}

fn default_close_grace_ms() -> u64 {
    1000
}

fn default_max_election_number() -> i64 {
    100
}

fn default_max_proposed_value() -> i64 {
    100
}

impl CoordinatorConfig {
    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_timeout_ms)
    }

    pub fn close_grace(&self) -> Duration {
        Duration::from_millis(self.close_grace_ms)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.rpc_timeout_ms == 0 {
            return Err("rpc_timeout_ms must be positive".to_string());
        }

        if self.max_election_number < 1 {
            return Err("max_election_number must be at least 1".to_string());
        }

        if self.max_proposed_value < 1 {
            return Err("max_proposed_value must be at least 1".to_string());
        }

        Ok(())
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            rpc_timeout_ms: default_rpc_timeout_ms(),
            close_grace_ms: default_close_grace_ms(),
            max_election_number: default_max_election_number(),
            max_proposed_value: default_max_proposed_value(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Largest accepted frame in bytes
    #[serde(default = "default_max_frame_length")]
    pub max_frame_length: usize,
}

fn default_max_frame_length() -> usize {
    crate::network::codec::MAX_MESSAGE_SIZE
}

impl NetworkConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_frame_length == 0 {
            return Err("max_frame_length must be positive".to_string());
        }

        Ok(())
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            max_frame_length: default_max_frame_length(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configs_are_valid() {
        assert!(AcceptorConfig::default().validate().is_ok());
        assert!(CoordinatorConfig::default().validate().is_ok());
        assert!(NetworkConfig::default().validate().is_ok());
        assert!(NetworkConfig { max_frame_length: 0 }.validate().is_err());
    }

    #[test]
    fn test_node_id_from_port() {
        let config = AcceptorConfig::for_listen_addr("0.0.0.0:50052");
        assert_eq!(config.node_id, "S50052");
        assert_eq!(config.listen_addr, "0.0.0.0:50052");
        assert_eq!(config.log_capacity, 100);
        assert_eq!(config.status_log_limit, 20);
    }

    #[test]
    fn test_reject_status_limit_above_capacity() {
        let config = AcceptorConfig {
            log_capacity: 10,
            status_log_limit: 20,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reject_zero_timeout() {
        let config = CoordinatorConfig {
            rpc_timeout_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert_eq!(CoordinatorConfig::default().rpc_timeout(), Duration::from_secs(1));
    }
}
