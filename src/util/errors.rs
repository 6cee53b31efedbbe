use std::io;

use crate::paxos::types::NodeId;

#[derive(Debug)]
pub enum PaxosError {
    /// Connect failure, I/O failure or missed deadline while talking to a node
    NodeUnreachable { node: NodeId, reason: String },
    NetworkError(String),
    SerializationError(String),
    IoError(io::Error),
    InvalidConfig(String),
    /// The in-process actor could not be reached
    MailboxError(String),
    UnexpectedResponse(String),
}

impl PaxosError {
    pub fn unreachable(node: &NodeId, reason: impl Into<String>) -> Self {
        PaxosError::NodeUnreachable {
            node: node.clone(),
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for PaxosError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaxosError::NodeUnreachable { node, reason } => {
                write!(f, "Node {} unreachable: {}", node, reason)
            }
            PaxosError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            PaxosError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            PaxosError::IoError(err) => write!(f, "IO error: {}", err),
            PaxosError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            PaxosError::MailboxError(msg) => write!(f, "Mailbox error: {}", msg),
            PaxosError::UnexpectedResponse(msg) => write!(f, "Unexpected response: {}", msg),
        }
    }
}

impl std::error::Error for PaxosError {}

impl From<io::Error> for PaxosError {
    fn from(err: io::Error) -> Self {
        PaxosError::IoError(err)
    }
}

impl From<bincode::Error> for PaxosError {
    fn from(err: bincode::Error) -> Self {
        PaxosError::SerializationError(err.to_string())
    }
}

impl From<actix::MailboxError> for PaxosError {
    fn from(err: actix::MailboxError) -> Self {
        PaxosError::MailboxError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PaxosError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreachable_display_names_node() {
        let err = PaxosError::unreachable(&"127.0.0.1:50051".to_string(), "deadline exceeded");
        assert_eq!(
            err.to_string(),
            "Node 127.0.0.1:50051 unreachable: deadline exceeded"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let err: PaxosError = io::Error::new(io::ErrorKind::ConnectionRefused, "refused").into();
        assert!(matches!(err, PaxosError::IoError(_)));
    }
}
