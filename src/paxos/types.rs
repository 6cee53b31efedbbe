use serde::{Deserialize, Serialize};

/// Node identifier (the node's address, e.g. `host:port`)
pub type NodeId = String;

/// Type alias for election and value proposal numbers
pub type ProposalNumber = i64;

/// Type alias for the value nodes agree on
pub type Value = i64;

/// Marker for "no value accepted yet"
pub const UNSET_VALUE: Value = -1;

/// Kind of state transition recorded in an acceptor's event log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    Election,
    Proposal,
    Ack,
    Commit,
    Leader,
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventType::Election => write!(f, "ELECTION"),
            EventType::Proposal => write!(f, "PROPOSAL"),
            EventType::Ack => write!(f, "ACK"),
            EventType::Commit => write!(f, "COMMIT"),
            EventType::Leader => write!(f, "LEADER"),
        }
    }
}

/// A single entry in an acceptor's event log
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogEntry {
    /// Wall clock time of the event, `HH:MM:SS.mmm`
    pub timestamp: String,
    pub event_type: EventType,
    pub description: String,
    /// Accepted proposal number at the time of the event
    pub proposal_number: ProposalNumber,
    /// Current value at the time of the event
    pub value: Value,
}

impl LogEntry {
    pub fn new(
        event_type: EventType,
        description: String,
        proposal_number: ProposalNumber,
        value: Value,
    ) -> Self {
        Self {
            timestamp: chrono::Local::now().format("%H:%M:%S%.3f").to_string(),
            event_type,
            description,
            proposal_number,
            value,
        }
    }
}
