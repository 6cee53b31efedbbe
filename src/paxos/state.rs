use rand::Rng;

use super::event_log::{EventLog, DEFAULT_LOG_CAPACITY, DEFAULT_STATUS_LOG_LIMIT};
use super::rpc::StatusResponse;
use super::types::{EventType, LogEntry, NodeId, ProposalNumber, Value, UNSET_VALUE};
use crate::config::AcceptorConfig;

/// Upper bound (exclusive) of the value a status read assigns to an unset node
const LAZY_VALUE_BOUND: Value = 100;

/// Complete state of one acceptor node
#[derive(Debug, Clone)]
pub struct AcceptorState {
    /// This node's ID
    pub node_id: NodeId,
    /// Highest election proposal number observed; never decreases
    pub highest_seen_proposal: ProposalNumber,
    /// Proposal number of the last accepted value
    pub accepted_proposal_number: ProposalNumber,
    /// Last accepted or committed value, `UNSET_VALUE` until one arrives
    pub current_value: Value,
    /// Whether this node currently believes it is the leader
    pub is_leader: bool,
    /// Number of log entries a status snapshot returns
    status_log_limit: usize,
    event_log: EventLog,
}

impl AcceptorState {
    pub fn new(node_id: NodeId) -> Self {
        Self::with_limits(node_id, DEFAULT_LOG_CAPACITY, DEFAULT_STATUS_LOG_LIMIT)
    }

    pub fn from_config(config: &AcceptorConfig) -> Self {
        Self::with_limits(
            config.node_id.clone(),
            config.log_capacity,
            config.status_log_limit,
        )
    }

    pub fn with_limits(node_id: NodeId, log_capacity: usize, status_log_limit: usize) -> Self {
        Self {
            node_id,
            highest_seen_proposal: 0,
            accepted_proposal_number: 0,
            current_value: UNSET_VALUE,
            is_leader: false,
            status_log_limit,
            event_log: EventLog::new(log_capacity),
        }
    }

    /// Record a state transition, snapshotting the accepted proposal and value
    pub fn log_event(&mut self, event_type: EventType, description: impl Into<String>) {
        let description = description.into();
        tracing::info!("[{}] {} {}", event_type, self.node_id, description);

        self.event_log.push(LogEntry::new(
            event_type,
            description,
            self.accepted_proposal_number,
            self.current_value,
        ));
    }

    pub fn set_leader(&mut self, is_leader: bool) {
        self.is_leader = is_leader;
        if is_leader {
            self.log_event(EventType::Leader, "This server is now the leader");
        }
    }

    /// Give an unset node a pseudo-random value in [0, 100).
    ///
    /// Reading status has this side effect on purpose: a node that has never
    /// accepted anything reports a random opinion instead of `-1`. Returns
    /// true if the value was assigned by this call.
    pub fn ensure_initialized<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        if self.current_value != UNSET_VALUE {
            return false;
        }

        self.current_value = rng.gen_range(0..LAZY_VALUE_BOUND);
        tracing::debug!(
            "Node {} lazily initialized value to {}",
            self.node_id,
            self.current_value
        );
        true
    }

    /// Build a status snapshot. Callers run `ensure_initialized` first.
    pub fn status(&self) -> StatusResponse {
        StatusResponse {
            server_id: self.node_id.clone(),
            current_proposal: self.accepted_proposal_number,
            is_leader: self.is_leader,
            current_value: self.current_value,
            log_entries: self.event_log.recent(self.status_log_limit),
        }
    }

    pub fn event_log(&self) -> &EventLog {
        &self.event_log
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_initial_state() {
        let state = AcceptorState::new("S50051".to_string());
        assert_eq!(state.highest_seen_proposal, 0);
        assert_eq!(state.accepted_proposal_number, 0);
        assert_eq!(state.current_value, UNSET_VALUE);
        assert!(!state.is_leader);
        assert!(state.event_log().is_empty());
    }

    #[test]
    fn test_ensure_initialized_only_once() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut state = AcceptorState::new("S50051".to_string());

        assert!(state.ensure_initialized(&mut rng));
        let value = state.current_value;
        assert!((0..100).contains(&value));

        assert!(!state.ensure_initialized(&mut rng));
        assert_eq!(state.current_value, value);
    }

    #[test]
    fn test_set_leader_logs_only_when_elected() {
        let mut state = AcceptorState::new("S50051".to_string());

        state.set_leader(false);
        assert!(state.event_log().is_empty());

        state.set_leader(true);
        assert!(state.is_leader);
        let entries = state.status().log_entries;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].event_type, EventType::Leader);
    }

    #[test]
    fn test_log_snapshots_state() {
        let mut state = AcceptorState::new("S50051".to_string());
        state.accepted_proposal_number = 12;
        state.current_value = 34;
        state.log_event(EventType::Commit, "snapshot");

        let entry = &state.status().log_entries[0];
        assert_eq!(entry.proposal_number, 12);
        assert_eq!(entry.value, 34);
        assert_eq!(entry.description, "snapshot");
    }

    #[test]
    fn test_status_respects_limit() {
        let mut state = AcceptorState::with_limits("S1".to_string(), 10, 3);
        for n in 0..8 {
            state.log_event(EventType::Ack, format!("ack {}", n));
        }
        assert_eq!(state.event_log().len(), 8);
        assert_eq!(state.status().log_entries.len(), 3);
        assert_eq!(state.status().log_entries[0].description, "ack 7");
    }
}
