use serde::{Deserialize, Serialize};

use super::rpc::{
    AcknowledgeProposalRequest, AcknowledgeProposalResponse, ProposeValueRequest,
    ProposeValueResponse,
};
use super::state::AcceptorState;
use super::types::{EventType, ProposalNumber, Value};

/// Handle incoming ProposeValue RPC
pub fn handle_propose_value(
    state: &mut AcceptorState,
    request: ProposeValueRequest,
) -> ProposeValueResponse {
    state.log_event(
        EventType::Proposal,
        format!(
            "Received value proposal {} (prop #{}) from leader {}",
            request.proposed_value, request.proposal_number, request.leader_id
        ),
    );

    // Inclusive, unlike the election comparison: the leader proposes with the
    // same number it was elected with
    let accepted = request.proposal_number >= state.highest_seen_proposal;

    if accepted {
        state.accepted_proposal_number = request.proposal_number;
        state.current_value = request.proposed_value;
        state.log_event(
            EventType::Proposal,
            format!("Accepted value {}", request.proposed_value),
        );
    } else {
        tracing::debug!(
            "Node {} rejected proposal #{} - highest seen is {}",
            state.node_id,
            request.proposal_number,
            state.highest_seen_proposal
        );
        state.log_event(
            EventType::Proposal,
            "Rejected value (proposal number too low)",
        );
    }

    ProposeValueResponse {
        accepted,
        proposal_number: state.accepted_proposal_number,
        acceptor_id: state.node_id.clone(),
    }
}

/// Handle incoming AcknowledgeProposal RPC. Only the log is touched.
pub fn handle_acknowledge_proposal(
    state: &mut AcceptorState,
    request: AcknowledgeProposalRequest,
) -> AcknowledgeProposalResponse {
    state.log_event(
        EventType::Ack,
        format!(
            "Received {} acknowledgment for proposal {} from {}",
            if request.accepted { "positive" } else { "negative" },
            request.proposal_number,
            request.acceptor_id
        ),
    );

    AcknowledgeProposalResponse { received: true }
}

/// Acceptances needed among `participants` nodes: `floor(n/2)`
pub fn quorum_threshold(participants: usize) -> usize {
    participants / 2
}

/// Running count of the proposal phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalTally {
    pub proposal_number: ProposalNumber,
    pub proposed_value: Value,
    /// Nodes that accepted, the leader included
    pub accepted: usize,
    /// Nodes visible in this phase, the leader included
    pub participants: usize,
}

impl ProposalTally {
    /// Start a tally; the leader always accepts its own value
    pub fn new(proposal_number: ProposalNumber, proposed_value: Value) -> Self {
        Self {
            proposal_number,
            proposed_value,
            accepted: 1,
            participants: 1,
        }
    }

    pub fn record(&mut self, accepted: bool) {
        self.participants += 1;
        if accepted {
            self.accepted += 1;
        }
    }

    pub fn required(&self) -> usize {
        quorum_threshold(self.participants)
    }

    pub fn has_quorum(&self) -> bool {
        self.accepted >= self.required()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paxos::election::handle_propose_leader;
    use crate::paxos::rpc::ProposeLeaderRequest;

    fn propose(state: &mut AcceptorState, p: ProposalNumber, v: Value) -> ProposeValueResponse {
        handle_propose_value(
            state,
            ProposeValueRequest {
                proposal_number: p,
                proposed_value: v,
                leader_id: "leader".to_string(),
            },
        )
    }

    fn elect(state: &mut AcceptorState, p: ProposalNumber) {
        handle_propose_leader(
            state,
            ProposeLeaderRequest {
                proposal_number: p,
                server_id: "leader".to_string(),
            },
        );
    }

    #[test]
    fn test_accept_at_or_above_highest_seen() {
        for p in [30, 31, 99] {
            let mut state = AcceptorState::new("node-1".to_string());
            elect(&mut state, 30);

            let response = propose(&mut state, p, 55);

            assert!(response.accepted);
            assert_eq!(response.proposal_number, p);
            let status = state.status();
            assert_eq!(status.current_value, 55);
            assert_eq!(status.current_proposal, p);
        }
    }

    #[test]
    fn test_reject_below_highest_seen() {
        let mut state = AcceptorState::new("node-1".to_string());
        elect(&mut state, 30);
        propose(&mut state, 30, 10);

        let response = propose(&mut state, 29, 77);

        assert!(!response.accepted);
        // Reports its own bookkeeping, not the rejected number
        assert_eq!(response.proposal_number, 30);
        assert_eq!(state.current_value, 10);
    }

    #[test]
    fn test_accepted_number_never_exceeds_highest_seen_after_election() {
        let mut state = AcceptorState::new("node-1".to_string());
        elect(&mut state, 50);
        propose(&mut state, 10, 1);
        propose(&mut state, 50, 2);
        assert!(state.accepted_proposal_number <= state.highest_seen_proposal);
        assert_eq!(state.current_value, 2);
    }

    #[test]
    fn test_acknowledge_only_logs() {
        let mut state = AcceptorState::new("node-1".to_string());
        let response = handle_acknowledge_proposal(
            &mut state,
            AcknowledgeProposalRequest {
                proposal_number: 4,
                accepted: false,
                acceptor_id: "node-2".to_string(),
            },
        );

        assert!(response.received);
        assert_eq!(state.highest_seen_proposal, 0);
        assert_eq!(state.current_value, -1);
        let entries = state.status().log_entries;
        assert_eq!(entries[0].event_type, EventType::Ack);
        assert!(entries[0].description.contains("negative"));
    }

    #[test]
    fn test_quorum_threshold() {
        assert_eq!(quorum_threshold(1), 0);
        assert_eq!(quorum_threshold(2), 1);
        assert_eq!(quorum_threshold(3), 1);
        assert_eq!(quorum_threshold(4), 2);
        assert_eq!(quorum_threshold(5), 2);
    }

    #[test]
    fn test_tally_counts_leader() {
        let mut tally = ProposalTally::new(88, 55);
        tally.record(true);
        tally.record(true);
        assert_eq!(tally.accepted, 3);
        assert_eq!(tally.participants, 3);
        assert!(tally.has_quorum());
    }

    #[test]
    fn test_tally_without_quorum() {
        let mut tally = ProposalTally::new(88, 55);
        tally.record(false);
        tally.record(false);
        tally.record(false);
        assert_eq!(tally.required(), 2);
        assert!(!tally.has_quorum());
    }
}
