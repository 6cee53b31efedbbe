use serde::{Deserialize, Serialize};

use super::rpc::{ProposeLeaderRequest, ProposeLeaderResponse};
use super::state::AcceptorState;
use super::types::{EventType, NodeId, ProposalNumber};

/// Handle incoming ProposeLeader RPC
pub fn handle_propose_leader(
    state: &mut AcceptorState,
    request: ProposeLeaderRequest,
) -> ProposeLeaderResponse {
    state.log_event(
        EventType::Election,
        format!(
            "Received leader proposal {} from {}",
            request.proposal_number, request.server_id
        ),
    );

    // Strictly greater: an equal number does not win the election
    let accepted = request.proposal_number > state.highest_seen_proposal;
    if accepted {
        state.highest_seen_proposal = request.proposal_number;
    }

    state.log_event(
        EventType::Election,
        format!(
            "Responded to leader proposal: {} (highest={})",
            if accepted { "ACCEPTED" } else { "REJECTED" },
            state.highest_seen_proposal
        ),
    );

    ProposeLeaderResponse {
        accepted,
        highest_seen: state.highest_seen_proposal,
        acceptor_id: state.node_id.clone(),
    }
}

/// A node's self-assigned election number, as delivered in phase 1
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionProposal {
    pub node: NodeId,
    pub proposal_number: ProposalNumber,
}

/// Outcome of the election reduction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderElection {
    pub leader: NodeId,
    pub proposal_number: ProposalNumber,
    /// Every other node and whether it accepts the leader
    pub acknowledgements: Vec<(NodeId, bool)>,
}

/// Pick the leader by maximum proposal number.
///
/// This is a reduction over the collected proposals, not a vote: the first
/// node holding the maximal number wins and ties go to iteration order.
/// Returns `None` when no proposal was delivered.
pub fn select_leader(proposals: &[ElectionProposal]) -> Option<LeaderElection> {
    let mut winner: Option<&ElectionProposal> = None;
    for proposal in proposals {
        match winner {
            Some(best) if proposal.proposal_number <= best.proposal_number => {}
            _ => winner = Some(proposal),
        }
    }

    let winner = winner?;
    let acknowledgements = proposals
        .iter()
        .filter(|p| p.node != winner.node)
        .map(|p| (p.node.clone(), p.proposal_number <= winner.proposal_number))
        .collect();

    Some(LeaderElection {
        leader: winner.node.clone(),
        proposal_number: winner.proposal_number,
        acknowledgements,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(proposal_number: ProposalNumber) -> ProposeLeaderRequest {
        ProposeLeaderRequest {
            proposal_number,
            server_id: "node-2".to_string(),
        }
    }

    fn proposal(node: &str, proposal_number: ProposalNumber) -> ElectionProposal {
        ElectionProposal {
            node: node.to_string(),
            proposal_number,
        }
    }

    #[test]
    fn test_accept_higher_proposal() {
        let mut state = AcceptorState::new("node-1".to_string());

        let response = handle_propose_leader(&mut state, request(5));

        assert!(response.accepted);
        assert_eq!(response.highest_seen, 5);
        assert_eq!(response.acceptor_id, "node-1");
        assert_eq!(state.highest_seen_proposal, 5);
    }

    #[test]
    fn test_reject_equal_or_lower_proposal() {
        let mut state = AcceptorState::new("node-1".to_string());
        handle_propose_leader(&mut state, request(40));

        for p in [40, 39, 0, -3] {
            let response = handle_propose_leader(&mut state, request(p));
            assert!(!response.accepted, "proposal {} should be rejected", p);
            assert_eq!(response.highest_seen, 40);
        }
        assert_eq!(state.highest_seen_proposal, 40);
    }

    #[test]
    fn test_monotonic_highest_seen() {
        let mut state = AcceptorState::new("node-1".to_string());
        let mut highest = 0;
        for p in [3, 9, 2, 9, 15, 1, 14] {
            let response = handle_propose_leader(&mut state, request(p));
            assert_eq!(response.accepted, p > highest);
            highest = highest.max(p);
            assert_eq!(state.highest_seen_proposal, highest);
        }
    }

    #[test]
    fn test_election_logs_received_and_response() {
        let mut state = AcceptorState::new("node-1".to_string());
        handle_propose_leader(&mut state, request(5));

        let entries = state.status().log_entries;
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.event_type == EventType::Election));
        assert!(entries[0].description.contains("ACCEPTED"));
        assert!(entries[1].description.contains("Received leader proposal 5"));
    }

    #[test]
    fn test_select_leader_by_maximum() {
        let proposals = vec![
            proposal("node-1", 42),
            proposal("node-2", 17),
            proposal("node-3", 88),
        ];

        let election = select_leader(&proposals).unwrap();
        assert_eq!(election.leader, "node-3");
        assert_eq!(election.proposal_number, 88);
        assert_eq!(
            election.acknowledgements,
            vec![("node-1".to_string(), true), ("node-2".to_string(), true)]
        );
    }

    #[test]
    fn test_select_leader_tie_goes_to_first() {
        let proposals = vec![
            proposal("node-1", 10),
            proposal("node-2", 70),
            proposal("node-3", 70),
        ];

        let election = select_leader(&proposals).unwrap();
        assert_eq!(election.leader, "node-2");
        assert!(election.acknowledgements.iter().all(|(_, accepts)| *accepts));
    }

    #[test]
    fn test_select_leader_empty() {
        assert!(select_leader(&[]).is_none());
    }

    #[test]
    fn test_select_leader_single_node() {
        let election = select_leader(&[proposal("node-1", 1)]).unwrap();
        assert_eq!(election.leader, "node-1");
        assert!(election.acknowledgements.is_empty());
    }
}
