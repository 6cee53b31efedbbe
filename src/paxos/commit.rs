use super::rpc::{CommitValueRequest, CommitValueResponse};
use super::state::AcceptorState;
use super::types::EventType;

/// Handle incoming CommitValue RPC.
///
/// The commit is not checked against any proposal number: whatever value the
/// leader sends overwrites the current one and the call always succeeds.
pub fn handle_commit_value(
    state: &mut AcceptorState,
    request: CommitValueRequest,
) -> CommitValueResponse {
    state.log_event(
        EventType::Commit,
        format!(
            "Received commit for value {} (prop #{}) from leader {}",
            request.value, request.proposal_number, request.leader_id
        ),
    );

    state.current_value = request.value;

    state.log_event(
        EventType::Commit,
        format!("Committed value {} to local state", request.value),
    );

    CommitValueResponse {
        success: true,
        server_id: state.node_id.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paxos::proposal::handle_propose_value;
    use crate::paxos::rpc::ProposeValueRequest;

    fn commit(state: &mut AcceptorState, value: i64) -> CommitValueResponse {
        handle_commit_value(
            state,
            CommitValueRequest {
                proposal_number: 1,
                value,
                leader_id: "leader".to_string(),
            },
        )
    }

    #[test]
    fn test_commit_always_succeeds() {
        let mut state = AcceptorState::new("node-1".to_string());

        let response = commit(&mut state, 42);

        assert!(response.success);
        assert_eq!(response.server_id, "node-1");
        assert_eq!(state.current_value, 42);
    }

    #[test]
    fn test_commit_overwrites_accepted_value() {
        let mut state = AcceptorState::new("node-1".to_string());
        state.highest_seen_proposal = 90;
        handle_propose_value(
            &mut state,
            ProposeValueRequest {
                proposal_number: 90,
                proposed_value: 7,
                leader_id: "leader".to_string(),
            },
        );

        // Stale proposal number, still applied
        let response = commit(&mut state, 13);

        assert!(response.success);
        assert_eq!(state.current_value, 13);
        assert_eq!(state.accepted_proposal_number, 90);
    }

    #[test]
    fn test_commit_logs_before_and_after() {
        let mut state = AcceptorState::new("node-1".to_string());
        commit(&mut state, 5);

        let entries = state.status().log_entries;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].value, 5);
        assert_eq!(entries[1].value, -1);
        assert!(entries.iter().all(|e| e.event_type == EventType::Commit));
    }
}
