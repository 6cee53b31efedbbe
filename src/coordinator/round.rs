use serde::{Deserialize, Serialize};

use crate::paxos::proposal::ProposalTally;
use crate::paxos::types::{NodeId, ProposalNumber, Value};

/// Conditions that end a round without a consensus value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundFailure {
    /// No node delivered an election proposal
    NoLeaderFound,
    /// The proposal phase did not reach `floor(n/2)` acceptances
    NoQuorum {
        accepted: usize,
        required: usize,
        participants: usize,
    },
    /// `stop()` was observed between phases
    Stopped,
    /// Another round was in progress on the same coordinator
    AlreadyRunning,
}

impl std::fmt::Display for RoundFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoundFailure::NoLeaderFound => write!(f, "No leader found"),
            RoundFailure::NoQuorum {
                accepted,
                required,
                participants,
            } => write!(
                f,
                "No quorum: {}/{} accepted, {} required",
                accepted, participants, required
            ),
            RoundFailure::Stopped => write!(f, "Round stopped"),
            RoundFailure::AlreadyRunning => write!(f, "A round is already running"),
        }
    }
}

/// Result of a single phase. There are no retries: a failure ends the round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseOutcome<T> {
    Success(T),
    Failure(RoundFailure),
}

/// A value the proposal phase got a majority for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptedProposal {
    pub leader: NodeId,
    pub tally: ProposalTally,
}

/// What happened to one node during the round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeOutcome {
    pub node: NodeId,
    /// Answered the availability probe
    pub reachable: bool,
    pub is_leader: bool,
    /// Self-assigned election number, if the ProposeLeader call went through
    pub election_number: Option<ProposalNumber>,
    /// Whether this node accepts the elected leader (non-leaders only)
    pub accepts_leader: Option<bool>,
    /// The acceptor's answer to ProposeValue
    pub value_accepted: Option<bool>,
    pub committed: Option<bool>,
    /// Per-phase errors that excluded the node
    pub errors: Vec<String>,
}

impl NodeOutcome {
    pub fn new(node: NodeId) -> Self {
        Self {
            node,
            reachable: false,
            is_leader: false,
            election_number: None,
            accepts_leader: None,
            value_accepted: None,
            committed: None,
            errors: Vec::new(),
        }
    }
}

/// Final result of `run_consensus_round`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundReport {
    pub leader_id: Option<NodeId>,
    pub consensus_value: Option<Value>,
    pub succeeded: bool,
    pub failure: Option<RoundFailure>,
    /// One entry per configured node, in configured order
    pub outcomes: Vec<NodeOutcome>,
    /// Nodes whose commit failed; they may hold an older value
    pub commit_failures: Vec<NodeId>,
}

impl RoundReport {
    pub fn success(
        leader_id: NodeId,
        consensus_value: Value,
        outcomes: Vec<NodeOutcome>,
        commit_failures: Vec<NodeId>,
    ) -> Self {
        Self {
            leader_id: Some(leader_id),
            consensus_value: Some(consensus_value),
            succeeded: true,
            failure: None,
            outcomes,
            commit_failures,
        }
    }

    pub fn failed(
        failure: RoundFailure,
        leader_id: Option<NodeId>,
        outcomes: Vec<NodeOutcome>,
    ) -> Self {
        Self {
            leader_id,
            consensus_value: None,
            succeeded: false,
            failure: Some(failure),
            outcomes,
            commit_failures: Vec::new(),
        }
    }

    /// Some but not all commit calls failed
    pub fn is_partial_commit(&self) -> bool {
        self.succeeded
            && !self.commit_failures.is_empty()
            && self.outcomes.iter().any(|o| o.committed == Some(true))
    }

    pub fn outcome(&self, node: &str) -> Option<&NodeOutcome> {
        self.outcomes.iter().find(|o| o.node == node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn committed(node: &str, committed: bool) -> NodeOutcome {
        let mut outcome = NodeOutcome::new(node.to_string());
        outcome.reachable = true;
        outcome.committed = Some(committed);
        outcome
    }

    #[test]
    fn test_partial_commit_only_on_success() {
        let report = RoundReport::success(
            "n3".to_string(),
            55,
            vec![committed("n1", true), committed("n2", false)],
            vec!["n2".to_string()],
        );
        assert!(report.is_partial_commit());

        let clean = RoundReport::success(
            "n3".to_string(),
            55,
            vec![committed("n1", true), committed("n2", true)],
            Vec::new(),
        );
        assert!(!clean.is_partial_commit());

        let failed = RoundReport::failed(RoundFailure::NoLeaderFound, None, Vec::new());
        assert!(!failed.is_partial_commit());
        assert_eq!(failed.consensus_value, None);
    }

    #[test]
    fn test_report_serializes_to_json() {
        let mut outcome = NodeOutcome::new("n1".to_string());
        outcome.reachable = true;
        outcome.election_number = Some(42);
        let report = RoundReport::failed(
            RoundFailure::NoQuorum {
                accepted: 1,
                required: 2,
                participants: 4,
            },
            Some("n4".to_string()),
            vec![outcome],
        );

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["leader_id"], "n4");
        assert_eq!(json["succeeded"], false);
        assert_eq!(json["failure"]["NoQuorum"]["required"], 2);
        assert_eq!(json["outcomes"][0]["election_number"], 42);

        let parsed: RoundReport = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, report);
    }

    #[test]
    fn test_every_commit_failing_is_not_partial() {
        let report = RoundReport::success(
            "n3".to_string(),
            55,
            vec![committed("n1", false), committed("n2", false)],
            vec!["n1".to_string(), "n2".to_string()],
        );
        assert!(report.succeeded);
        assert!(!report.is_partial_commit());
    }
}
