use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use super::proposals::{ProposalSource, RandomProposals};
use super::round::{AcceptedProposal, NodeOutcome, PhaseOutcome, RoundFailure, RoundReport};
use crate::config::CoordinatorConfig;
use crate::network::client::Connector;
use crate::network::peer_registry::{PeerConnection, PeerRegistry};
use crate::paxos::election::{select_leader, ElectionProposal, LeaderElection};
use crate::paxos::proposal::ProposalTally;
use crate::paxos::rpc::{
    AcknowledgeProposalRequest, CommitValueRequest, ProposeLeaderRequest, ProposeValueRequest,
};
use crate::paxos::types::{NodeId, ProposalNumber, Value};
use crate::util::errors::PaxosError;

/// Requester id the coordinator sends with GetStatus
pub const COORDINATOR_REQUESTER: &str = "coordinator";

/// Cloneable handle that asks a running round to stop at the next phase
/// boundary
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Clears the running flag when the round ends, however it ends
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Per-round bookkeeping: the open connections and what each node did
struct Round {
    registry: PeerRegistry,
    outcomes: Vec<NodeOutcome>,
}

impl Round {
    fn new(nodes: &[NodeId]) -> Self {
        let mut seen = HashSet::new();
        let mut outcomes = Vec::with_capacity(nodes.len());
        for node in nodes {
            if seen.insert(node.clone()) {
                outcomes.push(NodeOutcome::new(node.clone()));
            } else {
                tracing::warn!("Ignoring duplicate node address {}", node);
            }
        }

        Self {
            registry: PeerRegistry::new(),
            outcomes,
        }
    }

    fn outcome_mut(&mut self, node: &NodeId) -> Option<&mut NodeOutcome> {
        self.outcomes.iter_mut().find(|o| &o.node == node)
    }

    fn record_error(&mut self, node: &NodeId, phase: &str, error: &PaxosError) {
        tracing::warn!("Server {} excluded from {} phase: {}", node, phase, error);
        if let Some(outcome) = self.outcome_mut(node) {
            outcome.errors.push(format!("{}: {}", phase, error));
        }
    }

    fn fail(&mut self, failure: RoundFailure, leader: Option<NodeId>) -> RoundReport {
        tracing::error!("Consensus round failed: {}", failure);
        RoundReport::failed(failure, leader, std::mem::take(&mut self.outcomes))
    }
}

/// Drives Election, Proposal and Commit over a set of acceptors.
///
/// At most one round runs per coordinator; a concurrent call returns
/// immediately with `RoundFailure::AlreadyRunning`.
pub struct Coordinator {
    connector: Arc<dyn Connector>,
    config: CoordinatorConfig,
    proposals: Mutex<Box<dyn ProposalSource>>,
    running: AtomicBool,
    stop: StopHandle,
}

impl Coordinator {
    pub fn new(connector: Arc<dyn Connector>, config: CoordinatorConfig) -> Self {
        let proposals = Box::new(RandomProposals::new(&config));
        Self::with_proposal_source(connector, config, proposals)
    }

    pub fn with_proposal_source(
        connector: Arc<dyn Connector>,
        config: CoordinatorConfig,
        proposals: Box<dyn ProposalSource>,
    ) -> Self {
        Self {
            connector,
            config,
            proposals: Mutex::new(proposals),
            running: AtomicBool::new(false),
            stop: StopHandle::default(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Ask the running round to stop before its next phase
    pub fn stop(&self) {
        tracing::info!("Stop requested");
        self.stop.stop();
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    fn next_election_number(&self) -> ProposalNumber {
        self.proposals
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .election_number()
    }

    fn next_proposed_value(&self) -> Value {
        self.proposals
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .proposed_value()
    }

    /// Run one full consensus round over `nodes`.
    ///
    /// Node failures never abort the round on their own; the node is
    /// excluded and the round carries on with whoever is left. Every
    /// connection opened here is closed before returning.
    pub async fn run_consensus_round(&self, nodes: &[NodeId]) -> RoundReport {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::warn!("Consensus round already running");
            return RoundReport::failed(RoundFailure::AlreadyRunning, None, Vec::new());
        }
        let _guard = RunningGuard(&self.running);
        self.stop.reset();

        tracing::info!("Starting consensus round over {} nodes", nodes.len());
        let mut round = Round::new(nodes);
        let report = self.drive(&mut round).await;
        round.registry.close_all(self.config.close_grace()).await;

        report
    }

    async fn drive(&self, round: &mut Round) -> RoundReport {
        self.connect_all(round).await;
        if self.stop.is_stopped() {
            return round.fail(RoundFailure::Stopped, None);
        }

        let election = match self.run_election_phase(round).await {
            PhaseOutcome::Success(election) => election,
            PhaseOutcome::Failure(failure) => return round.fail(failure, None),
        };
        if self.stop.is_stopped() {
            return round.fail(RoundFailure::Stopped, Some(election.leader));
        }

        let proposal = match self.run_proposal_phase(round, &election).await {
            PhaseOutcome::Success(proposal) => proposal,
            PhaseOutcome::Failure(failure) => return round.fail(failure, Some(election.leader)),
        };
        if self.stop.is_stopped() {
            return round.fail(RoundFailure::Stopped, Some(proposal.leader));
        }

        let commit_failures = self.run_commit_phase(round, &proposal).await;
        tracing::info!(
            "Consensus reached with value {} (leader {})",
            proposal.tally.proposed_value,
            proposal.leader
        );

        RoundReport::success(
            proposal.leader,
            proposal.tally.proposed_value,
            std::mem::take(&mut round.outcomes),
            commit_failures,
        )
    }

    /// Availability probe. Nodes that do not answer are left out of the
    /// whole round.
    async fn connect_all(&self, round: &mut Round) {
        for outcome in round.outcomes.iter_mut() {
            let opened = PeerConnection::open(
                outcome.node.clone(),
                self.connector.clone(),
                self.config.rpc_timeout(),
            )
            .await;

            let mut connection = match opened {
                Ok(connection) => connection,
                Err(e) => {
                    tracing::warn!("Server {} is not responding: {}", outcome.node, e);
                    outcome.errors.push(format!("probe: {}", e));
                    continue;
                }
            };

            match connection.get_status(COORDINATOR_REQUESTER).await {
                Ok(_) => {
                    tracing::info!("Server {} is available", outcome.node);
                    outcome.reachable = true;
                    round.registry.register(connection);
                }
                Err(e) => {
                    tracing::warn!("Server {} is not responding: {}", outcome.node, e);
                    outcome.errors.push(format!("probe: {}", e));
                    connection.close(self.config.close_grace()).await;
                }
            }
        }
    }

    async fn run_election_phase(&self, round: &mut Round) -> PhaseOutcome<LeaderElection> {
        tracing::info!("Starting ELECTION phase");

        let mut proposals = Vec::new();
        for node in round.registry.node_ids() {
            let proposal_number = self.next_election_number();
            let Some(connection) = round.registry.get_mut(&node) else {
                continue;
            };

            let request = ProposeLeaderRequest {
                proposal_number,
                server_id: node.clone(),
            };
            match connection.propose_leader(request).await {
                Ok(response) => {
                    tracing::info!(
                        "Server {} proposes itself as leader with proposal number {} ({})",
                        node,
                        proposal_number,
                        if response.accepted { "accepted" } else { "rejected" }
                    );
                    if let Some(outcome) = round.outcome_mut(&node) {
                        outcome.election_number = Some(proposal_number);
                    }
                    proposals.push(ElectionProposal {
                        node,
                        proposal_number,
                    });
                }
                Err(e) => round.record_error(&node, "election", &e),
            }
        }

        let Some(election) = select_leader(&proposals) else {
            return PhaseOutcome::Failure(RoundFailure::NoLeaderFound);
        };

        for (node, accepts) in &election.acknowledgements {
            tracing::info!(
                "Server {} {} {} as leader",
                node,
                if *accepts { "accepts" } else { "rejects" },
                election.leader
            );
            if let Some(outcome) = round.outcome_mut(node) {
                outcome.accepts_leader = Some(*accepts);
            }
            self.acknowledge(round, &election.leader, election.proposal_number, *accepts, node)
                .await;
        }

        // Clears leadership left over from an earlier round, including on
        // nodes that missed their election call
        for node in round.registry.node_ids() {
            if node == election.leader {
                continue;
            }
            if let Some(connection) = round.registry.get_mut(&node) {
                if let Err(e) = connection.set_leader(false).await {
                    tracing::debug!("Could not clear leader flag on {}: {}", node, e);
                }
            }
        }

        if let Some(connection) = round.registry.get_mut(&election.leader) {
            if let Err(e) = connection.set_leader(true).await {
                tracing::warn!("Could not set leader flag on {}: {}", election.leader, e);
            }
        }
        if let Some(outcome) = round.outcome_mut(&election.leader) {
            outcome.is_leader = true;
        }

        tracing::info!(
            "Server {} elected as leader with proposal {}",
            election.leader,
            election.proposal_number
        );
        PhaseOutcome::Success(election)
    }

    async fn run_proposal_phase(
        &self,
        round: &mut Round,
        election: &LeaderElection,
    ) -> PhaseOutcome<AcceptedProposal> {
        tracing::info!("Starting PROPOSAL phase");

        // Locate the leader by asking the nodes; the first one reporting
        // isLeader wins, the election result is the fallback
        let mut unavailable = HashSet::new();
        let mut reported_leader = None;
        for node in round.registry.node_ids() {
            let Some(connection) = round.registry.get_mut(&node) else {
                continue;
            };
            match connection.get_status(COORDINATOR_REQUESTER).await {
                Ok(status) if status.is_leader => {
                    reported_leader = Some(node);
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    round.record_error(&node, "proposal", &e);
                    unavailable.insert(node);
                }
            }
        }

        let leader = match reported_leader {
            Some(leader) => leader,
            None => {
                tracing::info!("Using leader {} from election phase", election.leader);
                election.leader.clone()
            }
        };
        // The leader counts itself toward the quorum, so it must be alive
        if unavailable.contains(&leader) {
            tracing::error!("Leader {} is unreachable in PROPOSAL phase", leader);
            return PhaseOutcome::Failure(RoundFailure::NoLeaderFound);
        }
        let proposal_number = round
            .outcomes
            .iter()
            .find(|o| o.node == leader)
            .and_then(|o| o.election_number)
            .unwrap_or(election.proposal_number);

        let proposed_value = self.next_proposed_value();
        tracing::info!(
            "Leader {} proposing value {} with proposal number {}",
            leader,
            proposed_value,
            proposal_number
        );

        let mut tally = ProposalTally::new(proposal_number, proposed_value);
        if let Some(outcome) = round.outcome_mut(&leader) {
            outcome.value_accepted = Some(true);
        }

        for node in round.registry.node_ids() {
            if node == leader || unavailable.contains(&node) {
                continue;
            }
            let Some(connection) = round.registry.get_mut(&node) else {
                continue;
            };

            let request = ProposeValueRequest {
                proposal_number,
                proposed_value,
                leader_id: leader.clone(),
            };
            match connection.propose_value(request).await {
                Ok(response) => {
                    tracing::info!(
                        "Server {} {} value {}",
                        node,
                        if response.accepted { "accepts" } else { "rejects" },
                        proposed_value
                    );
                    tally.record(response.accepted);
                    if let Some(outcome) = round.outcome_mut(&node) {
                        outcome.value_accepted = Some(response.accepted);
                    }
                    self.acknowledge(round, &leader, proposal_number, response.accepted, &node)
                        .await;
                }
                Err(e) => round.record_error(&node, "proposal", &e),
            }
        }

        if !tally.has_quorum() {
            return PhaseOutcome::Failure(RoundFailure::NoQuorum {
                accepted: tally.accepted,
                required: tally.required(),
                participants: tally.participants,
            });
        }

        tracing::info!(
            "Value {} accepted by majority ({}/{})",
            proposed_value,
            tally.accepted,
            tally.participants
        );
        PhaseOutcome::Success(AcceptedProposal { leader, tally })
    }

    /// Returns the nodes whose commit failed
    async fn run_commit_phase(&self, round: &mut Round, proposal: &AcceptedProposal) -> Vec<NodeId> {
        tracing::info!("Starting COMMIT phase");

        let mut failures = Vec::new();
        for node in round.registry.node_ids() {
            if node == proposal.leader {
                continue;
            }
            let Some(connection) = round.registry.get_mut(&node) else {
                continue;
            };

            let request = CommitValueRequest {
                proposal_number: proposal.tally.proposal_number,
                value: proposal.tally.proposed_value,
                leader_id: proposal.leader.clone(),
            };
            let committed = match connection.commit_value(request).await {
                Ok(response) => response.success,
                Err(e) => {
                    round.record_error(&node, "commit", &e);
                    false
                }
            };

            if committed {
                tracing::info!("Server {} committed value {}", node, proposal.tally.proposed_value);
            } else {
                failures.push(node.clone());
            }
            if let Some(outcome) = round.outcome_mut(&node) {
                outcome.committed = Some(committed);
            }
        }

        if !failures.is_empty() {
            tracing::warn!(
                "Partial commit failure: {} node(s) did not commit: {}",
                failures.len(),
                failures.join(", ")
            );
        }
        failures
    }

    /// Audit copy of an acceptance decision for the leader's log. Failures
    /// do not affect the round.
    async fn acknowledge(
        &self,
        round: &mut Round,
        leader: &NodeId,
        proposal_number: ProposalNumber,
        accepted: bool,
        acceptor_id: &NodeId,
    ) {
        let Some(connection) = round.registry.get_mut(leader) else {
            return;
        };

        let request = AcknowledgeProposalRequest {
            proposal_number,
            accepted,
            acceptor_id: acceptor_id.clone(),
        };
        if let Err(e) = connection.acknowledge_proposal(request).await {
            tracing::debug!("Acknowledgement to leader {} failed: {}", leader, e);
        }
    }
}
