use serde::{Deserialize, Serialize};

use super::types::{LogEntry, NodeId, ProposalNumber, Value};

/// ProposeLeader RPC - a node proposes itself as leader with a proposal number
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposeLeaderRequest {
    pub proposal_number: ProposalNumber,
    /// Node the proposal is made on behalf of
    pub server_id: NodeId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposeLeaderResponse {
    /// True if the proposal number beat everything seen so far
    pub accepted: bool,
    /// Highest election proposal this acceptor has seen, after the call
    pub highest_seen: ProposalNumber,
    pub acceptor_id: NodeId,
}

/// ProposeValue RPC - the leader asks an acceptor to accept a value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposeValueRequest {
    pub proposal_number: ProposalNumber,
    pub proposed_value: Value,
    pub leader_id: NodeId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposeValueResponse {
    pub accepted: bool,
    /// The acceptor's accepted proposal number, not necessarily the one sent
    pub proposal_number: ProposalNumber,
    pub acceptor_id: NodeId,
}

/// AcknowledgeProposal RPC - audit record of another node's decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcknowledgeProposalRequest {
    pub proposal_number: ProposalNumber,
    pub accepted: bool,
    pub acceptor_id: NodeId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcknowledgeProposalResponse {
    pub received: bool,
}

/// CommitValue RPC - the leader tells an acceptor the agreed value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitValueRequest {
    pub proposal_number: ProposalNumber,
    pub value: Value,
    pub leader_id: NodeId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitValueResponse {
    pub success: bool,
    pub server_id: NodeId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusRequest {
    pub requester: String,
}

/// Snapshot of an acceptor's state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub server_id: NodeId,
    /// The accepted proposal number
    pub current_proposal: ProposalNumber,
    pub is_leader: bool,
    pub current_value: Value,
    /// Newest first
    pub log_entries: Vec<LogEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetLeaderRequest {
    pub is_leader: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetLeaderResponse {
    pub ok: bool,
}

/// Wrapper for all requests an acceptor serves
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PaxosRequest {
    ProposeLeader(ProposeLeaderRequest),
    ProposeValue(ProposeValueRequest),
    AcknowledgeProposal(AcknowledgeProposalRequest),
    CommitValue(CommitValueRequest),
    GetStatus(StatusRequest),
    SetLeader(SetLeaderRequest),
}

impl PaxosRequest {
    /// Operation name, used in logs and error messages
    pub fn name(&self) -> &'static str {
        match self {
            PaxosRequest::ProposeLeader(_) => "ProposeLeader",
            PaxosRequest::ProposeValue(_) => "ProposeValue",
            PaxosRequest::AcknowledgeProposal(_) => "AcknowledgeProposal",
            PaxosRequest::CommitValue(_) => "CommitValue",
            PaxosRequest::GetStatus(_) => "GetStatus",
            PaxosRequest::SetLeader(_) => "SetLeader",
        }
    }
}

/// Wrapper for all acceptor responses, one variant per request kind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PaxosResponse {
    ProposeLeader(ProposeLeaderResponse),
    ProposeValue(ProposeValueResponse),
    AcknowledgeProposal(AcknowledgeProposalResponse),
    CommitValue(CommitValueResponse),
    GetStatus(StatusResponse),
    SetLeader(SetLeaderResponse),
}

impl PaxosResponse {
    pub fn name(&self) -> &'static str {
        match self {
            PaxosResponse::ProposeLeader(_) => "ProposeLeader",
            PaxosResponse::ProposeValue(_) => "ProposeValue",
            PaxosResponse::AcknowledgeProposal(_) => "AcknowledgeProposal",
            PaxosResponse::CommitValue(_) => "CommitValue",
            PaxosResponse::GetStatus(_) => "GetStatus",
            PaxosResponse::SetLeader(_) => "SetLeader",
        }
    }
}
