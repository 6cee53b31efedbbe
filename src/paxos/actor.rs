use actix::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::commit::handle_commit_value;
use super::election::handle_propose_leader;
use super::proposal::{handle_acknowledge_proposal, handle_propose_value};
use super::rpc::{PaxosRequest, PaxosResponse, SetLeaderResponse};
use super::state::AcceptorState;
use crate::config::AcceptorConfig;

/// Handle an incoming acceptor RPC
#[derive(Message)]
#[rtype(result = "PaxosResponse")]
pub struct HandlePaxosRequest {
    pub request: PaxosRequest,
}

/// Host-local leadership switch
#[derive(Message)]
#[rtype(result = "()")]
pub struct SetLeader(pub bool);

/// Acceptor actor. The mailbox serializes every operation on this node, so
/// state reads, writes and log appends never interleave.
pub struct AcceptorActor {
    state: AcceptorState,
    rng: StdRng,
}

impl Actor for AcceptorActor {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        tracing::info!("Acceptor {} started", self.state.node_id);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::info!("Acceptor {} stopped", self.state.node_id);
    }
}

impl AcceptorActor {
    pub fn new(config: &AcceptorConfig) -> Self {
        Self::with_state(AcceptorState::from_config(config))
    }

    pub fn with_state(state: AcceptorState) -> Self {
        Self {
            state,
            rng: StdRng::from_entropy(),
        }
    }

    fn dispatch(&mut self, request: PaxosRequest) -> PaxosResponse {
        tracing::debug!("Node {} handling {}", self.state.node_id, request.name());

        match request {
            PaxosRequest::ProposeLeader(request) => {
                PaxosResponse::ProposeLeader(handle_propose_leader(&mut self.state, request))
            }
            PaxosRequest::ProposeValue(request) => {
                PaxosResponse::ProposeValue(handle_propose_value(&mut self.state, request))
            }
            PaxosRequest::AcknowledgeProposal(request) => PaxosResponse::AcknowledgeProposal(
                handle_acknowledge_proposal(&mut self.state, request),
            ),
            PaxosRequest::CommitValue(request) => {
                PaxosResponse::CommitValue(handle_commit_value(&mut self.state, request))
            }
            PaxosRequest::GetStatus(request) => {
                tracing::debug!(
                    "Node {} status requested by {}",
                    self.state.node_id,
                    request.requester
                );
                self.state.ensure_initialized(&mut self.rng);
                PaxosResponse::GetStatus(self.state.status())
            }
            PaxosRequest::SetLeader(request) => {
                self.state.set_leader(request.is_leader);
                PaxosResponse::SetLeader(SetLeaderResponse { ok: true })
            }
        }
    }
}

impl Handler<HandlePaxosRequest> for AcceptorActor {
    type Result = MessageResult<HandlePaxosRequest>;

    fn handle(&mut self, msg: HandlePaxosRequest, _ctx: &mut Context<Self>) -> Self::Result {
        MessageResult(self.dispatch(msg.request))
    }
}

impl Handler<SetLeader> for AcceptorActor {
    type Result = ();

    fn handle(&mut self, msg: SetLeader, _ctx: &mut Context<Self>) -> Self::Result {
        self.state.set_leader(msg.0);
    }
}
