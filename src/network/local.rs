use actix::Addr;
use async_trait::async_trait;
use std::collections::HashMap;

use super::client::{AcceptorClient, Connector};
use crate::paxos::actor::{AcceptorActor, HandlePaxosRequest};
use crate::paxos::rpc::{PaxosRequest, PaxosResponse};
use crate::paxos::types::NodeId;
use crate::util::errors::{PaxosError, Result};

/// In-process connector: node ids map straight to acceptor actors.
///
/// A node missing from the map is unreachable.
#[derive(Clone, Default)]
pub struct LocalConnector {
    nodes: HashMap<NodeId, Addr<AcceptorActor>>,
}

impl LocalConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, node: impl Into<NodeId>, addr: Addr<AcceptorActor>) {
        self.nodes.insert(node.into(), addr);
    }

    pub fn with_node(mut self, node: impl Into<NodeId>, addr: Addr<AcceptorActor>) -> Self {
        self.register(node, addr);
        self
    }
}

#[async_trait]
impl Connector for LocalConnector {
    async fn connect(&self, node: &NodeId) -> Result<Box<dyn AcceptorClient>> {
        match self.nodes.get(node) {
            Some(addr) if addr.connected() => Ok(Box::new(LocalAcceptorClient { addr: addr.clone() })),
            Some(_) => Err(PaxosError::unreachable(node, "acceptor actor stopped")),
            None => Err(PaxosError::unreachable(node, "no such node")),
        }
    }
}

pub struct LocalAcceptorClient {
    addr: Addr<AcceptorActor>,
}

#[async_trait]
impl AcceptorClient for LocalAcceptorClient {
    async fn call(&mut self, request: PaxosRequest) -> Result<PaxosResponse> {
        Ok(self.addr.send(HandlePaxosRequest { request }).await?)
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
