use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use super::client::{AcceptorClient, Connector};
use crate::paxos::rpc::{
    AcknowledgeProposalRequest, AcknowledgeProposalResponse, CommitValueRequest,
    CommitValueResponse, PaxosRequest, PaxosResponse, ProposeLeaderRequest,
    ProposeLeaderResponse, ProposeValueRequest, ProposeValueResponse, SetLeaderRequest,
    SetLeaderResponse, StatusRequest, StatusResponse,
};
use crate::paxos::types::NodeId;
use crate::util::errors::{PaxosError, Result};

/// Open every connection and call through `connector` under one deadline
pub async fn connect_with_deadline(
    connector: &dyn Connector,
    node: &NodeId,
    deadline: Duration,
) -> Result<Box<dyn AcceptorClient>> {
    match timeout(deadline, connector.connect(node)).await {
        Ok(Ok(client)) => Ok(client),
        Ok(Err(e @ PaxosError::NodeUnreachable { .. })) => Err(e),
        Ok(Err(e)) => Err(PaxosError::unreachable(node, e.to_string())),
        Err(_) => Err(PaxosError::unreachable(
            node,
            format!("connect timed out after {:?}", deadline),
        )),
    }
}

/// A reusable connection to one acceptor with a per-call deadline.
///
/// A failed call drops the underlying client; the next call reconnects.
pub struct PeerConnection {
    node: NodeId,
    client: Option<Box<dyn AcceptorClient>>,
    connector: Arc<dyn Connector>,
    deadline: Duration,
}

impl PeerConnection {
    pub async fn open(
        node: NodeId,
        connector: Arc<dyn Connector>,
        deadline: Duration,
    ) -> Result<Self> {
        let client = connect_with_deadline(connector.as_ref(), &node, deadline).await?;
        Ok(Self {
            node,
            client: Some(client),
            connector,
            deadline,
        })
    }

    pub fn node(&self) -> &NodeId {
        &self.node
    }

    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    /// Send a request, bounded by the call deadline
    pub async fn call(&mut self, request: PaxosRequest) -> Result<PaxosResponse> {
        if self.client.is_none() {
            tracing::debug!("Reconnecting to {}", self.node);
            let client =
                connect_with_deadline(self.connector.as_ref(), &self.node, self.deadline).await?;
            self.client = Some(client);
        }
        let Some(client) = self.client.as_mut() else {
            return Err(PaxosError::unreachable(&self.node, "no connection"));
        };

        let name = request.name();
        match timeout(self.deadline, client.call(request)).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => {
                self.client = None;
                Err(match e {
                    PaxosError::NodeUnreachable { .. } => e,
                    other => PaxosError::unreachable(&self.node, format!("{}: {}", name, other)),
                })
            }
            Err(_) => {
                // A late response would desynchronize the stream
                self.client = None;
                Err(PaxosError::unreachable(
                    &self.node,
                    format!("{} timed out after {:?}", name, self.deadline),
                ))
            }
        }
    }

    fn unexpected(&mut self, expected: &str, got: PaxosResponse) -> PaxosError {
        self.client = None;
        PaxosError::UnexpectedResponse(format!(
            "{} answered {} with {}",
            self.node,
            expected,
            got.name()
        ))
    }

    pub async fn propose_leader(
        &mut self,
        request: ProposeLeaderRequest,
    ) -> Result<ProposeLeaderResponse> {
        match self.call(PaxosRequest::ProposeLeader(request)).await? {
            PaxosResponse::ProposeLeader(response) => Ok(response),
            other => Err(self.unexpected("ProposeLeader", other)),
        }
    }

    pub async fn propose_value(
        &mut self,
        request: ProposeValueRequest,
    ) -> Result<ProposeValueResponse> {
        match self.call(PaxosRequest::ProposeValue(request)).await? {
            PaxosResponse::ProposeValue(response) => Ok(response),
            other => Err(self.unexpected("ProposeValue", other)),
        }
    }

    pub async fn acknowledge_proposal(
        &mut self,
        request: AcknowledgeProposalRequest,
    ) -> Result<AcknowledgeProposalResponse> {
        match self.call(PaxosRequest::AcknowledgeProposal(request)).await? {
            PaxosResponse::AcknowledgeProposal(response) => Ok(response),
            other => Err(self.unexpected("AcknowledgeProposal", other)),
        }
    }

    pub async fn commit_value(
        &mut self,
        request: CommitValueRequest,
    ) -> Result<CommitValueResponse> {
        match self.call(PaxosRequest::CommitValue(request)).await? {
            PaxosResponse::CommitValue(response) => Ok(response),
            other => Err(self.unexpected("CommitValue", other)),
        }
    }

    pub async fn get_status(&mut self, requester: &str) -> Result<StatusResponse> {
        let request = PaxosRequest::GetStatus(StatusRequest {
            requester: requester.to_string(),
        });
        match self.call(request).await? {
            PaxosResponse::GetStatus(response) => Ok(response),
            other => Err(self.unexpected("GetStatus", other)),
        }
    }

    pub async fn set_leader(&mut self, is_leader: bool) -> Result<SetLeaderResponse> {
        match self
            .call(PaxosRequest::SetLeader(SetLeaderRequest { is_leader }))
            .await?
        {
            PaxosResponse::SetLeader(response) => Ok(response),
            other => Err(self.unexpected("SetLeader", other)),
        }
    }

    /// Close the connection, giving it at most `grace` to flush
    pub async fn close(&mut self, grace: Duration) {
        let Some(mut client) = self.client.take() else {
            return;
        };

        match timeout(grace, client.close()).await {
            Ok(Ok(())) => tracing::debug!("Closed connection to {}", self.node),
            Ok(Err(e)) => tracing::debug!("Error closing connection to {}: {}", self.node, e),
            Err(_) => tracing::debug!("Closing connection to {} timed out", self.node),
        }
    }
}

/// Open connections for one round, keyed by node id, in configured order
#[derive(Default)]
pub struct PeerRegistry {
    order: Vec<NodeId>,
    connections: HashMap<NodeId, PeerConnection>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an open connection; a repeated node id replaces the old one
    pub fn register(&mut self, connection: PeerConnection) {
        let node = connection.node().clone();
        if !self.connections.contains_key(&node) {
            self.order.push(node.clone());
        }
        self.connections.insert(node, connection);
    }

    pub fn get_mut(&mut self, node: &NodeId) -> Option<&mut PeerConnection> {
        self.connections.get_mut(node)
    }

    /// All registered node ids, in registration order
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.order.clone()
    }

    pub fn contains_node(&self, node: &NodeId) -> bool {
        self.connections.contains_key(node)
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Close every connection and empty the registry
    pub async fn close_all(&mut self, grace: Duration) {
        for node in self.order.drain(..) {
            if let Some(mut connection) = self.connections.remove(&node) {
                connection.close(grace).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::local::LocalConnector;
    use crate::paxos::actor::AcceptorActor;
    use crate::paxos::state::AcceptorState;
    use actix::Actor;
    use async_trait::async_trait;

    struct HangingConnector;

    struct HangingClient;

    #[async_trait]
    impl AcceptorClient for HangingClient {
        async fn call(&mut self, _request: PaxosRequest) -> Result<PaxosResponse> {
            futures::future::pending().await
        }

        async fn close(&mut self) -> Result<()> {
            Ok(())
        }
    }

    #[async_trait]
    impl Connector for HangingConnector {
        async fn connect(&self, _node: &NodeId) -> Result<Box<dyn AcceptorClient>> {
            Ok(Box::new(HangingClient))
        }
    }

    #[actix_rt::test]
    async fn test_call_times_out_as_unreachable() {
        let connector: Arc<dyn Connector> = Arc::new(HangingConnector);
        let mut connection =
            PeerConnection::open("n1".to_string(), connector, Duration::from_millis(20))
                .await
                .unwrap();

        let result = connection.get_status("test").await;

        assert!(matches!(result, Err(PaxosError::NodeUnreachable { .. })));
        assert!(!connection.is_connected());
    }

    #[actix_rt::test]
    async fn test_open_unknown_node_fails() {
        let connector: Arc<dyn Connector> = Arc::new(LocalConnector::new());
        let result =
            PeerConnection::open("missing".to_string(), connector, Duration::from_millis(50)).await;

        assert!(matches!(result, Err(PaxosError::NodeUnreachable { .. })));
    }

    #[actix_rt::test]
    async fn test_registry_keeps_order_and_closes() {
        let mut local = LocalConnector::new();
        for node in ["c", "a", "b"] {
            local.register(node, AcceptorActor::with_state(AcceptorState::new(node.to_string())).start());
        }
        let connector: Arc<dyn Connector> = Arc::new(local);

        let mut registry = PeerRegistry::new();
        for node in ["c", "a", "b"] {
            let connection =
                PeerConnection::open(node.to_string(), connector.clone(), Duration::from_secs(1))
                    .await
                    .unwrap();
            registry.register(connection);
        }
        assert_eq!(registry.node_ids(), vec!["c", "a", "b"]);

        let status = registry
            .get_mut(&"a".to_string())
            .unwrap()
            .get_status("test")
            .await
            .unwrap();
        assert_eq!(status.server_id, "a");

        registry.close_all(Duration::from_millis(100)).await;
        assert!(registry.is_empty());
        assert!(!registry.contains_node(&"a".to_string()));
    }
}
