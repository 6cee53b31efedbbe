use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;

use super::codec::{ClientCodec, MAX_MESSAGE_SIZE};
use crate::paxos::rpc::{PaxosRequest, PaxosResponse};
use crate::paxos::types::NodeId;
use crate::util::errors::{PaxosError, Result};

/// An open request/response channel to one acceptor
#[async_trait]
pub trait AcceptorClient: Send {
    /// Send one request and wait for its response
    async fn call(&mut self, request: PaxosRequest) -> Result<PaxosResponse>;

    /// Flush and release the underlying connection
    async fn close(&mut self) -> Result<()>;
}

/// Opens clients to acceptors by node identifier
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, node: &NodeId) -> Result<Box<dyn AcceptorClient>>;
}

/// Connects to acceptors over TCP, treating the node id as `host:port`
#[derive(Debug, Clone)]
pub struct TcpConnector {
    max_frame_length: usize,
}

impl TcpConnector {
    pub fn new(max_frame_length: usize) -> Self {
        Self { max_frame_length }
    }
}

impl Default for TcpConnector {
    fn default() -> Self {
        Self::new(MAX_MESSAGE_SIZE)
    }
}

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&self, node: &NodeId) -> Result<Box<dyn AcceptorClient>> {
        let stream = TcpStream::connect(node.as_str())
            .await
            .map_err(|e| PaxosError::unreachable(node, e.to_string()))?;
        stream.set_nodelay(true)?;

        tracing::debug!("Connected to acceptor {}", node);

        Ok(Box::new(TcpAcceptorClient {
            node: node.clone(),
            framed: Framed::new(stream, ClientCodec::new(self.max_frame_length)),
        }))
    }
}

pub struct TcpAcceptorClient {
    node: NodeId,
    framed: Framed<TcpStream, ClientCodec>,
}

#[async_trait]
impl AcceptorClient for TcpAcceptorClient {
    async fn call(&mut self, request: PaxosRequest) -> Result<PaxosResponse> {
        self.framed.send(request).await?;

        match self.framed.next().await {
            Some(response) => response,
            None => Err(PaxosError::unreachable(
                &self.node,
                "connection closed by acceptor",
            )),
        }
    }

    async fn close(&mut self) -> Result<()> {
        SinkExt::<PaxosRequest>::close(&mut self.framed).await
    }
}
