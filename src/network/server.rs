use actix::Addr;
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::Framed;
use tokio_util::sync::CancellationToken;

use super::codec::ServerCodec;
use crate::paxos::actor::{AcceptorActor, HandlePaxosRequest};
use crate::util::errors::Result;

/// Serves one acceptor actor over TCP.
///
/// Each connection runs on its own task and answers its requests in order;
/// the actor serializes requests across connections.
pub struct AcceptorServer {
    listener: TcpListener,
    acceptor: Addr<AcceptorActor>,
    max_frame_length: usize,
}

impl AcceptorServer {
    pub async fn bind(
        listen_addr: &str,
        acceptor: Addr<AcceptorActor>,
        max_frame_length: usize,
    ) -> Result<Self> {
        let listener = TcpListener::bind(listen_addr).await?;
        tracing::info!("Server started on {}", listener.local_addr()?);

        Ok(Self {
            listener,
            acceptor,
            max_frame_length,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until `shutdown` is cancelled
    pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Shutting down acceptor server");
                    break;
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        tracing::debug!("Accepted connection from {}", peer);
                        let acceptor = self.acceptor.clone();
                        let token = shutdown.child_token();
                        let max_frame_length = self.max_frame_length;

                        actix_rt::spawn(async move {
                            if let Err(e) =
                                serve_connection(stream, acceptor, max_frame_length, token).await
                            {
                                tracing::warn!("Connection from {} ended with error: {}", peer, e);
                            }
                        });
                    }
                    Err(e) => {
                        tracing::warn!("Failed to accept connection: {}", e);
                    }
                }
            }
        }

        Ok(())
    }
}

async fn serve_connection(
    stream: TcpStream,
    acceptor: Addr<AcceptorActor>,
    max_frame_length: usize,
    shutdown: CancellationToken,
) -> Result<()> {
    stream.set_nodelay(true)?;
    let mut framed = Framed::new(stream, ServerCodec::new(max_frame_length));

    loop {
        let frame = tokio::select! {
            _ = shutdown.cancelled() => break,
            frame = framed.next() => frame,
        };

        let request = match frame {
            Some(request) => request?,
            None => break,
        };

        let response = acceptor.send(HandlePaxosRequest { request }).await?;
        framed.send(response).await?;
    }

    Ok(())
}
