// src/network/mod.rs
pub mod client;
pub mod codec;
pub mod local;
pub mod peer_registry;
pub mod server;

pub use client::{AcceptorClient, Connector, TcpConnector};
pub use local::LocalConnector;
pub use peer_registry::{PeerConnection, PeerRegistry};
pub use server::AcceptorServer;
