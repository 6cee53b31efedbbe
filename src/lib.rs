pub mod config;
pub mod coordinator;
pub mod network;
pub mod paxos;
pub mod util;
