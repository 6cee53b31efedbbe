pub mod actor;
pub mod commit;
pub mod election;
pub mod event_log;
pub mod proposal;
pub mod rpc;
pub mod state;
pub mod types;

pub use actor::{AcceptorActor, HandlePaxosRequest, SetLeader};
pub use event_log::EventLog;
pub use state::AcceptorState;
pub use types::{EventType, LogEntry, NodeId, ProposalNumber, Value, UNSET_VALUE};
