pub mod coordinator;
pub mod proposals;
pub mod round;

pub use coordinator::{Coordinator, StopHandle, COORDINATOR_REQUESTER};
pub use proposals::{ProposalSource, RandomProposals};
pub use round::{AcceptedProposal, NodeOutcome, PhaseOutcome, RoundFailure, RoundReport};
