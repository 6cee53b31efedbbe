use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::CoordinatorConfig;
use crate::paxos::types::{ProposalNumber, Value};

/// Where the coordinator gets election numbers and proposed values
pub trait ProposalSource: Send {
    /// A node's self-assigned election number
    fn election_number(&mut self) -> ProposalNumber;

    /// The value the leader proposes
    fn proposed_value(&mut self) -> Value;
}

/// Uniformly random numbers: elections in [1, max], values in [0, max)
pub struct RandomProposals {
    rng: StdRng,
    max_election_number: ProposalNumber,
    max_proposed_value: Value,
}

impl RandomProposals {
    pub fn new(config: &CoordinatorConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    pub fn with_rng(config: &CoordinatorConfig, rng: StdRng) -> Self {
        Self {
            rng,
            max_election_number: config.max_election_number.max(1),
            max_proposed_value: config.max_proposed_value.max(1),
        }
    }
}

impl ProposalSource for RandomProposals {
    fn election_number(&mut self) -> ProposalNumber {
        self.rng.gen_range(1..=self.max_election_number)
    }

    fn proposed_value(&mut self) -> Value {
        self.rng.gen_range(0..self.max_proposed_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_ranges() {
        let config = CoordinatorConfig::default();
        let mut source = RandomProposals::with_rng(&config, StdRng::seed_from_u64(42));

        for _ in 0..500 {
            let n = source.election_number();
            assert!((1..=100).contains(&n));
            let v = source.proposed_value();
            assert!((0..100).contains(&v));
        }
    }
}
