// Consensus: proof of work, chain validation and conflict resolution

pub mod pow;
pub mod validation;
pub mod resolver;

pub use pow::{ProofOfWork, Target, MiningResult};
pub use validation::{ChainValidator, ValidationError};
pub use resolver::{ChainSource, ConsensusResolver};
