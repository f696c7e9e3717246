// Minimal proof-of-work ledger: signed transfers, mined blocks and
// longest-valid-chain consensus between neighboring nodes

pub mod config;
pub mod core;
pub mod consensus;
pub mod ledger;
pub mod network;
pub mod wallet;
pub mod cli;

// Re-exports for convenience
pub use cli::{Cli, CliHandler};
pub use config::{LedgerConfig, NodeConfig};
pub use core::{Block, Transaction, Hash256, MINING_SENDER};
pub use consensus::{ProofOfWork, Target, ChainValidator, ConsensusResolver, ValidationError};
pub use ledger::{Ledger, LedgerError, TransactionRequest};
pub use network::{Node, Message, Peer};
