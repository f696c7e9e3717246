// Longest-valid-chain consensus resolution

use crate::consensus::validation::ChainValidator;
use crate::core::Block;
use crate::ledger::Ledger;
use std::future::Future;

/// Outbound capability: fetch a peer's full chain
pub trait ChainSource {
    fn fetch_chain(&self, peer: &str) -> impl Future<Output = Result<Vec<Block>, String>> + Send;
}

/// Adopts the longest valid neighbor chain that is strictly longer than
/// the local one
pub struct ConsensusResolver {
    validator: ChainValidator,
}

impl ConsensusResolver {
    pub fn new(difficulty: usize) -> Self {
        Self {
            validator: ChainValidator::new(difficulty),
        }
    }

    /// Pick the candidate to adopt. Only strictly longer chains are
    /// considered; among equally long ones the first observed wins.
    pub fn select_chain(
        &self,
        local_len: usize,
        genesis: &Block,
        candidates: Vec<(String, Vec<Block>)>,
    ) -> Option<Vec<Block>> {
        let mut best: Option<Vec<Block>> = None;
        let mut best_len = local_len;

        for (peer, chain) in candidates {
            if chain.len() <= best_len {
                log::debug!("Chain from {} (length {}) is not longer", peer, chain.len());
                continue;
            }
            match self.validator.validate_chain(&chain, genesis) {
                Ok(()) => {
                    best_len = chain.len();
                    best = Some(chain);
                }
                Err(e) => log::warn!("Discarding chain from {}: {}", peer, e),
            }
        }

        best
    }

    /// Fetch every neighbor's chain and replace the local chain if a longer
    /// valid one exists. Fetch failures exclude that neighbor; never fails.
    pub async fn resolve_conflicts<S: ChainSource>(&self, ledger: &Ledger, source: &S) -> bool {
        let mut candidates = Vec::new();
        for peer in ledger.neighbors() {
            match source.fetch_chain(&peer).await {
                Ok(chain) => candidates.push((peer, chain)),
                Err(e) => log::warn!("Could not fetch chain from {}: {}", peer, e),
            }
        }

        log::debug!("Consensus: evaluating {} candidate chains", candidates.len());

        let replaced = match ledger.genesis() {
            Some(genesis) => self
                .select_chain(ledger.chain_len(), &genesis, candidates)
                .is_some_and(|chain| ledger.replace_chain(chain)),
            None => false,
        };

        log::info!("Consensus: {}", if replaced { "replaced" } else { "unchanged" });
        replaced
    }
}
