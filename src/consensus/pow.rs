// Proof of Work implementation

use crate::core::{Block, Hash256, Transaction};
use std::time::{Duration, Instant};

/// Fixed difficulty: required count of leading '0' hex digits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    pub difficulty: usize,
}

impl Target {
    pub fn new(difficulty: usize) -> Self {
        Self { difficulty }
    }

    /// Check if the hex form of `hash` starts with `difficulty` zeros
    pub fn is_valid_hash(&self, hash: &Hash256) -> bool {
        hash.leading_zero_digits() >= self.difficulty
    }
}

/// Proof of Work engine
#[derive(Debug, Clone, Copy)]
pub struct ProofOfWork {
    pub target: Target,
}

impl ProofOfWork {
    pub fn new(difficulty: usize) -> Self {
        Self {
            target: Target::new(difficulty),
        }
    }

    /// Search nonces upward from zero until the candidate block hash meets
    /// the target. Unbounded: an unsatisfiable target never returns, so
    /// callers that need bounded latency must wrap this in a timeout.
    pub fn find_nonce(
        &self,
        timestamp: i64,
        previous_hash: Hash256,
        transactions: &[Transaction],
    ) -> MiningResult {
        let start_time = Instant::now();
        let mut candidate = Block::with_timestamp(timestamp, 0, previous_hash, transactions.to_vec());
        let mut attempts = 0u64;

        loop {
            let hash = candidate.hash();
            attempts += 1;

            if self.target.is_valid_hash(&hash) {
                let duration = start_time.elapsed();
                log::info!("Found nonce {} after {} attempts ({:?}): {}",
                    candidate.nonce, attempts, duration, hash);
                return MiningResult {
                    nonce: candidate.nonce,
                    hash,
                    attempts,
                    duration,
                };
            }

            if attempts % 100_000 == 0 {
                let elapsed = start_time.elapsed();
                log::debug!("Mining attempts: {} ({:.1} KH/s)",
                    attempts,
                    attempts as f64 / elapsed.as_secs_f64() / 1000.0
                );
            }

            candidate.nonce = candidate.nonce.wrapping_add(1);
        }
    }

    /// Verify that a block's own hash satisfies the target
    pub fn verify(&self, block: &Block) -> bool {
        self.target.is_valid_hash(&block.hash())
    }
}

/// Mining result
#[derive(Debug, Clone)]
pub struct MiningResult {
    /// The nonce that was found
    pub nonce: u64,
    /// Hash of the candidate with that nonce
    pub hash: Hash256,
    /// Number of attempts
    pub attempts: u64,
    /// Time taken
    pub duration: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_validation() {
        let target = Target::new(3);

        assert!(target.is_valid_hash(&Hash256::zero()));
        assert!(!target.is_valid_hash(&Hash256::new([0xff; 32])));

        let mut bytes = [0xff; 32];
        bytes[0] = 0x00;
        bytes[1] = 0x0a;
        assert!(target.is_valid_hash(&Hash256::new(bytes)));
        bytes[1] = 0xa0;
        assert!(!target.is_valid_hash(&Hash256::new(bytes)));
    }

    #[test]
    fn test_zero_difficulty_accepts_first_nonce() {
        let pow = ProofOfWork::new(0);
        let result = pow.find_nonce(1, Hash256::zero(), &[]);

        assert_eq!(result.nonce, 0);
        assert_eq!(result.attempts, 1);
    }

    #[test]
    fn test_found_nonce_seals_block() {
        let pow = ProofOfWork::new(2);
        let txs = vec![Transaction::reward("miner", 1.0)];
        let previous = Block::genesis().hash();

        let result = pow.find_nonce(1_000, previous, &txs);
        let block = Block::with_timestamp(1_000, result.nonce, previous, txs);

        assert_eq!(block.hash(), result.hash);
        assert!(pow.verify(&block));
        assert!(block.hash().to_hex().starts_with("00"));
    }

    #[test]
    fn test_found_nonce_is_the_first() {
        let pow = ProofOfWork::new(1);
        let result = pow.find_nonce(5, Hash256::zero(), &[]);

        for nonce in 0..result.nonce {
            let block = Block::with_timestamp(5, nonce, Hash256::zero(), Vec::new());
            assert!(!pow.verify(&block));
        }
    }
}
