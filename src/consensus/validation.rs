// Chain integrity validation

use crate::core::Block;
use crate::consensus::pow::ProofOfWork;

/// Reasons a chain is not internally valid
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Chain has no blocks at all
    EmptyChain,
    /// First block differs from the local genesis block
    GenesisMismatch,
    /// Block at this height does not link to its predecessor's hash
    BrokenLink(usize),
    /// Block at this height does not meet the difficulty target
    InvalidProofOfWork(usize),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ValidationError::EmptyChain => write!(f, "Chain is empty"),
            ValidationError::GenesisMismatch => write!(f, "Genesis block mismatch"),
            ValidationError::BrokenLink(height) => {
                write!(f, "Block {} does not link to its predecessor", height)
            }
            ValidationError::InvalidProofOfWork(height) => {
                write!(f, "Block {} has invalid proof of work", height)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Checks hash linkage and proof of work over a whole chain
pub struct ChainValidator {
    pow: ProofOfWork,
}

impl ChainValidator {
    pub fn new(difficulty: usize) -> Self {
        Self {
            pow: ProofOfWork::new(difficulty),
        }
    }

    /// Validate a chain against the expected genesis block
    pub fn validate_chain(&self, chain: &[Block], genesis: &Block) -> Result<(), ValidationError> {
        let first = chain.first().ok_or(ValidationError::EmptyChain)?;
        if first != genesis {
            return Err(ValidationError::GenesisMismatch);
        }

        for (height, pair) in chain.windows(2).enumerate() {
            let (previous, block) = (&pair[0], &pair[1]);
            let height = height + 1;

            if block.previous_hash != previous.hash() {
                return Err(ValidationError::BrokenLink(height));
            }
            if !self.pow.verify(block) {
                return Err(ValidationError::InvalidProofOfWork(height));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Hash256, Transaction};

    fn mine_on(previous: &Block, pow: &ProofOfWork, txs: Vec<Transaction>) -> Block {
        let previous_hash = previous.hash();
        let result = pow.find_nonce(previous.timestamp + 1, previous_hash, &txs);
        Block::with_timestamp(previous.timestamp + 1, result.nonce, previous_hash, txs)
    }

    fn valid_chain(len: usize, difficulty: usize) -> Vec<Block> {
        let pow = ProofOfWork::new(difficulty);
        let mut chain = vec![Block::genesis()];
        while chain.len() < len {
            let next = mine_on(chain.last().unwrap(), &pow, vec![Transaction::reward("m", 1.0)]);
            chain.push(next);
        }
        chain
    }

    #[test]
    fn test_validate_genesis_only() {
        let validator = ChainValidator::new(2);
        assert!(validator.validate_chain(&[Block::genesis()], &Block::genesis()).is_ok());
    }

    #[test]
    fn test_validate_mined_chain() {
        let validator = ChainValidator::new(2);
        let chain = valid_chain(4, 2);
        assert_eq!(validator.validate_chain(&chain, &Block::genesis()), Ok(()));
    }

    #[test]
    fn test_empty_chain_rejected() {
        let validator = ChainValidator::new(2);
        assert_eq!(
            validator.validate_chain(&[], &Block::genesis()),
            Err(ValidationError::EmptyChain)
        );
    }

    #[test]
    fn test_foreign_genesis_rejected() {
        let validator = ChainValidator::new(2);
        let foreign = Block::with_timestamp(99, 0, Hash256::zero(), Vec::new());
        assert_eq!(
            validator.validate_chain(&[foreign], &Block::genesis()),
            Err(ValidationError::GenesisMismatch)
        );
    }

    #[test]
    fn test_tampered_transaction_breaks_link() {
        let validator = ChainValidator::new(2);
        let mut chain = valid_chain(3, 2);
        chain[1].transactions[0].amount = 1000.0;

        let result = validator.validate_chain(&chain, &Block::genesis());
        // Either the edited block loses its proof or its successor's link breaks
        assert!(matches!(
            result,
            Err(ValidationError::InvalidProofOfWork(1)) | Err(ValidationError::BrokenLink(2))
        ));
    }

    #[test]
    fn test_relinked_block_without_work_rejected() {
        let validator = ChainValidator::new(3);
        let genesis = Block::genesis();
        // Correct link, but a nonce that was never searched for
        let mut block = Block::with_timestamp(1, 0, genesis.hash(), Vec::new());
        while block.hash().leading_zero_digits() >= 3 {
            block.nonce += 1;
        }

        assert_eq!(
            validator.validate_chain(&[genesis.clone(), block], &genesis),
            Err(ValidationError::InvalidProofOfWork(1))
        );
    }

    #[test]
    fn test_wrong_previous_hash_rejected() {
        let validator = ChainValidator::new(1);
        let pow = ProofOfWork::new(1);
        let genesis = Block::genesis();
        let stray = mine_on(&Block::default(), &pow, Vec::new());

        assert_eq!(
            validator.validate_chain(&[genesis.clone(), stray], &genesis),
            Err(ValidationError::BrokenLink(1))
        );
    }
}
