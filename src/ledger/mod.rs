// In-memory ledger: the chain and the pending transaction pool

mod pool;
mod request;

pub use pool::{TransactionPool, PoolId};
pub use request::TransactionRequest;

use crate::config::LedgerConfig;
use crate::consensus::ProofOfWork;
use crate::core::{
    Block, Hash256, Transaction, MINING_SENDER, now_nanos, verify, decode_public_key,
    decode_signature,
};
use secp256k1::{PublicKey, ecdsa::Signature};
use std::sync::{Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Ledger errors
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerError {
    /// Malformed or missing transaction fields
    InvalidTransaction(String),
    /// Signature does not verify against the sender's public key
    InvalidSignature,
    /// Opt-in balance check failed
    InsufficientBalance { required: f64, available: f64 },
    /// The chain has no last block to build on
    EmptyChain,
    /// The chain tip moved while the nonce search ran
    StaleTip,
}

impl std::fmt::Display for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            LedgerError::InvalidTransaction(msg) => write!(f, "Invalid transaction: {}", msg),
            LedgerError::InvalidSignature => write!(f, "Signature verification failed"),
            LedgerError::InsufficientBalance { required, available } => {
                write!(f, "Insufficient balance: required {}, available {}", required, available)
            }
            LedgerError::EmptyChain => write!(f, "Chain has no blocks"),
            LedgerError::StaleTip => write!(f, "Chain tip changed during mining"),
        }
    }
}

impl std::error::Error for LedgerError {}

/// Pool snapshot taken before the nonce search
struct SealCandidate {
    reward_id: PoolId,
    pool_ids: Vec<PoolId>,
    transactions: Vec<Transaction>,
    previous_hash: Hash256,
}

struct ChainState {
    chain: Vec<Block>,
    pool: TransactionPool,
}

impl ChainState {
    fn tip_hash(&self) -> Option<Hash256> {
        self.chain.last().map(Block::hash)
    }

    fn balance(&self, address: &str) -> f64 {
        let mut total = 0.0;
        for tx in self.chain.iter().flat_map(|block| &block.transactions) {
            if tx.recipient == address {
                total += tx.amount;
            }
            if tx.sender == address {
                total -= tx.amount;
            }
        }
        total
    }
}

/// The node's ledger.
///
/// Chain and pool sit behind one reader-writer lock, so every mutation is
/// serialized and readers always see a whole chain. A separate mining guard
/// keeps at most one nonce search in flight; the search itself runs without
/// holding the state lock.
///
/// Admission does not check balances unless `LedgerConfig::enforce_balance`
/// is set: by default a sender may overspend, and `balance` is advisory.
pub struct Ledger {
    address: String,
    port: u16,
    config: LedgerConfig,
    pow: ProofOfWork,
    state: RwLock<ChainState>,
    neighbors: RwLock<Vec<String>>,
    mining: Mutex<()>,
}

impl Ledger {
    /// Create a ledger holding only the genesis block
    pub fn new(address: impl Into<String>, port: u16, config: LedgerConfig) -> Self {
        let pow = ProofOfWork::new(config.difficulty);
        Self {
            address: address.into(),
            port,
            config,
            pow,
            state: RwLock::new(ChainState {
                chain: vec![Block::genesis()],
                pool: TransactionPool::new(),
            }),
            neighbors: RwLock::new(Vec::new()),
            mining: Mutex::new(()),
        }
    }

    /// Address that collects this node's mining rewards
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Port this node serves on
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    fn read_state(&self) -> RwLockReadGuard<'_, ChainState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, ChainState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Admit a transaction into the pool.
    ///
    /// The reserved minting sender is admitted without a signature. Any
    /// other sender must present a public key and a signature that verifies
    /// over the transaction digest.
    pub fn submit(
        &self,
        sender: &str,
        recipient: &str,
        amount: f64,
        public_key: Option<&PublicKey>,
        signature: Option<&Signature>,
    ) -> Result<(), LedgerError> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(LedgerError::InvalidTransaction(format!("invalid amount: {}", amount)));
        }
        if recipient.is_empty() {
            return Err(LedgerError::InvalidTransaction("empty recipient".to_string()));
        }

        if sender == MINING_SENDER {
            self.write_state().pool.push(Transaction::reward(recipient, amount));
            return Ok(());
        }

        if sender.is_empty() {
            return Err(LedgerError::InvalidTransaction("empty sender".to_string()));
        }

        let (public_key, signature) = match (public_key, signature) {
            (Some(key), Some(sig)) => (key, sig),
            _ => {
                return Err(LedgerError::InvalidTransaction(
                    "missing public key or signature".to_string(),
                ));
            }
        };

        let tx = Transaction::new(sender, recipient, amount);
        if !verify(public_key, signature, &tx) {
            log::warn!("Rejected transaction from {}: signature verification failed", sender);
            return Err(LedgerError::InvalidSignature);
        }

        let mut state = self.write_state();
        if self.config.enforce_balance {
            let available = state.balance(sender);
            if available < amount {
                return Err(LedgerError::InsufficientBalance { required: amount, available });
            }
        }
        state.pool.push(tx.with_signature(*signature));
        log::debug!("Admitted transaction {} -> {}: {}", sender, recipient, amount);

        Ok(())
    }

    /// Validate and decode a textual request, then admit it
    pub fn submit_request(&self, request: &TransactionRequest) -> Result<(), LedgerError> {
        request.validate().map_err(LedgerError::InvalidTransaction)?;

        if request.sender == MINING_SENDER {
            return self.submit(&request.sender, &request.recipient, request.amount, None, None);
        }

        let public_key = decode_public_key(&request.sender_public_key)
            .map_err(|e| LedgerError::InvalidTransaction(format!("public key: {}", e)))?;
        let signature = decode_signature(&request.signature)
            .map_err(|e| LedgerError::InvalidTransaction(format!("signature: {}", e)))?;

        self.submit(
            &request.sender,
            &request.recipient,
            request.amount,
            Some(&public_key),
            Some(&signature),
        )
    }

    /// Seal the pool into a new block.
    ///
    /// Adds the reward, snapshots the pool, searches for a nonce without
    /// holding the state lock, then appends the block and removes exactly the
    /// snapshotted transactions. Transactions admitted during the search stay
    /// pending. Blocks the caller until a nonce is found.
    pub fn mine(&self) -> Result<Block, LedgerError> {
        let _mining = self.mining.lock().unwrap_or_else(PoisonError::into_inner);

        let candidate = self.begin_seal()?;
        let timestamp = now_nanos();
        let result = self.pow.find_nonce(timestamp, candidate.previous_hash, &candidate.transactions);
        log::debug!("actions=mining, attempts={}, duration={:?}", result.attempts, result.duration);

        self.commit_seal(candidate, timestamp, result.nonce)
    }

    /// Add the reward and snapshot the pool
    fn begin_seal(&self) -> Result<SealCandidate, LedgerError> {
        let mut state = self.write_state();
        let previous_hash = state.tip_hash().ok_or(LedgerError::EmptyChain)?;
        let reward_id = state
            .pool
            .push(Transaction::reward(&self.address, self.config.mining_reward));
        let (pool_ids, transactions) = state.pool.snapshot();

        Ok(SealCandidate { reward_id, pool_ids, transactions, previous_hash })
    }

    /// Append the sealed block unless the tip moved since `begin_seal`
    fn commit_seal(&self, candidate: SealCandidate, timestamp: i64, nonce: u64) -> Result<Block, LedgerError> {
        let mut state = self.write_state();
        if state.tip_hash() != Some(candidate.previous_hash) {
            state.pool.remove(&[candidate.reward_id]);
            log::warn!("actions=mining, status=stale, previous_hash={}", candidate.previous_hash);
            return Err(LedgerError::StaleTip);
        }

        let block = Block::with_timestamp(timestamp, nonce, candidate.previous_hash, candidate.transactions);
        state.chain.push(block.clone());
        state.pool.remove(&candidate.pool_ids);

        log::info!("actions=mining, status=success, height={}, transactions={}, hash={}",
            state.chain.len() - 1, block.transactions.len(), block.hash());

        Ok(block)
    }

    /// Replace the chain wholesale if `candidate` is still strictly longer.
    /// On replacement the pool is discarded.
    pub fn replace_chain(&self, candidate: Vec<Block>) -> bool {
        let mut state = self.write_state();
        if candidate.len() <= state.chain.len() {
            return false;
        }

        log::info!("Replacing chain of length {} with length {}", state.chain.len(), candidate.len());
        state.chain = candidate;
        state.pool.clear();
        true
    }

    /// Replay the whole chain: received minus sent. Pending transactions are
    /// not counted.
    pub fn balance(&self, address: &str) -> f64 {
        self.read_state().balance(address)
    }

    pub fn chain(&self) -> Vec<Block> {
        self.read_state().chain.clone()
    }

    pub fn chain_len(&self) -> usize {
        self.read_state().chain.len()
    }

    pub fn last_block(&self) -> Option<Block> {
        self.read_state().chain.last().cloned()
    }

    pub fn genesis(&self) -> Option<Block> {
        self.read_state().chain.first().cloned()
    }

    pub fn transaction_pool(&self) -> Vec<Transaction> {
        self.read_state().pool.transactions()
    }

    pub fn clear_pool(&self) {
        self.write_state().pool.clear();
    }

    pub fn neighbors(&self) -> Vec<String> {
        self.neighbors.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn set_neighbors(&self, neighbors: Vec<String>) {
        log::info!("Neighbors: {:?}", neighbors);
        *self.neighbors.write().unwrap_or_else(PoisonError::into_inner) = neighbors;
    }
}
