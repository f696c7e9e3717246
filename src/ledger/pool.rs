// Pending transaction pool

use crate::core::Transaction;
use std::collections::HashSet;

/// Pool-local identifier of an admitted transaction
pub type PoolId = u64;

/// FIFO pool of admitted, not-yet-sealed transactions.
///
/// Entries carry a sequence id so a sealing pass can remove exactly the
/// transactions it snapshotted, even when identical transactions (such as
/// repeated rewards) are pending.
#[derive(Debug, Default)]
pub struct TransactionPool {
    entries: Vec<(PoolId, Transaction)>,
    next_id: PoolId,
}

impl TransactionPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transaction, returning its id
    pub fn push(&mut self, tx: Transaction) -> PoolId {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push((id, tx));
        id
    }

    /// Copy of the current contents with their ids
    pub fn snapshot(&self) -> (Vec<PoolId>, Vec<Transaction>) {
        self.entries.iter().map(|(id, tx)| (*id, tx.clone())).unzip()
    }

    /// Remove the given ids, keeping everything else in order
    pub fn remove(&mut self, ids: &[PoolId]) {
        let sealed: HashSet<PoolId> = ids.iter().copied().collect();
        self.entries.retain(|(id, _)| !sealed.contains(id));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn transactions(&self) -> Vec<Transaction> {
        self.entries.iter().map(|(_, tx)| tx.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
