// Block data structure

use crate::core::{Hash256, sha256, Transaction, Serializable};
use super::serialize::{write_varint, read_array, read_count};
use std::io::Read;
use std::time::{SystemTime, UNIX_EPOCH};

/// Block - a sealed, hash-linked snapshot of transactions
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    /// Creation time, nanoseconds since the Unix epoch (informational)
    pub timestamp: i64,
    /// Nonce that satisfied proof-of-work
    pub nonce: u64,
    /// Hash of the previous block
    pub previous_hash: Hash256,
    /// Transactions in admission order
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// `transactions` must be an owned snapshot, not a live pool.
    pub fn with_timestamp(
        timestamp: i64,
        nonce: u64,
        previous_hash: Hash256,
        transactions: Vec<Transaction>,
    ) -> Self {
        Self {
            timestamp,
            nonce,
            previous_hash,
            transactions,
        }
    }

    /// The genesis block shared by every ledger: fixed timestamp, no
    /// transactions, linked to the hash of an all-default block
    pub fn genesis() -> Self {
        Self::with_timestamp(0, 0, Block::default().hash(), Vec::new())
    }

    /// Content hash, recomputed on every call
    pub fn hash(&self) -> Hash256 {
        sha256(&self.serialize())
    }
}

/// Current wall-clock time in nanoseconds
pub fn now_nanos() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as i64)
        .unwrap_or_default()
}

impl Serializable for Block {
    fn write_to(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.timestamp.to_le_bytes());
        buf.extend_from_slice(&self.nonce.to_le_bytes());
        buf.extend_from_slice(self.previous_hash.as_bytes());

        write_varint(buf, self.transactions.len() as u64);
        for tx in &self.transactions {
            tx.write_to(buf);
        }
    }

    fn read_from<R: Read + ?Sized>(reader: &mut R) -> Result<Self, String> {
        let timestamp = i64::from_le_bytes(read_array(reader)?);
        let nonce = u64::from_le_bytes(read_array(reader)?);
        let previous_hash = Hash256::new(read_array(reader)?);

        let tx_count = read_count(reader)?;
        let mut transactions = Vec::with_capacity(tx_count.min(1024));
        for _ in 0..tx_count {
            transactions.push(Transaction::read_from(reader)?);
        }

        Ok(Self {
            timestamp,
            nonce,
            previous_hash,
            transactions,
        })
    }
}
