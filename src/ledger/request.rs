// Transaction submission request, as it crosses the node boundary

use crate::core::{Serializable, MINING_SENDER, read_string, write_string, read_array};
use serde::{Serialize, Deserialize};
use std::io::Read;

/// Textual transaction submission: addresses, amount, and the sender's
/// public key and signature in their fixed-width hex forms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub sender: String,
    pub recipient: String,
    pub amount: f64,
    pub sender_public_key: String,
    pub signature: String,
}

impl TransactionRequest {
    /// Check that every required field is present and well-formed
    pub fn validate(&self) -> Result<(), String> {
        if self.sender.is_empty() {
            return Err("missing sender".to_string());
        }
        if self.recipient.is_empty() {
            return Err("missing recipient".to_string());
        }
        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(format!("invalid amount: {}", self.amount));
        }
        if self.sender != MINING_SENDER {
            if self.sender_public_key.is_empty() {
                return Err("missing sender public key".to_string());
            }
            if self.signature.is_empty() {
                return Err("missing signature".to_string());
            }
        }
        Ok(())
    }
}

impl Serializable for TransactionRequest {
    fn write_to(&self, buf: &mut Vec<u8>) {
        write_string(buf, &self.sender);
        write_string(buf, &self.recipient);
        buf.extend_from_slice(&self.amount.to_le_bytes());
        write_string(buf, &self.sender_public_key);
        write_string(buf, &self.signature);
    }

    fn read_from<R: Read + ?Sized>(reader: &mut R) -> Result<Self, String> {
        Ok(Self {
            sender: read_string(reader)?,
            recipient: read_string(reader)?,
            amount: f64::from_le_bytes(read_array(reader)?),
            sender_public_key: read_string(reader)?,
            signature: read_string(reader)?,
        })
    }
}
