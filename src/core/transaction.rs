// Value-transfer transaction

use crate::core::{Hash256, sha256, Serializable};
use super::serialize::{write_string, read_string, read_array};
use secp256k1::ecdsa::Signature;
use std::fmt;
use std::io::Read;

/// Reserved sender identity for block rewards; never signed
pub const MINING_SENDER: &str = "THE BLOCKCHAIN";

/// Transaction - moves `amount` from `sender` to `recipient`
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// Sender address
    pub sender: String,
    /// Recipient address
    pub recipient: String,
    /// Transferred value
    pub amount: f64,
    /// ECDSA signature over `digest()`; absent for rewards
    pub signature: Option<Signature>,
}

impl Transaction {
    /// Create an unsigned transaction
    pub fn new(sender: impl Into<String>, recipient: impl Into<String>, amount: f64) -> Self {
        Self {
            sender: sender.into(),
            recipient: recipient.into(),
            amount,
            signature: None,
        }
    }

    /// Create a block reward paid by the reserved minting identity
    pub fn reward(recipient: impl Into<String>, amount: f64) -> Self {
        Self::new(MINING_SENDER, recipient, amount)
    }

    /// Attach a signature
    pub fn with_signature(mut self, signature: Signature) -> Self {
        self.signature = Some(signature);
        self
    }

    pub fn is_reward(&self) -> bool {
        self.sender == MINING_SENDER
    }

    /// Hash of (sender, recipient, amount); the signature is not covered
    pub fn digest(&self) -> Hash256 {
        let mut buf = Vec::new();
        self.write_signed_fields(&mut buf);
        sha256(&buf)
    }

    fn write_signed_fields(&self, buf: &mut Vec<u8>) {
        write_string(buf, &self.sender);
        write_string(buf, &self.recipient);
        buf.extend_from_slice(&self.amount.to_le_bytes());
    }
}

impl Serializable for Transaction {
    fn write_to(&self, buf: &mut Vec<u8>) {
        self.write_signed_fields(buf);
        match &self.signature {
            Some(signature) => {
                buf.push(1);
                buf.extend_from_slice(&signature.serialize_compact());
            }
            None => buf.push(0),
        }
    }

    fn read_from<R: Read + ?Sized>(reader: &mut R) -> Result<Self, String> {
        let sender = read_string(reader)?;
        let recipient = read_string(reader)?;
        let amount = f64::from_le_bytes(read_array(reader)?);

        let [flag]: [u8; 1] = read_array(reader)?;
        let signature = match flag {
            0 => None,
            1 => {
                let compact: [u8; 64] = read_array(reader)?;
                let signature = Signature::from_compact(&compact)
                    .map_err(|e| format!("Invalid signature encoding: {}", e))?;
                Some(signature)
            }
            other => return Err(format!("Invalid signature flag: {}", other)),
        };

        Ok(Self {
            sender,
            recipient,
            amount,
            signature,
        })
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} -> {}: {}", self.sender, self.recipient, self.amount)
    }
}
