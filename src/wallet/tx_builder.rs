// Transaction builder

use crate::core::{Transaction, sign, encode_public_key, encode_signature};
use crate::ledger::TransactionRequest;
use crate::wallet::{Keystore, Address, KeyPair};

/// Builds signed submission requests from keystore keys
pub struct TransactionBuilder<'a> {
    keystore: &'a Keystore,
}

impl<'a> TransactionBuilder<'a> {
    /// Create a new transaction builder
    pub fn new(keystore: &'a Keystore) -> Self {
        Self { keystore }
    }

    /// Build a request sending `amount` from `from` to `to`
    pub fn build(&self, from: &Address, to: &str, amount: f64) -> Result<TransactionRequest, String> {
        let keypair = self.keystore
            .get(from)
            .ok_or("Sender address not found in keystore")?;

        if to.is_empty() {
            return Err("Recipient address is empty".to_string());
        }
        if !amount.is_finite() || amount < 0.0 {
            return Err(format!("Invalid amount: {}", amount));
        }

        Ok(Self::sign_request(keypair, to, amount))
    }

    /// Sign a transfer with `keypair` and package it in text form
    pub fn sign_request(keypair: &KeyPair, to: &str, amount: f64) -> TransactionRequest {
        let tx = Transaction::new(keypair.address.as_str(), to, amount);
        let signature = sign(&keypair.secret_key, &tx);

        TransactionRequest {
            sender: tx.sender,
            recipient: tx.recipient,
            amount: tx.amount,
            sender_public_key: encode_public_key(&keypair.public_key),
            signature: encode_signature(&signature),
        }
    }
}
