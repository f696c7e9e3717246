// Signature codec: fixed-width hex forms of keys and signatures, sign/verify

use crate::core::Transaction;
use secp256k1::{Secp256k1, Message, PublicKey, SecretKey, ecdsa::Signature};
use std::fmt;

/// x || y, 32 bytes each
pub const PUBLIC_KEY_HEX_LEN: usize = 128;
/// r || s, 32 bytes each
pub const SIGNATURE_HEX_LEN: usize = 128;
pub const PRIVATE_KEY_HEX_LEN: usize = 64;

/// Uncompressed SEC1 point tag
const UNCOMPRESSED_TAG: u8 = 0x04;

/// Codec errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Text has the wrong number of characters
    WrongLength { expected: usize, actual: usize },
    /// Text is not hexadecimal
    InvalidHex(String),
    /// Decoded bytes are not a valid key
    InvalidKey(String),
    /// Decoded bytes are not a valid signature
    InvalidSignature(String),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CodecError::WrongLength { expected, actual } => {
                write!(f, "Wrong length: expected {} hex chars, got {}", expected, actual)
            }
            CodecError::InvalidHex(e) => write!(f, "Invalid hex: {}", e),
            CodecError::InvalidKey(e) => write!(f, "Invalid key: {}", e),
            CodecError::InvalidSignature(e) => write!(f, "Invalid signature: {}", e),
        }
    }
}

impl std::error::Error for CodecError {}

fn decode_fixed_hex(text: &str, expected: usize) -> Result<Vec<u8>, CodecError> {
    if text.len() != expected {
        return Err(CodecError::WrongLength { expected, actual: text.len() });
    }
    hex::decode(text).map_err(|e| CodecError::InvalidHex(e.to_string()))
}

/// Encode a public key as its two affine coordinates in hex
pub fn encode_public_key(key: &PublicKey) -> String {
    hex::encode(&key.serialize_uncompressed()[1..])
}

pub fn decode_public_key(text: &str) -> Result<PublicKey, CodecError> {
    let coordinates = decode_fixed_hex(text, PUBLIC_KEY_HEX_LEN)?;
    let mut point = Vec::with_capacity(65);
    point.push(UNCOMPRESSED_TAG);
    point.extend_from_slice(&coordinates);
    PublicKey::from_slice(&point).map_err(|e| CodecError::InvalidKey(e.to_string()))
}

/// Encode a signature as its two scalars (r, s) in hex
pub fn encode_signature(signature: &Signature) -> String {
    hex::encode(signature.serialize_compact())
}

pub fn decode_signature(text: &str) -> Result<Signature, CodecError> {
    let scalars = decode_fixed_hex(text, SIGNATURE_HEX_LEN)?;
    Signature::from_compact(&scalars).map_err(|e| CodecError::InvalidSignature(e.to_string()))
}

pub fn encode_private_key(key: &SecretKey) -> String {
    hex::encode(key.secret_bytes())
}

pub fn decode_private_key(text: &str) -> Result<SecretKey, CodecError> {
    let bytes = decode_fixed_hex(text, PRIVATE_KEY_HEX_LEN)?;
    SecretKey::from_slice(&bytes).map_err(|e| CodecError::InvalidKey(e.to_string()))
}

/// Sign the transaction digest. The caller attaches the result.
pub fn sign(secret_key: &SecretKey, tx: &Transaction) -> Signature {
    let secp = Secp256k1::signing_only();
    let message = Message::from_digest(tx.digest().0);
    secp.sign_ecdsa(&message, secret_key)
}

/// Verify a signature over the transaction digest
pub fn verify(public_key: &PublicKey, signature: &Signature, tx: &Transaction) -> bool {
    let secp = Secp256k1::verification_only();
    let message = Message::from_digest(tx.digest().0);
    secp.verify_ecdsa(&message, signature, public_key).is_ok()
}

/// Verify from the textual forms; any malformed input yields false
pub fn verify_text(public_key: &str, signature: &str, tx: &Transaction) -> bool {
    match (decode_public_key(public_key), decode_signature(signature)) {
        (Ok(key), Ok(sig)) => verify(&key, &sig, tx),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secp256k1::rand::rngs::OsRng;

    fn keypair() -> (SecretKey, PublicKey) {
        let secp = Secp256k1::new();
        let secret_key = SecretKey::new(&mut OsRng);
        let public_key = secret_key.public_key(&secp);
        (secret_key, public_key)
    }

    #[test]
    fn test_sign_and_verify() {
        let (secret_key, public_key) = keypair();
        let tx = Transaction::new("alice", "bob", 3.5);

        let signature = sign(&secret_key, &tx);
        assert!(verify(&public_key, &signature, &tx));
    }

    #[test]
    fn test_verify_fails_for_altered_transaction() {
        let (secret_key, public_key) = keypair();
        let tx = Transaction::new("alice", "bob", 3.5);
        let signature = sign(&secret_key, &tx);

        assert!(!verify(&public_key, &signature, &Transaction::new("alicE", "bob", 3.5)));
        assert!(!verify(&public_key, &signature, &Transaction::new("alice", "bobb", 3.5)));
        assert!(!verify(&public_key, &signature, &Transaction::new("alice", "bob", 3.6)));
    }

    #[test]
    fn test_verify_fails_for_altered_signature_bytes() {
        let (secret_key, public_key) = keypair();
        let tx = Transaction::new("alice", "bob", 3.5);
        let compact = sign(&secret_key, &tx).serialize_compact();

        for index in [0, 17, 31, 32, 50, 63] {
            let mut altered = compact;
            altered[index] ^= 0x01;
            let accepted = Signature::from_compact(&altered)
                .map(|sig| verify(&public_key, &sig, &tx))
                .unwrap_or(false);
            assert!(!accepted, "altered byte {} was accepted", index);
        }
    }

    #[test]
    fn test_verify_fails_for_other_key() {
        let (secret_key, _) = keypair();
        let (_, other_public) = keypair();
        let tx = Transaction::new("alice", "bob", 1.0);

        assert!(!verify(&other_public, &sign(&secret_key, &tx), &tx));
    }

    #[test]
    fn test_text_forms_have_fixed_width() {
        let (secret_key, public_key) = keypair();
        let signature = sign(&secret_key, &Transaction::new("a", "b", 1.0));

        assert_eq!(encode_public_key(&public_key).len(), PUBLIC_KEY_HEX_LEN);
        assert_eq!(encode_signature(&signature).len(), SIGNATURE_HEX_LEN);
        assert_eq!(encode_private_key(&secret_key).len(), PRIVATE_KEY_HEX_LEN);

        assert_eq!(decode_public_key(&encode_public_key(&public_key)).unwrap(), public_key);
        assert_eq!(decode_signature(&encode_signature(&signature)).unwrap(), signature);
        assert_eq!(decode_private_key(&encode_private_key(&secret_key)).unwrap(), secret_key);
    }

    #[test]
    fn test_decode_rejects_wrong_length() {
        let (_, public_key) = keypair();
        let text = encode_public_key(&public_key);

        assert_eq!(
            decode_public_key(&text[2..]),
            Err(CodecError::WrongLength { expected: 128, actual: 126 })
        );
        assert!(matches!(
            decode_signature("00"),
            Err(CodecError::WrongLength { .. })
        ));
    }

    #[test]
    fn test_verify_text_fails_closed() {
        let tx = Transaction::new("alice", "bob", 1.0);

        assert!(!verify_text("", "", &tx));
        assert!(!verify_text(&"zz".repeat(64), &"00".repeat(64), &tx));
        assert!(!verify_text(&"00".repeat(64), &"00".repeat(64), &tx));
    }
}
