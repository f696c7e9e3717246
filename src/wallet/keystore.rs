// Key pairs, addresses and the local keystore

use crate::core::{hash160, double_sha256, encode_public_key, encode_private_key, decode_private_key};
use secp256k1::{Secp256k1, SecretKey, PublicKey};
use rand::rngs::OsRng;
use std::collections::BTreeMap;
use std::path::Path;
use std::fs;
use serde::{Serialize, Deserialize};

const ADDRESS_VERSION: u8 = 0x00;
const CHECKSUM_LEN: usize = 4;

/// Ledger address: Base58Check of the public key hash
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(pub String);

impl Address {
    /// Derive the address of a public key
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        let pubkey_hash = hash160(&public_key.serialize_uncompressed());

        let mut payload = Vec::with_capacity(1 + 20 + CHECKSUM_LEN);
        payload.push(ADDRESS_VERSION);
        payload.extend_from_slice(&pubkey_hash);
        let checksum = double_sha256(&payload);
        payload.extend_from_slice(&checksum[..CHECKSUM_LEN]);

        Self(bs58::encode(payload).into_string())
    }

    /// Get address string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check the Base58 encoding, version and checksum
    pub fn is_valid(&self) -> bool {
        let Ok(bytes) = bs58::decode(&self.0).into_vec() else {
            return false;
        };
        if bytes.len() != 1 + 20 + CHECKSUM_LEN || bytes[0] != ADDRESS_VERSION {
            return false;
        }
        let (payload, checksum) = bytes.split_at(bytes.len() - CHECKSUM_LEN);
        double_sha256(payload)[..CHECKSUM_LEN] == *checksum
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Key pair
#[derive(Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
    pub address: Address,
}

impl KeyPair {
    /// Fresh key from the OS random source
    pub fn generate() -> Self {
        Self::from_secret_key(SecretKey::new(&mut OsRng))
    }

    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let public_key = secret_key.public_key(&Secp256k1::signing_only());
        Self {
            address: Address::from_public_key(&public_key),
            secret_key,
            public_key,
        }
    }

    /// Restore from the 64-char hex private key
    pub fn from_private_key_hex(text: &str) -> Result<Self, String> {
        decode_private_key(text)
            .map(Self::from_secret_key)
            .map_err(|e| format!("Invalid private key: {}", e))
    }

    pub fn private_key_hex(&self) -> String {
        encode_private_key(&self.secret_key)
    }

    pub fn public_key_hex(&self) -> String {
        encode_public_key(&self.public_key)
    }
}

/// On-disk form: private keys only, addresses are re-derived and checked
#[derive(Serialize, Deserialize)]
struct KeystoreFile {
    default: Option<Address>,
    keys: Vec<StoredKey>,
}

#[derive(Serialize, Deserialize)]
struct StoredKey {
    address: Address,
    private_key: String,
}

/// Local key pairs indexed by address. The first key added becomes the
/// default sender.
#[derive(Default)]
pub struct Keystore {
    keys: BTreeMap<Address, KeyPair>,
    default: Option<Address>,
}

impl Keystore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate and store a new key pair
    pub fn create(&mut self) -> Address {
        self.insert(KeyPair::generate())
    }

    /// Store an existing private key
    pub fn import(&mut self, private_key_hex: &str) -> Result<Address, String> {
        Ok(self.insert(KeyPair::from_private_key_hex(private_key_hex)?))
    }

    fn insert(&mut self, keypair: KeyPair) -> Address {
        let address = keypair.address.clone();
        self.default.get_or_insert_with(|| address.clone());
        self.keys.insert(address.clone(), keypair);
        address
    }

    pub fn get(&self, address: &Address) -> Option<&KeyPair> {
        self.keys.get(address)
    }

    /// Addresses in sorted order
    pub fn addresses(&self) -> impl Iterator<Item = &Address> {
        self.keys.keys()
    }

    pub fn default_address(&self) -> Option<&Address> {
        self.default.as_ref()
    }

    pub fn set_default(&mut self, address: &Address) -> Result<(), String> {
        if !self.keys.contains_key(address) {
            return Err(format!("Address {} not in keystore", address));
        }
        self.default = Some(address.clone());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Write the keystore as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), String> {
        let file = KeystoreFile {
            default: self.default.clone(),
            keys: self
                .keys
                .values()
                .map(|kp| StoredKey {
                    address: kp.address.clone(),
                    private_key: kp.private_key_hex(),
                })
                .collect(),
        };

        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| format!("Failed to encode keystore: {}", e))?;
        fs::write(path.as_ref(), json)
            .map_err(|e| format!("Failed to write {}: {}", path.as_ref().display(), e))
    }

    /// Read a keystore written by `save`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let json = fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read {}: {}", path.as_ref().display(), e))?;
        let file: KeystoreFile = serde_json::from_str(&json)
            .map_err(|e| format!("Failed to decode keystore: {}", e))?;

        let mut keystore = Self::new();
        for stored in file.keys {
            if keystore.import(&stored.private_key)? != stored.address {
                return Err(format!("Stored key does not match address {}", stored.address));
            }
        }
        if let Some(default) = file.default {
            keystore.set_default(&default)?;
        }

        Ok(keystore)
    }
}
