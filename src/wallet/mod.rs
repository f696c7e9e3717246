// Client-side keys and signed transfer requests

mod keystore;
mod tx_builder;

pub use keystore::{Address, KeyPair, Keystore};
pub use tx_builder::TransactionBuilder;
