//! # Pocket Chain
//!
//! A small, complete UTXO blockchain: persistent append-only chain of
//! proof-of-work blocks holding ECDSA-signed transactions between
//! Bitcoin-style addresses.
//!
//! ## Layout
//! - `core/`: blocks, transactions, the chain store, proof-of-work
//! - `wallet/`: P-256 key management and address encoding
//! - `storage/`: the chain-walking UTXO scanner
//! - `config/`: paths and mining parameters from the environment
//! - `utils/`: hashing, base58, ECDSA, and the serialization layer
//! - `cli/`: command definitions for the binary

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod storage;
pub mod utils;
pub mod wallet;

// Re-export commonly used types for convenience
pub use crate::cli::{Command, Opt};
pub use crate::config::{Config, GLOBAL_CONFIG};
pub use crate::core::{
    Block, Blockchain, BlockchainIterator, ProofOfWork, TXInput, TXOutput, Transaction, SUBSIDY,
};
pub use crate::error::{BlockchainError, Result};
pub use crate::storage::UTXOScanner;
pub use crate::utils::{
    base58_decode, base58_encode, current_timestamp, ecdsa_p256_sign, ecdsa_p256_verify,
    new_key_pair, ripemd160_digest, sha256_digest,
};
pub use crate::wallet::{
    convert_address, hash_pub_key, pub_key_hash_from_address, validate_address, Wallet, Wallets,
    ADDRESS_CHECK_SUM_LEN,
};
