//! Error handling for the blockchain
//!
//! One error enum covers every failure the crate can surface. User-input
//! faults (bad address, missing wallet, not enough funds) abort the current
//! operation; store and crypto faults are fatal because partial state must
//! never be committed.

use std::fmt;

/// Result type alias for blockchain operations
pub type Result<T> = std::result::Result<T, BlockchainError>;

#[derive(Debug, Clone)]
pub enum BlockchainError {
    /// Address failed base58 or checksum validation
    InvalidAddress(String),
    /// No wallet stored for the given address
    WalletNotFound(String),
    /// Spendable outputs do not cover the requested amount
    InsufficientFunds { required: f64, available: f64 },
    /// A transaction failed verification (bad signature or bad reference)
    InvalidTransaction(String),
    /// No transaction with the requested id exists in the chain
    UnknownTransaction,
    /// Database open/read/write or serialization errors
    Store(String),
    /// Key generation or signing errors
    Crypto(String),
}

impl fmt::Display for BlockchainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockchainError::InvalidAddress(addr) => write!(f, "Invalid address: {addr}"),
            BlockchainError::WalletNotFound(addr) => {
                write!(f, "No wallet found for address: {addr}")
            }
            BlockchainError::InsufficientFunds {
                required,
                available,
            } => {
                write!(
                    f,
                    "Insufficient funds: required {required}, available {available}"
                )
            }
            BlockchainError::InvalidTransaction(msg) => write!(f, "Invalid transaction: {msg}"),
            BlockchainError::UnknownTransaction => write!(f, "Unknown transaction id"),
            BlockchainError::Store(msg) => write!(f, "Store error: {msg}"),
            BlockchainError::Crypto(msg) => write!(f, "Cryptographic error: {msg}"),
        }
    }
}

impl std::error::Error for BlockchainError {}

impl From<std::io::Error> for BlockchainError {
    fn from(err: std::io::Error) -> Self {
        BlockchainError::Store(err.to_string())
    }
}

impl From<sled::Error> for BlockchainError {
    fn from(err: sled::Error) -> Self {
        BlockchainError::Store(err.to_string())
    }
}

impl From<bincode::error::EncodeError> for BlockchainError {
    fn from(err: bincode::error::EncodeError) -> Self {
        BlockchainError::Store(err.to_string())
    }
}

impl From<bincode::error::DecodeError> for BlockchainError {
    fn from(err: bincode::error::DecodeError) -> Self {
        BlockchainError::Store(err.to_string())
    }
}
