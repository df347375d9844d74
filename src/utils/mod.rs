//! Utility functions and helpers
//!
//! Cryptographic primitives, encoding functions, and the serialization
//! layer used throughout the blockchain.

pub mod crypto;
pub mod serialization;

pub use crypto::{
    base58_decode, base58_encode, current_timestamp, ecdsa_p256_sign, ecdsa_p256_verify,
    new_key_pair, ripemd160_digest, sha256_digest,
};

pub use serialization::{deserialize, serialize};
