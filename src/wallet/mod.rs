//! Wallet management and address encoding
//!
//! Key-pair creation, Bitcoin-style address math, and the persistent
//! address-to-wallet map.

#[allow(clippy::module_inception)]
pub mod wallet;
pub mod wallets;

pub use wallet::{
    convert_address, hash_pub_key, pub_key_hash_from_address, validate_address, Wallet,
    ADDRESS_CHECK_SUM_LEN,
};
pub use wallets::Wallets;
