use ring::digest::{Context, SHA256};
use ring::rand::SystemRandom;
use ring::signature::{
    EcdsaKeyPair, UnparsedPublicKey, ECDSA_P256_SHA256_FIXED, ECDSA_P256_SHA256_FIXED_SIGNING,
};
use ripemd::{Digest as RipemdDigest, Ripemd160};

use crate::error::{BlockchainError, Result};
use std::time::{SystemTime, UNIX_EPOCH};

/// Current Unix time in seconds
pub fn current_timestamp() -> Result<i64> {
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| BlockchainError::Crypto(format!("System time error: {e}")))?
        .as_secs();

    if duration > i64::MAX as u64 {
        return Err(BlockchainError::Crypto("Timestamp overflow".to_string()));
    }

    Ok(duration as i64)
}

pub fn sha256_digest(data: &[u8]) -> Vec<u8> {
    let mut context = Context::new(&SHA256);
    context.update(data);
    let digest = context.finish();
    digest.as_ref().to_vec()
}

pub fn ripemd160_digest(data: &[u8]) -> Vec<u8> {
    let mut hasher = Ripemd160::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

pub fn base58_encode(data: &[u8]) -> String {
    bs58::encode(data).into_string()
}

pub fn base58_decode(data: &str) -> Result<Vec<u8>> {
    bs58::decode(data)
        .into_vec()
        .map_err(|e| BlockchainError::InvalidAddress(format!("Invalid base58 encoding: {e}")))
}

/// Generate a fresh P-256 key pair, returned as a PKCS#8 document
pub fn new_key_pair() -> Result<Vec<u8>> {
    let rng = SystemRandom::new();
    let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, &rng)
        .map_err(|e| BlockchainError::Crypto(format!("Failed to generate ECDSA key pair: {e}")))?
        .as_ref()
        .to_vec();
    Ok(pkcs8)
}

/// Sign a message with a P-256 key.
///
/// The FIXED signature format is `r || s` with both halves zero-padded to
/// 32 bytes, so splitting a signature in half is always unambiguous.
pub fn ecdsa_p256_sign(pkcs8: &[u8], message: &[u8]) -> Result<Vec<u8>> {
    let rng = SystemRandom::new();
    let key_pair = EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, pkcs8, &rng)
        .map_err(|e| {
            BlockchainError::Crypto(format!("Failed to create key pair from PKCS8: {e}"))
        })?;
    let signature = key_pair
        .sign(&rng, message)
        .map_err(|e| BlockchainError::Crypto(format!("Failed to sign message: {e}")))?
        .as_ref()
        .to_vec();
    Ok(signature)
}

/// Verify a fixed-width P-256 signature against a bare `X || Y` public key.
///
/// The 0x04 uncompressed-point tag is not stored on chain; it is restored
/// here before handing the key to ring.
pub fn ecdsa_p256_verify(pub_key_xy: &[u8], message: &[u8], signature: &[u8]) -> bool {
    let mut point = Vec::with_capacity(pub_key_xy.len() + 1);
    point.push(0x04);
    point.extend_from_slice(pub_key_xy);
    let peer_public_key = UnparsedPublicKey::new(&ECDSA_P256_SHA256_FIXED, point);
    peer_public_key.verify(message, signature).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ring::signature::KeyPair;

    fn public_key_xy(pkcs8: &[u8]) -> Vec<u8> {
        let rng = SystemRandom::new();
        let key_pair =
            EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, pkcs8, &rng).unwrap();
        // Strip the 0x04 uncompressed-point tag
        key_pair.public_key().as_ref()[1..].to_vec()
    }

    #[test]
    fn test_sha256_digest_length() {
        assert_eq!(sha256_digest(b"hello").len(), 32);
    }

    #[test]
    fn test_ripemd160_digest_length() {
        assert_eq!(ripemd160_digest(b"hello").len(), 20);
    }

    #[test]
    fn test_base58_round_trip() {
        let data = vec![0x00, 0x01, 0xff, 0x7a, 0x00];
        let encoded = base58_encode(&data);
        let decoded = base58_decode(&encoded).unwrap();
        assert_eq!(data, decoded);
    }

    #[test]
    fn test_base58_rejects_invalid_characters() {
        assert!(base58_decode("0OIl").is_err());
    }

    #[test]
    fn test_sign_and_verify() {
        let pkcs8 = new_key_pair().unwrap();
        let pub_key = public_key_xy(&pkcs8);
        assert_eq!(pub_key.len(), 64);

        let message = sha256_digest(b"spend output 0");
        let signature = ecdsa_p256_sign(&pkcs8, &message).unwrap();
        assert_eq!(signature.len(), 64);

        assert!(ecdsa_p256_verify(&pub_key, &message, &signature));
    }

    #[test]
    fn test_tampered_signature_fails() {
        let pkcs8 = new_key_pair().unwrap();
        let pub_key = public_key_xy(&pkcs8);

        let message = sha256_digest(b"spend output 0");
        let mut signature = ecdsa_p256_sign(&pkcs8, &message).unwrap();
        signature[10] ^= 0x01;

        assert!(!ecdsa_p256_verify(&pub_key, &message, &signature));
    }

    #[test]
    fn test_wrong_message_fails() {
        let pkcs8 = new_key_pair().unwrap();
        let pub_key = public_key_xy(&pkcs8);

        let signature = ecdsa_p256_sign(&pkcs8, &sha256_digest(b"original")).unwrap();
        assert!(!ecdsa_p256_verify(
            &pub_key,
            &sha256_digest(b"forged"),
            &signature
        ));
    }
}
