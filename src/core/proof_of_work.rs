use crate::core::Block;
use crate::utils::sha256_digest;
use data_encoding::HEXLOWER;
use log::info;
use num_bigint::{BigInt, Sign};
use std::borrow::Borrow;
use std::ops::ShlAssign;

/// Nonce search over a block header. The hash, read as a 256-bit big-endian
/// integer, must fall below `1 << (256 - difficulty)`.
pub struct ProofOfWork {
    block: Block,
    target: BigInt,
}

const MAX_NONCE: i64 = i64::MAX;

impl ProofOfWork {
    pub fn new_proof_of_work(block: Block) -> ProofOfWork {
        let mut target = BigInt::from(1);
        target.shl_assign(256 - block.get_difficulty());
        ProofOfWork { block, target }
    }

    /// Re-derive the hash of a sealed block and check it against the target.
    pub fn validate(block: &Block) -> bool {
        let pow = ProofOfWork::new_proof_of_work(block.clone());
        let hash = sha256_digest(pow.prepare_data(block.get_nonce()).as_slice());
        if hash != block.get_hash() {
            return false;
        }
        let hash_int = BigInt::from_bytes_be(Sign::Plus, hash.as_slice());
        hash_int < pow.target
    }

    /// Header bytes the hash commits to: everything except the hash itself.
    fn prepare_data(&self, nonce: i64) -> Vec<u8> {
        let mut data_bytes = vec![];
        data_bytes.extend(self.block.get_version().to_be_bytes());
        data_bytes.extend(self.block.get_prev_hash());
        data_bytes.extend(self.block.get_merkle_root());
        data_bytes.extend(self.block.get_timestamp().to_be_bytes());
        data_bytes.extend(self.block.get_difficulty().to_be_bytes());
        data_bytes.extend(nonce.to_be_bytes());
        data_bytes
    }

    /// Iterate the nonce from zero until the hash clears the target.
    /// Deterministic for identical block contents.
    pub fn run(&self) -> (i64, Vec<u8>) {
        let mut nonce = 0;
        let mut hash = Vec::new();
        info!(
            "Mining block with difficulty {}",
            self.block.get_difficulty()
        );
        while nonce < MAX_NONCE {
            let data = self.prepare_data(nonce);
            hash = sha256_digest(data.as_slice());
            let hash_int = BigInt::from_bytes_be(Sign::Plus, hash.as_slice());

            if hash_int.lt(self.target.borrow()) {
                info!("Sealed block: {}", HEXLOWER.encode(hash.as_slice()));
                break;
            }
            nonce += 1;
        }
        (nonce, hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Transaction;
    use crate::wallet::Wallet;

    fn create_test_block(difficulty: u32) -> Block {
        let wallet = Wallet::new().unwrap();
        let coinbase_tx = Transaction::new_coinbase_tx(&wallet.get_address(), "pow test").unwrap();
        Block::new_block(&[coinbase_tx], vec![], difficulty).unwrap()
    }

    #[test]
    fn test_mined_block_validates() {
        let block = create_test_block(8);
        assert!(ProofOfWork::validate(&block));
    }

    #[test]
    fn test_hash_is_below_target() {
        let difficulty = 8;
        let block = create_test_block(difficulty);

        let mut target = BigInt::from(1);
        target.shl_assign(256 - difficulty);
        let hash_int = BigInt::from_bytes_be(Sign::Plus, block.get_hash());
        assert!(hash_int < target);
    }

    #[test]
    fn test_higher_difficulty_means_smaller_target() {
        let easy = ProofOfWork::new_proof_of_work(create_test_block(4));
        let hard = ProofOfWork::new_proof_of_work(create_test_block(8));
        assert!(hard.target < easy.target);
    }

    #[test]
    fn test_prepare_data_is_deterministic() {
        let pow = ProofOfWork::new_proof_of_work(create_test_block(4));

        assert_eq!(pow.prepare_data(12345), pow.prepare_data(12345));
        assert_ne!(pow.prepare_data(12345), pow.prepare_data(54321));
    }

    #[test]
    fn test_different_nonce_changes_the_hash() {
        let block = create_test_block(8);
        let pow = ProofOfWork::new_proof_of_work(block.clone());

        let forged = sha256_digest(pow.prepare_data(block.get_nonce() + 1).as_slice());
        assert_ne!(forged, block.get_hash());
    }
}
