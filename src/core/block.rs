use crate::core::{ProofOfWork, Transaction};
use crate::error::{BlockchainError, Result};
use crate::utils::{current_timestamp, deserialize, serialize, sha256_digest};
use serde::{Deserialize, Serialize};

/// Header layout version; there is only one.
const BLOCK_VERSION: i32 = 0;

#[derive(Debug, Clone, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct Block {
    version: i32,
    prev_hash: Vec<u8>,
    merkle_root: Vec<u8>,
    timestamp: i64,
    difficulty: u32,
    nonce: i64,
    hash: Vec<u8>,
    transactions: Vec<Transaction>,
}

impl Block {
    /// Assemble a block over `transactions`, stamp it, and seal it with
    /// proof-of-work. The first transaction must be the coinbase.
    pub fn new_block(
        transactions: &[Transaction],
        prev_hash: Vec<u8>,
        difficulty: u32,
    ) -> Result<Block> {
        if transactions.is_empty() {
            return Err(BlockchainError::InvalidTransaction(
                "block must contain at least one transaction".to_string(),
            ));
        }
        if !transactions[0].is_coinbase() {
            return Err(BlockchainError::InvalidTransaction(
                "first transaction in a block must be a coinbase".to_string(),
            ));
        }

        let mut block = Block {
            version: BLOCK_VERSION,
            prev_hash,
            merkle_root: Self::hash_transactions(transactions),
            timestamp: current_timestamp()?,
            difficulty,
            nonce: 0,
            hash: vec![],
            transactions: transactions.to_vec(),
        };

        let pow = ProofOfWork::new_proof_of_work(block.clone());
        let (nonce, hash) = pow.run();
        block.nonce = nonce;
        block.hash = hash;

        Ok(block)
    }

    /// The first block: coinbase only, empty previous hash.
    pub fn generate_genesis_block(coinbase: &Transaction, difficulty: u32) -> Result<Block> {
        Block::new_block(&[coinbase.clone()], vec![], difficulty)
    }

    /// Digest over the concatenated transaction ids. A flat digest, not a
    /// Merkle tree.
    pub fn hash_transactions(transactions: &[Transaction]) -> Vec<u8> {
        let mut tx_hashes = vec![];
        for transaction in transactions {
            tx_hashes.extend(transaction.get_id());
        }
        sha256_digest(tx_hashes.as_slice())
    }

    pub fn verify_merkle_root(&self) -> bool {
        Self::hash_transactions(&self.transactions) == self.merkle_root
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        serialize(self)
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Block> {
        deserialize(bytes)
    }

    pub fn get_version(&self) -> i32 {
        self.version
    }

    pub fn get_prev_hash(&self) -> &[u8] {
        self.prev_hash.as_slice()
    }

    pub fn get_merkle_root(&self) -> &[u8] {
        self.merkle_root.as_slice()
    }

    pub fn get_timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn get_difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn get_nonce(&self) -> i64 {
        self.nonce
    }

    pub fn get_hash(&self) -> &[u8] {
        self.hash.as_slice()
    }

    pub fn get_transactions(&self) -> &[Transaction] {
        self.transactions.as_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::Wallet;

    const TEST_DIFFICULTY: u32 = 8;

    fn coinbase() -> Transaction {
        let wallet = Wallet::new().unwrap();
        Transaction::new_coinbase_tx(&wallet.get_address(), "test block").unwrap()
    }

    #[test]
    fn test_new_block_is_sealed() {
        let block = Block::new_block(&[coinbase()], vec![], TEST_DIFFICULTY).unwrap();

        assert_eq!(block.get_version(), 0);
        assert!(block.get_prev_hash().is_empty());
        assert_eq!(block.get_hash().len(), 32);
        assert!(ProofOfWork::validate(&block));
    }

    #[test]
    fn test_merkle_root_is_flat_digest_of_txids() {
        let tx = coinbase();
        let block = Block::new_block(&[tx.clone()], vec![], TEST_DIFFICULTY).unwrap();

        let expected = sha256_digest(tx.get_id());
        assert_eq!(block.get_merkle_root(), expected.as_slice());
        assert!(block.verify_merkle_root());
    }

    #[test]
    fn test_empty_block_is_rejected() {
        assert!(Block::new_block(&[], vec![], TEST_DIFFICULTY).is_err());
    }

    #[test]
    fn test_serialization_round_trip() {
        let block = Block::new_block(&[coinbase()], vec![1, 2, 3], TEST_DIFFICULTY).unwrap();

        let bytes = block.serialize().unwrap();
        let decoded = Block::deserialize(&bytes).unwrap();

        assert_eq!(decoded.get_hash(), block.get_hash());
        assert_eq!(decoded.get_prev_hash(), block.get_prev_hash());
        assert_eq!(decoded.get_merkle_root(), block.get_merkle_root());
        assert_eq!(decoded.get_timestamp(), block.get_timestamp());
        assert_eq!(decoded.get_nonce(), block.get_nonce());
        assert_eq!(decoded.get_transactions().len(), 1);
    }
}
