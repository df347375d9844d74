// The persistent chain store. Sled holds one tree, `blockBucket`, mapping
// block hash to serialized block; the reserved key `LastHashKey` tracks the
// tip. Every mutation happens inside a single sled transaction.

use crate::core::{Block, Transaction};
use crate::error::{BlockchainError, Result};
use data_encoding::HEXLOWER;
use log::{error, info};
use sled::{Db, Tree};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

const LAST_HASH_KEY: &str = "LastHashKey";
const BLOCKS_TREE: &str = "blockBucket";

/// Coinbase payload of the genesis block
const GENESIS_DATA: &str = "genesis";

#[derive(Clone)]
pub struct Blockchain {
    // Cached copy of the LastHashKey entry. Safe because a single process
    // owns the store.
    tip_hash: Arc<RwLock<Vec<u8>>>,
    db: Db,
    difficulty: u32,
}

impl Blockchain {
    /// Open the store, minting a genesis block to `genesis_address` if the
    /// chain does not exist yet.
    pub fn create_blockchain(
        genesis_address: &str,
        db_path: impl AsRef<Path>,
        difficulty: u32,
    ) -> Result<Blockchain> {
        let db = sled::open(db_path.as_ref())?;
        let blocks_tree = db.open_tree(BLOCKS_TREE)?;

        let tip_hash = match blocks_tree.get(LAST_HASH_KEY)? {
            Some(data) => data.to_vec(),
            None => {
                info!("Creating genesis block for address: {genesis_address}");
                let coinbase_tx = Transaction::new_coinbase_tx(genesis_address, GENESIS_DATA)?;
                let block = Block::generate_genesis_block(&coinbase_tx, difficulty)?;
                Self::update_blocks_tree(&blocks_tree, &block)?;
                block.get_hash().to_vec()
            }
        };

        Ok(Blockchain {
            tip_hash: Arc::new(RwLock::new(tip_hash)),
            db,
            difficulty,
        })
    }

    /// Open an existing store; fails if no chain has been created.
    pub fn open_blockchain(db_path: impl AsRef<Path>, difficulty: u32) -> Result<Blockchain> {
        let db = sled::open(db_path.as_ref())?;
        let blocks_tree = db.open_tree(BLOCKS_TREE)?;

        let tip_hash = blocks_tree
            .get(LAST_HASH_KEY)?
            .ok_or_else(|| {
                BlockchainError::Store("No existing blockchain found. Create one first.".to_string())
            })?
            .to_vec();

        Ok(Blockchain {
            tip_hash: Arc::new(RwLock::new(tip_hash)),
            db,
            difficulty,
        })
    }

    /// Insert a block and move the tip, atomically.
    fn update_blocks_tree(blocks_tree: &Tree, block: &Block) -> Result<()> {
        let block_data = block.serialize()?;

        blocks_tree
            .transaction(|tx_db| {
                tx_db.insert(block.get_hash(), block_data.as_slice())?;
                tx_db.insert(LAST_HASH_KEY, block.get_hash())?;
                Ok(())
            })
            .map_err(|e: sled::transaction::TransactionError| {
                BlockchainError::Store(format!("Failed to update blocks tree: {e}"))
            })?;

        Ok(())
    }

    pub fn get_tip_hash(&self) -> Vec<u8> {
        self.tip_hash
            .read()
            .expect("Failed to acquire read lock on tip_hash")
            .clone()
    }

    fn set_tip_hash(&self, new_tip_hash: &[u8]) {
        let mut tip_hash = self
            .tip_hash
            .write()
            .expect("Failed to acquire write lock on tip_hash");
        *tip_hash = new_tip_hash.to_vec();
    }

    pub fn get_difficulty(&self) -> u32 {
        self.difficulty
    }

    /// Verify every transaction, seal a block over them, and append it.
    /// Any invalid transaction aborts before anything is written.
    pub fn mine_block(&self, transactions: &[Transaction]) -> Result<Block> {
        for transaction in transactions {
            match self.verify_transaction(transaction) {
                Ok(true) => {}
                Ok(false) | Err(BlockchainError::UnknownTransaction) => {
                    error!(
                        "invalid transaction: {}",
                        HEXLOWER.encode(transaction.get_id())
                    );
                    return Err(BlockchainError::InvalidTransaction(
                        HEXLOWER.encode(transaction.get_id()),
                    ));
                }
                Err(e) => {
                    error!(
                        "invalid transaction: {}",
                        HEXLOWER.encode(transaction.get_id())
                    );
                    return Err(e);
                }
            }
        }

        let block = Block::new_block(transactions, self.get_tip_hash(), self.difficulty)?;

        let blocks_tree = self.db.open_tree(BLOCKS_TREE)?;
        Self::update_blocks_tree(&blocks_tree, &block)?;
        self.set_tip_hash(block.get_hash());

        info!("Mined block: {}", HEXLOWER.encode(block.get_hash()));
        Ok(block)
    }

    /// Reverse-walk the chain for a transaction with the given id.
    pub fn find_transaction_by_txid(&self, txid: &[u8]) -> Result<Transaction> {
        for block in self.iterator() {
            for transaction in block.get_transactions() {
                if txid.eq(transaction.get_id()) {
                    return Ok(transaction.clone());
                }
            }
        }
        Err(BlockchainError::UnknownTransaction)
    }

    /// Resolve every input's referenced transaction, then sign.
    pub fn sign_transaction(&self, tx: &mut Transaction, pkcs8: &[u8]) -> Result<()> {
        let prev_txs = self.referenced_transactions(tx)?;
        tx.sign(pkcs8, &prev_txs)
    }

    /// Resolve every input's referenced transaction, then verify. Coinbase
    /// transactions verify unconditionally.
    pub fn verify_transaction(&self, tx: &Transaction) -> Result<bool> {
        if tx.is_coinbase() {
            return Ok(true);
        }
        let prev_txs = self.referenced_transactions(tx)?;
        tx.verify(&prev_txs)
    }

    fn referenced_transactions(&self, tx: &Transaction) -> Result<HashMap<String, Transaction>> {
        let mut prev_txs = HashMap::new();
        for input in tx.get_vin() {
            let prev_tx = self.find_transaction_by_txid(input.get_txid())?;
            prev_txs.insert(HEXLOWER.encode(input.get_txid()), prev_tx);
        }
        Ok(prev_txs)
    }

    pub fn iterator(&self) -> BlockchainIterator {
        BlockchainIterator {
            current_hash: self.get_tip_hash(),
            db: self.db.clone(),
        }
    }
}

/// Walks the chain tip to genesis by following `prev_hash` links. The walk
/// ends after the genesis block, whose `prev_hash` is empty, is yielded.
pub struct BlockchainIterator {
    db: Db,
    current_hash: Vec<u8>,
}

impl Iterator for BlockchainIterator {
    type Item = Block;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_hash.is_empty() {
            return None;
        }
        let block_tree = self.db.open_tree(BLOCKS_TREE).ok()?;
        let data = block_tree.get(self.current_hash.as_slice()).ok()??;
        let block = Block::deserialize(data.as_ref()).ok()?;
        self.current_hash = block.get_prev_hash().to_vec();
        Some(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::UTXOScanner;
    use crate::wallet::{hash_pub_key, Wallets};
    use tempfile::tempdir;

    const TEST_DIFFICULTY: u32 = 8;

    fn test_wallets(dir: &Path) -> Wallets {
        Wallets::new(dir.join("wallet.dat")).unwrap()
    }

    #[test]
    fn test_create_mints_genesis_once() {
        let dir = tempdir().unwrap();
        let mut wallets = test_wallets(dir.path());
        let address = wallets.create_wallet().unwrap();

        let blockchain = Blockchain::create_blockchain(
            &address,
            dir.path().join("blockChain.db"),
            TEST_DIFFICULTY,
        )
        .unwrap();
        let tip = blockchain.get_tip_hash();

        let blocks: Vec<Block> = blockchain.iterator().collect();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].get_hash(), tip.as_slice());
        assert!(blocks[0].get_prev_hash().is_empty());
        assert!(blocks[0].get_transactions()[0].is_coinbase());
    }

    #[test]
    fn test_open_without_chain_fails() {
        let dir = tempdir().unwrap();
        assert!(
            Blockchain::open_blockchain(dir.path().join("blockChain.db"), TEST_DIFFICULTY)
                .is_err()
        );
    }

    #[test]
    fn test_find_transaction_by_txid() {
        let dir = tempdir().unwrap();
        let mut wallets = test_wallets(dir.path());
        let address = wallets.create_wallet().unwrap();

        let blockchain = Blockchain::create_blockchain(
            &address,
            dir.path().join("blockChain.db"),
            TEST_DIFFICULTY,
        )
        .unwrap();

        let genesis_tx = blockchain.iterator().next().unwrap().get_transactions()[0].clone();
        let found = blockchain
            .find_transaction_by_txid(genesis_tx.get_id())
            .unwrap();
        assert_eq!(found.get_id(), genesis_tx.get_id());

        assert!(matches!(
            blockchain.find_transaction_by_txid(b"no such txid"),
            Err(BlockchainError::UnknownTransaction)
        ));
    }

    #[test]
    fn test_tampered_signature_is_rejected() {
        let dir = tempdir().unwrap();
        let mut wallets = test_wallets(dir.path());
        let sender = wallets.create_wallet().unwrap();
        let recipient = wallets.create_wallet().unwrap();

        let blockchain = Blockchain::create_blockchain(
            &sender,
            dir.path().join("blockChain.db"),
            TEST_DIFFICULTY,
        )
        .unwrap();
        let scanner = UTXOScanner::new(blockchain.clone());

        let mut tx =
            Transaction::new_utxo_transaction(&sender, &recipient, 4.0, &wallets, &scanner)
                .unwrap();
        assert!(blockchain.verify_transaction(&tx).unwrap());

        tx.tamper_signature(0, 7);
        assert!(!blockchain.verify_transaction(&tx).unwrap());

        let coinbase = Transaction::new_coinbase_tx(&sender, "mining reward").unwrap();
        let tip_before = blockchain.get_tip_hash();
        assert!(blockchain.mine_block(&[coinbase, tx]).is_err());
        assert_eq!(blockchain.get_tip_hash(), tip_before);
    }

    #[test]
    fn test_non_finite_amount_is_rejected() {
        let dir = tempdir().unwrap();
        let mut wallets = test_wallets(dir.path());
        let sender = wallets.create_wallet().unwrap();
        let recipient = wallets.create_wallet().unwrap();

        let blockchain = Blockchain::create_blockchain(
            &sender,
            dir.path().join("blockChain.db"),
            TEST_DIFFICULTY,
        )
        .unwrap();
        let scanner = UTXOScanner::new(blockchain.clone());

        for amount in [f64::NAN, f64::INFINITY, 0.0, -1.0] {
            let result = Transaction::new_utxo_transaction(
                &sender,
                &recipient,
                amount,
                &wallets,
                &scanner,
            );
            assert!(matches!(
                result,
                Err(BlockchainError::InvalidTransaction(_))
            ));
        }
    }

    #[test]
    fn test_mine_block_moves_tip() {
        let dir = tempdir().unwrap();
        let mut wallets = test_wallets(dir.path());
        let sender = wallets.create_wallet().unwrap();
        let recipient = wallets.create_wallet().unwrap();

        let blockchain = Blockchain::create_blockchain(
            &sender,
            dir.path().join("blockChain.db"),
            TEST_DIFFICULTY,
        )
        .unwrap();
        let scanner = UTXOScanner::new(blockchain.clone());
        let genesis_hash = blockchain.get_tip_hash();

        let tx = Transaction::new_utxo_transaction(&sender, &recipient, 4.0, &wallets, &scanner)
            .unwrap();
        let coinbase = Transaction::new_coinbase_tx(&sender, "mining reward").unwrap();
        let block = blockchain.mine_block(&[coinbase, tx]).unwrap();

        assert_eq!(blockchain.get_tip_hash(), block.get_hash().to_vec());
        assert_eq!(block.get_prev_hash(), genesis_hash.as_slice());

        // Every non-coinbase transaction in the chain verifies, and every
        // input resolves to an output owned by its signer.
        for chain_block in blockchain.iterator() {
            for tx in chain_block.get_transactions() {
                assert!(blockchain.verify_transaction(tx).unwrap());
                if tx.is_coinbase() {
                    continue;
                }
                for input in tx.get_vin() {
                    let prev = blockchain.find_transaction_by_txid(input.get_txid()).unwrap();
                    let out = &prev.get_vout()[input.get_vout_index() as usize];
                    assert_eq!(
                        out.get_pub_key_hash(),
                        hash_pub_key(input.get_pub_key()).as_slice()
                    );
                }
            }
        }
    }
}
