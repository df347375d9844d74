// The UTXO scanner walks the chain tip to genesis, tracking which outputs
// the target key has already spent. The reverse walk is load-bearing: an
// input that spends an output always sits in a block no older than the
// output it references, so every spend is recorded before its output is
// considered.

use crate::core::{Blockchain, TXOutput, Transaction};
use crate::wallet::hash_pub_key;
use data_encoding::HEXLOWER;
use std::collections::HashMap;

pub struct UTXOScanner {
    blockchain: Blockchain,
}

impl UTXOScanner {
    pub fn new(blockchain: Blockchain) -> UTXOScanner {
        UTXOScanner { blockchain }
    }

    pub fn get_blockchain(&self) -> &Blockchain {
        &self.blockchain
    }

    /// Transactions holding at least one unspent output locked to
    /// `pub_key_hash`, in scan order (newest block first). Each transaction
    /// appears at most once; callers filter individual outputs.
    pub fn find_utxo_transactions(&self, pub_key_hash: &[u8]) -> Vec<Transaction> {
        let mut txs: Vec<Transaction> = vec![];
        // txid_hex -> output indexes already consumed by the target key
        let mut spent_outputs: HashMap<String, Vec<i64>> = HashMap::new();

        for block in self.blockchain.iterator() {
            for tx in block.get_transactions() {
                let txid_hex = HEXLOWER.encode(tx.get_id());

                let mut included = false;
                for (idx, output) in tx.get_vout().iter().enumerate() {
                    if let Some(spent) = spent_outputs.get(txid_hex.as_str()) {
                        if spent.contains(&(idx as i64)) {
                            continue;
                        }
                    }
                    if output.is_locked_with_key(pub_key_hash) && !included {
                        txs.push(tx.clone());
                        included = true;
                    }
                }

                if tx.is_coinbase() {
                    continue;
                }
                for input in tx.get_vin() {
                    if hash_pub_key(input.get_pub_key()).eq(pub_key_hash) {
                        let input_txid_hex = HEXLOWER.encode(input.get_txid());
                        spent_outputs
                            .entry(input_txid_hex)
                            .or_default()
                            .push(input.get_vout_index());
                    }
                }
            }
        }
        txs
    }

    /// Every unspent output locked to `pub_key_hash`.
    pub fn find_utxo(&self, pub_key_hash: &[u8]) -> Vec<TXOutput> {
        let mut utxos = vec![];
        for tx in self.find_utxo_transactions(pub_key_hash) {
            for output in tx.get_vout() {
                if output.is_locked_with_key(pub_key_hash) {
                    utxos.push(output.clone());
                }
            }
        }
        utxos
    }

    /// Select outputs in scan order until their values cover `amount`.
    /// Returns `(txid_hex -> output indexes, accumulated value)`; the sum
    /// falls short of `amount` when the key cannot cover it.
    pub fn find_need_utxos(
        &self,
        pub_key_hash: &[u8],
        amount: f64,
    ) -> (HashMap<String, Vec<u64>>, f64) {
        let mut utxos: HashMap<String, Vec<u64>> = HashMap::new();
        let mut accumulated = 0.0;

        for tx in self.find_utxo_transactions(pub_key_hash) {
            let txid_hex = HEXLOWER.encode(tx.get_id());
            for (idx, output) in tx.get_vout().iter().enumerate() {
                if !output.is_locked_with_key(pub_key_hash) {
                    continue;
                }
                if accumulated < amount {
                    utxos.entry(txid_hex.clone()).or_default().push(idx as u64);
                    accumulated += output.get_value();
                    if accumulated >= amount {
                        return (utxos, accumulated);
                    }
                }
            }
        }
        (utxos, accumulated)
    }
}
