// The transaction system: value moves by consuming previous outputs and
// creating new ones, Bitcoin's UTXO model. Signing and verification are pure
// over a caller-supplied map of referenced transactions, so the crypto layer
// never touches storage.

use crate::error::{BlockchainError, Result};
use crate::storage::UTXOScanner;
use crate::utils::{deserialize, ecdsa_p256_sign, ecdsa_p256_verify, serialize, sha256_digest};
use crate::wallet::{hash_pub_key, pub_key_hash_from_address, validate_address, Wallets};
use data_encoding::HEXLOWER;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Block reward minted by every coinbase
pub const SUBSIDY: f64 = 12.5;

/// Output index carried by a coinbase input
const COINBASE_INDEX: i64 = -1;

/// A reference to a previous transaction output, plus the proof of ownership.
///
/// For a coinbase input `txid` is empty, `vout_index` is -1 and `pub_key`
/// carries arbitrary miner data instead of a public key.
#[derive(Debug, Clone, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct TXInput {
    txid: Vec<u8>,
    vout_index: i64,
    signature: Vec<u8>,
    pub_key: Vec<u8>,
}

impl TXInput {
    pub fn new(txid: &[u8], vout_index: i64, pub_key: &[u8]) -> TXInput {
        TXInput {
            txid: txid.to_vec(),
            vout_index,
            signature: vec![],
            pub_key: pub_key.to_vec(),
        }
    }

    pub fn get_txid(&self) -> &[u8] {
        self.txid.as_slice()
    }

    pub fn get_vout_index(&self) -> i64 {
        self.vout_index
    }

    pub fn get_signature(&self) -> &[u8] {
        self.signature.as_slice()
    }

    pub fn get_pub_key(&self) -> &[u8] {
        self.pub_key.as_slice()
    }
}

/// An amount locked to the hash of the recipient's public key.
#[derive(Debug, Clone, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct TXOutput {
    value: f64,
    pub_key_hash: Vec<u8>,
}

impl TXOutput {
    pub fn new(value: f64, address: &str) -> Result<TXOutput> {
        // NaN fails every comparison, so it must be ruled out explicitly.
        if value < 0.0 || !value.is_finite() {
            return Err(BlockchainError::InvalidTransaction(
                "output value must be non-negative".to_string(),
            ));
        }
        if !validate_address(address) {
            return Err(BlockchainError::InvalidAddress(address.to_string()));
        }

        Ok(TXOutput {
            value,
            pub_key_hash: pub_key_hash_from_address(address)?,
        })
    }

    pub fn get_value(&self) -> f64 {
        self.value
    }

    pub fn get_pub_key_hash(&self) -> &[u8] {
        self.pub_key_hash.as_slice()
    }

    pub fn is_locked_with_key(&self, pub_key_hash: &[u8]) -> bool {
        self.pub_key_hash.eq(pub_key_hash)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct Transaction {
    id: Vec<u8>,
    vin: Vec<TXInput>,
    vout: Vec<TXOutput>,
}

impl Transaction {
    /// The coinbase mints the block reward. Its single input references
    /// nothing and carries `data` as opaque bytes.
    pub fn new_coinbase_tx(to: &str, data: &str) -> Result<Transaction> {
        let tx_input = TXInput {
            txid: vec![],
            vout_index: COINBASE_INDEX,
            signature: vec![],
            pub_key: data.as_bytes().to_vec(),
        };
        let tx_output = TXOutput::new(SUBSIDY, to)?;

        let mut tx = Transaction {
            id: vec![],
            vin: vec![tx_input],
            vout: vec![tx_output],
        };
        tx.set_id()?;
        Ok(tx)
    }

    /// Build, fund and sign a transfer of `amount` from `from` to `to`.
    ///
    /// Spendable outputs are gathered in scan order; a change output back to
    /// the sender is appended when the selection overshoots.
    pub fn new_utxo_transaction(
        from: &str,
        to: &str,
        amount: f64,
        wallets: &Wallets,
        scanner: &UTXOScanner,
    ) -> Result<Transaction> {
        if amount <= 0.0 || !amount.is_finite() {
            return Err(BlockchainError::InvalidTransaction(
                "amount must be positive".to_string(),
            ));
        }
        if !validate_address(from) {
            return Err(BlockchainError::InvalidAddress(from.to_string()));
        }
        if !validate_address(to) {
            return Err(BlockchainError::InvalidAddress(to.to_string()));
        }

        let wallet = wallets
            .get_wallet(from)
            .ok_or_else(|| BlockchainError::WalletNotFound(from.to_string()))?;
        let pub_key_hash = hash_pub_key(wallet.get_public_key());

        let (utxos, accumulated) = scanner.find_need_utxos(pub_key_hash.as_slice(), amount);
        if accumulated < amount {
            return Err(BlockchainError::InsufficientFunds {
                required: amount,
                available: accumulated,
            });
        }

        let mut inputs = vec![];
        for (txid_hex, indexes) in utxos {
            let txid = HEXLOWER.decode(txid_hex.as_bytes()).map_err(|e| {
                BlockchainError::InvalidTransaction(format!("invalid transaction id: {e}"))
            })?;
            for index in indexes {
                inputs.push(TXInput::new(
                    txid.as_slice(),
                    index as i64,
                    wallet.get_public_key(),
                ));
            }
        }

        let mut outputs = vec![TXOutput::new(amount, to)?];
        if accumulated > amount {
            outputs.push(TXOutput::new(accumulated - amount, from)?);
        }

        let mut tx = Transaction {
            id: vec![],
            vin: inputs,
            vout: outputs,
        };
        tx.set_id()?;

        scanner
            .get_blockchain()
            .sign_transaction(&mut tx, wallet.get_pkcs8())?;
        Ok(tx)
    }

    /// A transaction mints coins iff it has exactly one input that
    /// references nothing.
    pub fn is_coinbase(&self) -> bool {
        self.vin.len() == 1
            && self.vin[0].txid.is_empty()
            && self.vin[0].vout_index == COINBASE_INDEX
    }

    /// Hash of the canonical serialization with `id` zeroed
    fn hash(&self) -> Result<Vec<u8>> {
        let tx_copy = Transaction {
            id: vec![],
            vin: self.vin.clone(),
            vout: self.vout.clone(),
        };
        Ok(sha256_digest(tx_copy.serialize()?.as_slice()))
    }

    fn set_id(&mut self) -> Result<()> {
        self.id = self.hash()?;
        Ok(())
    }

    /// Copy with every input's signature and pub_key blanked; the base of
    /// the per-input signing digest.
    fn trimmed_copy(&self) -> Transaction {
        let inputs = self
            .vin
            .iter()
            .map(|input| TXInput {
                txid: input.txid.clone(),
                vout_index: input.vout_index,
                signature: vec![],
                pub_key: vec![],
            })
            .collect();
        Transaction {
            id: self.id.clone(),
            vin: inputs,
            vout: self.vout.clone(),
        }
    }

    /// Sign every input against the outputs it references.
    ///
    /// `prev_txs` maps hex txid to the referenced transaction; the chain
    /// store assembles it (`Blockchain::sign_transaction`).
    pub fn sign(
        &mut self,
        pkcs8: &[u8],
        prev_txs: &HashMap<String, Transaction>,
    ) -> Result<()> {
        if self.is_coinbase() {
            return Ok(());
        }

        let mut tx_copy = self.trimmed_copy();

        for idx in 0..self.vin.len() {
            let prev_out = referenced_output(&tx_copy.vin[idx], prev_txs)?.clone();

            // The digest commits to the referenced output's owner: the
            // copy's pub_key slot temporarily holds that pub_key_hash.
            tx_copy.vin[idx].pub_key = prev_out.pub_key_hash;
            tx_copy.set_id()?;
            tx_copy.vin[idx].pub_key = vec![];

            let signature = ecdsa_p256_sign(pkcs8, tx_copy.id.as_slice())?;
            self.vin[idx].signature = signature;
        }
        Ok(())
    }

    /// Check every input's signature against the same digest the signer
    /// committed to. A missing or unresolvable reference is an error; a bad
    /// signature yields `Ok(false)`.
    pub fn verify(&self, prev_txs: &HashMap<String, Transaction>) -> Result<bool> {
        if self.is_coinbase() {
            return Ok(true);
        }

        let mut tx_copy = self.trimmed_copy();

        for (idx, vin) in self.vin.iter().enumerate() {
            let prev_out = referenced_output(vin, prev_txs)?.clone();

            tx_copy.vin[idx].pub_key = prev_out.pub_key_hash;
            tx_copy.set_id()?;
            tx_copy.vin[idx].pub_key = vec![];

            if !ecdsa_p256_verify(
                vin.pub_key.as_slice(),
                tx_copy.id.as_slice(),
                vin.signature.as_slice(),
            ) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub fn get_id(&self) -> &[u8] {
        self.id.as_slice()
    }

    pub fn get_vin(&self) -> &[TXInput] {
        self.vin.as_slice()
    }

    pub fn get_vout(&self) -> &[TXOutput] {
        self.vout.as_slice()
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        serialize(self)
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Transaction> {
        deserialize(bytes)
    }

    #[cfg(test)]
    pub(crate) fn tamper_signature(&mut self, input_index: usize, byte_index: usize) {
        self.vin[input_index].signature[byte_index] ^= 0x01;
    }
}

/// Resolve the output an input spends, through the caller-built map.
fn referenced_output<'a>(
    input: &TXInput,
    prev_txs: &'a HashMap<String, Transaction>,
) -> Result<&'a TXOutput> {
    let txid_hex = HEXLOWER.encode(input.txid.as_slice());
    let prev_tx = prev_txs.get(&txid_hex).ok_or_else(|| {
        BlockchainError::InvalidTransaction(format!("referenced transaction {txid_hex} not found"))
    })?;
    if prev_tx.id.is_empty() {
        return Err(BlockchainError::InvalidTransaction(format!(
            "referenced transaction {txid_hex} has no id"
        )));
    }

    let out_idx = usize::try_from(input.vout_index).map_err(|_| {
        BlockchainError::InvalidTransaction("negative output index".to_string())
    })?;
    prev_tx.vout.get(out_idx).ok_or_else(|| {
        BlockchainError::InvalidTransaction(format!(
            "output index {out_idx} out of range for transaction {txid_hex}"
        ))
    })
}
