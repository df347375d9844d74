use clap::Parser;
use data_encoding::HEXLOWER;
use log::{error, LevelFilter};
use pocket_chain::{
    convert_address, hash_pub_key, pub_key_hash_from_address, validate_address, Blockchain,
    Command, Opt, Transaction, UTXOScanner, Wallets, GLOBAL_CONFIG,
};
use std::process;

fn main() {
    env_logger::builder().filter_level(LevelFilter::Info).init();

    let opt = Opt::parse();
    if let Err(e) = run_command(opt.command) {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn run_command(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::CreateWallet => {
            let mut wallets = Wallets::new(GLOBAL_CONFIG.get_wallet_file())?;
            let address = wallets.create_wallet()?;
            println!("Your new address: {address}");
        }
        Command::ListAddress => {
            let wallets = Wallets::new(GLOBAL_CONFIG.get_wallet_file())?;
            for address in wallets.get_addresses() {
                println!("{address}");
            }
        }
        Command::CreateBlockChain { address } => {
            if !validate_address(&address) {
                return Err(format!("Invalid address: {address}").into());
            }
            Blockchain::create_blockchain(
                &address,
                GLOBAL_CONFIG.get_db_path(),
                GLOBAL_CONFIG.get_difficulty(),
            )?;
            println!("Done!");
        }
        Command::Send {
            from,
            to,
            amount,
            miner,
        } => {
            if !validate_address(&from) {
                return Err(format!("Invalid sender address: {from}").into());
            }
            if !validate_address(&to) {
                return Err(format!("Invalid recipient address: {to}").into());
            }
            // Block reward policy: the miner flag wins, the sender is the
            // default.
            let miner_address = miner.unwrap_or_else(|| from.clone());
            if !validate_address(&miner_address) {
                return Err(format!("Invalid miner address: {miner_address}").into());
            }

            let blockchain = Blockchain::open_blockchain(
                GLOBAL_CONFIG.get_db_path(),
                GLOBAL_CONFIG.get_difficulty(),
            )?;
            let scanner = UTXOScanner::new(blockchain.clone());
            let wallets = Wallets::new(GLOBAL_CONFIG.get_wallet_file())?;

            let transaction =
                Transaction::new_utxo_transaction(&from, &to, amount, &wallets, &scanner)?;
            let coinbase = Transaction::new_coinbase_tx(&miner_address, "mining reward")?;
            blockchain.mine_block(&[coinbase, transaction])?;
            println!("Success!");
        }
        Command::PrintChain => {
            let blockchain = Blockchain::open_blockchain(
                GLOBAL_CONFIG.get_db_path(),
                GLOBAL_CONFIG.get_difficulty(),
            )?;
            for block in blockchain.iterator() {
                println!("Version: {}", block.get_version());
                println!("Prev hash: {}", HEXLOWER.encode(block.get_prev_hash()));
                println!("Merkle root: {}", HEXLOWER.encode(block.get_merkle_root()));
                println!("Timestamp: {}", block.get_timestamp());
                println!("Difficulty: {}", block.get_difficulty());
                println!("Nonce: {}", block.get_nonce());
                println!("Hash: {}", HEXLOWER.encode(block.get_hash()));

                for tx in block.get_transactions() {
                    println!("- Transaction: {}", HEXLOWER.encode(tx.get_id()));
                    if tx.is_coinbase() {
                        let data = String::from_utf8_lossy(tx.get_vin()[0].get_pub_key());
                        println!("-- Coinbase data: {data}");
                    } else {
                        for input in tx.get_vin() {
                            let pub_key_hash = hash_pub_key(input.get_pub_key());
                            println!(
                                "-- Input txid = {}, vout = {}, from = {}",
                                HEXLOWER.encode(input.get_txid()),
                                input.get_vout_index(),
                                convert_address(pub_key_hash.as_slice()),
                            );
                        }
                    }
                    for output in tx.get_vout() {
                        println!(
                            "-- Output value = {}, to = {}",
                            output.get_value(),
                            convert_address(output.get_pub_key_hash()),
                        );
                    }
                }
                println!();
            }
        }
        Command::GetBalance { address } => {
            if !validate_address(&address) {
                return Err(format!("Invalid address: {address}").into());
            }
            let pub_key_hash = pub_key_hash_from_address(&address)?;

            let blockchain = Blockchain::open_blockchain(
                GLOBAL_CONFIG.get_db_path(),
                GLOBAL_CONFIG.get_difficulty(),
            )?;
            let scanner = UTXOScanner::new(blockchain);
            let balance: f64 = scanner
                .find_utxo(&pub_key_hash)
                .iter()
                .map(|utxo| utxo.get_value())
                .sum();
            println!("Balance of {address}: {balance}");
        }
    }
    Ok(())
}
