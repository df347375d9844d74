use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "pocket-chain", about = "A pedagogical UTXO blockchain")]
pub struct Opt {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(name = "createWallet", about = "Create a wallet and print its new address")]
    CreateWallet,
    #[command(name = "listAddress", about = "Print all known wallet addresses")]
    ListAddress,
    #[command(
        name = "createBlockChain",
        about = "Initialize the chain with a coinbase to ADDRESS"
    )]
    CreateBlockChain {
        #[arg(help = "The address to receive the genesis block reward")]
        address: String,
    },
    #[command(
        name = "send",
        about = "Build, sign, mine, and append a block with one transaction"
    )]
    Send {
        #[arg(help = "Source wallet address")]
        from: String,
        #[arg(help = "Destination wallet address")]
        to: String,
        #[arg(help = "Amount to send")]
        amount: f64,
        #[arg(
            long = "miner",
            help = "Address credited with the block reward (defaults to the sender)"
        )]
        miner: Option<String>,
    },
    #[command(name = "printChain", about = "Print all blocks from tip to genesis")]
    PrintChain,
    #[command(name = "getBalance", about = "Sum the unspent outputs of ADDRESS")]
    GetBalance {
        #[arg(help = "The wallet address")]
        address: String,
    },
}
