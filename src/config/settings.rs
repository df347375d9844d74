use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::env;
use std::sync::RwLock;

pub static GLOBAL_CONFIG: Lazy<Config> = Lazy::new(Config::new);

static DEFAULT_DB_PATH: &str = "blockChain.db";
static DEFAULT_WALLET_FILE: &str = "wallet.dat";
const DEFAULT_DIFFICULTY: u32 = 16;

const DB_PATH_KEY: &str = "BLOCKCHAIN_DB";
const WALLET_FILE_KEY: &str = "WALLET_FILE";
const DIFFICULTY_KEY: &str = "MINING_DIFFICULTY";

/// Process-wide settings, seeded from the environment.
pub struct Config {
    inner: RwLock<HashMap<String, String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Config {
        let mut map = HashMap::new();

        let db_path = env::var(DB_PATH_KEY).unwrap_or_else(|_| String::from(DEFAULT_DB_PATH));
        map.insert(String::from(DB_PATH_KEY), db_path);

        let wallet_file =
            env::var(WALLET_FILE_KEY).unwrap_or_else(|_| String::from(DEFAULT_WALLET_FILE));
        map.insert(String::from(WALLET_FILE_KEY), wallet_file);

        if let Ok(difficulty) = env::var(DIFFICULTY_KEY) {
            map.insert(String::from(DIFFICULTY_KEY), difficulty);
        }

        Config {
            inner: RwLock::new(map),
        }
    }

    pub fn get_db_path(&self) -> String {
        let inner = self
            .inner
            .read()
            .expect("Failed to acquire read lock on config");
        inner
            .get(DB_PATH_KEY)
            .expect("Database path should always be present in config")
            .clone()
    }

    pub fn get_wallet_file(&self) -> String {
        let inner = self
            .inner
            .read()
            .expect("Failed to acquire read lock on config");
        inner
            .get(WALLET_FILE_KEY)
            .expect("Wallet file should always be present in config")
            .clone()
    }

    /// Leading-zero bits a block hash must satisfy.
    pub fn get_difficulty(&self) -> u32 {
        let inner = self
            .inner
            .read()
            .expect("Failed to acquire read lock on config");
        inner
            .get(DIFFICULTY_KEY)
            .and_then(|d| d.parse().ok())
            .unwrap_or(DEFAULT_DIFFICULTY)
    }
}
