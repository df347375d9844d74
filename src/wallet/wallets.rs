use crate::error::Result;
use crate::utils::{deserialize, serialize};
use crate::wallet::Wallet;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// All local wallets, keyed by address and persisted as one binary file.
pub struct Wallets {
    wallets: HashMap<String, Wallet>,
    file: PathBuf,
}

impl Wallets {
    /// Load the wallet map from `file`, starting empty if the file does not
    /// exist yet. An unreadable or corrupt file is a hard error.
    pub fn new(file: impl AsRef<Path>) -> Result<Wallets> {
        let mut wallets = Wallets {
            wallets: HashMap::new(),
            file: file.as_ref().to_path_buf(),
        };
        wallets.load_from_file()?;
        Ok(wallets)
    }

    pub fn create_wallet(&mut self) -> Result<String> {
        let wallet = Wallet::new()?;
        let address = wallet.get_address();
        self.wallets.insert(address.clone(), wallet);
        self.save_to_file()?;
        Ok(address)
    }

    pub fn get_addresses(&self) -> Vec<String> {
        self.wallets.keys().cloned().collect()
    }

    pub fn get_wallet(&self, address: &str) -> Option<&Wallet> {
        self.wallets.get(address)
    }

    fn load_from_file(&mut self) -> Result<()> {
        if !self.file.exists() {
            return Ok(());
        }

        let mut file = File::open(&self.file)?;
        let metadata = file.metadata()?;
        let mut buf = vec![0; metadata.len() as usize];
        file.read_exact(&mut buf)?;
        self.wallets = deserialize(&buf[..])?;
        Ok(())
    }

    /// Serialize the map into a sibling temp file (owner-only permissions)
    /// and rename it over the target, so readers never observe a torn write.
    fn save_to_file(&self) -> Result<()> {
        let tmp_path = self.file.with_extension("tmp");
        {
            let mut options = OpenOptions::new();
            options.create(true).truncate(true).write(true);
            #[cfg(unix)]
            {
                use std::os::unix::fs::OpenOptionsExt;
                options.mode(0o600);
            }
            let file = options.open(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            let wallets_bytes = serialize(&self.wallets)?;
            writer.write_all(wallets_bytes.as_slice())?;
            writer.flush()?;
        }
        fs::rename(&tmp_path, &self.file)?;
        Ok(())
    }
}
