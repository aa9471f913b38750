use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use modal_watchtower::{Address, Ed25519Key, SigningKey};

/// On-disk form of the watchtower signing key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Keyfile {
    pub address: Address,
    pub public_key: String,
    pub private_key: String,
}

impl Keyfile {
    pub fn from_key(key: &Ed25519Key) -> Self {
        Self {
            address: key.address(),
            public_key: hex::encode(key.public_key()),
            private_key: key.secret_hex(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read key file {}", path.display()))?;
        let keyfile = serde_json::from_str(&contents).context("Failed to parse key file")?;
        Ok(keyfile)
    }

    /// Write the key file, refusing to overwrite an existing one
    pub fn save(&self, path: &Path) -> Result<()> {
        if path.exists() {
            bail!(
                "Key file already exists at {}. Please choose a different path or remove the existing file.",
                path.display()
            );
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write key file {}", path.display()))?;
        Ok(())
    }

    pub fn into_key(self) -> Result<Ed25519Key> {
        let key = Ed25519Key::from_hex(&self.private_key)?;
        let public_key = hex::decode(self.public_key.trim_start_matches("0x"))
            .context("Failed to decode public key")?;
        if public_key != key.public_key() {
            bail!("key file public key does not match its private key");
        }
        if key.address() != self.address {
            bail!(
                "key file address {} does not match its private key ({})",
                self.address,
                key.address()
            );
        }
        Ok(key)
    }
}
