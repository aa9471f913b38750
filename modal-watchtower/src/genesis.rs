use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::block::{Block, ExtraData, Header};
use crate::memory::{AccountNonces, MemoryExecutor};
use crate::primitives::{Address, Hash};

/// Fixed genesis timestamp so every node derives the same genesis hash
pub const GENESIS_TIMESTAMP: u64 = 0;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisAccount {
    #[serde(default)]
    pub nonce: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genesis {
    pub gas_limit: u64,
    #[serde(default)]
    pub timestamp: u64,
    #[serde(default)]
    pub accounts: BTreeMap<Address, GenesisAccount>,
}

impl Genesis {
    pub fn new(gas_limit: u64) -> Self {
        Self {
            gas_limit,
            timestamp: GENESIS_TIMESTAMP,
            accounts: BTreeMap::new(),
        }
    }

    pub fn with_account(mut self, address: Address, nonce: u64) -> Self {
        self.accounts.insert(address, GenesisAccount { nonce });
        self
    }

    pub fn from_filepath(path: &Path) -> Result<Self> {
        let file = fs::File::open(path)
            .with_context(|| format!("Failed to open genesis file {}", path.display()))?;
        let genesis = serde_json::from_reader(file).context("Failed to parse genesis file")?;
        Ok(genesis)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write genesis file {}", path.display()))?;
        Ok(())
    }

    /// Seed the executor with the genesis state and return the genesis block
    pub fn commit(&self, executor: &MemoryExecutor) -> Block {
        let accounts: AccountNonces = self
            .accounts
            .iter()
            .map(|(address, account)| (*address, account.nonce))
            .collect();
        let state_root = executor.insert_state(accounts);

        let header = Header {
            number: 0,
            parent_hash: Hash::ZERO,
            state_root,
            timestamp: self.timestamp,
            gas_limit: self.gas_limit,
            miner: Vec::new(),
            extra_data: ExtraData::new(),
        };
        Block::new(header, Vec::new())
    }
}
