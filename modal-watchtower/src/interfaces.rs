//! Collaborators the watchtower consumes but does not own.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::block::{Block, Header};
use crate::primitives::{Address, Hash};
use crate::transaction::Transaction;

/// Provenance recorded with every block written to the chain store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockSource {
    Genesis,
    Sequencer,
    WatchTower,
}

impl fmt::Display for BlockSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BlockSource::Genesis => "genesis",
            BlockSource::Sequencer => "sequencer",
            BlockSource::WatchTower => "watchtower",
        };
        f.write_str(name)
    }
}

pub trait ChainStore: Send + Sync {
    fn write_block(&self, block: &Block, source: BlockSource) -> Result<()>;

    fn header_by_hash(&self, hash: &Hash) -> Option<Header>;

    /// Header of the current canonical head
    fn head(&self) -> Header;
}

/// Open view over account state at a given state root
pub trait Transition {
    fn nonce(&self, address: &Address) -> u64;

    /// Execute a transaction; the sender nonce must match exactly
    fn apply(&mut self, tx: &Transaction) -> Result<()>;

    /// Persist the resulting state and return its root
    fn commit(self: Box<Self>) -> Result<Hash>;
}

pub trait StateExecutor: Send + Sync {
    fn begin_transition<'a>(
        &'a self,
        state_root: &Hash,
        header: &Header,
        coinbase: &Address,
    ) -> Result<Box<dyn Transition + 'a>>;
}

/// Pending-transaction pool
pub trait TxPool: Send + Sync {
    fn add_tx(&self, tx: Transaction) -> Result<()>;

    /// Re-anchor the pool on a new head, dropping transactions it invalidates
    fn reset_with_header(&self, header: &Header);
}
