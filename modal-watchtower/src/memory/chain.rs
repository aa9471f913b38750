use anyhow::{anyhow, bail, Result};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::block::{Block, Header};
use crate::interfaces::{BlockSource, ChainStore, StateExecutor};
use crate::primitives::Hash;

#[derive(Debug, Clone)]
pub struct StoredBlock {
    pub block: Block,
    pub source: BlockSource,
}

struct ChainInner {
    blocks: HashMap<Hash, StoredBlock>,
    head: Hash,
}

/// Chain store that re-executes every written block against its parent state
pub struct MemoryChain {
    executor: Arc<dyn StateExecutor>,
    inner: RwLock<ChainInner>,
}

impl MemoryChain {
    pub fn new(genesis: Block, executor: Arc<dyn StateExecutor>) -> Self {
        let head = genesis.hash();
        let mut blocks = HashMap::new();
        blocks.insert(
            head,
            StoredBlock {
                block: genesis,
                source: BlockSource::Genesis,
            },
        );
        Self {
            executor,
            inner: RwLock::new(ChainInner { blocks, head }),
        }
    }

    pub fn block_by_hash(&self, hash: &Hash) -> Option<Block> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.blocks.get(hash).map(|stored| stored.block.clone())
    }

    pub fn source_of(&self, hash: &Hash) -> Option<BlockSource> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.blocks.get(hash).map(|stored| stored.source)
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .blocks
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn execute(&self, parent: &Header, block: &Block) -> Result<Hash> {
        let coinbase = block.header.miner_address();
        let mut transition = self
            .executor
            .begin_transition(&parent.state_root, parent, &coinbase)?;
        for tx in &block.transactions {
            transition.apply(tx)?;
        }
        transition.commit()
    }
}

impl ChainStore for MemoryChain {
    fn write_block(&self, block: &Block, source: BlockSource) -> Result<()> {
        let hash = block.hash();
        if self.source_of(&hash).is_some() {
            log::debug!("Block {} already stored, skipping write", hash);
            return Ok(());
        }

        let parent = self
            .header_by_hash(&block.parent_hash())
            .ok_or_else(|| anyhow!("unknown parent {}", block.parent_hash()))?;
        if block.number() != parent.number + 1 {
            bail!(
                "block number {} does not follow parent number {}",
                block.number(),
                parent.number
            );
        }

        let state_root = self.execute(&parent, block)?;
        if state_root != block.header.state_root {
            bail!(
                "state root mismatch: header has {}, execution produced {}",
                block.header.state_root,
                state_root
            );
        }

        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let head_number = inner
            .blocks
            .get(&inner.head)
            .map(|stored| stored.block.number())
            .unwrap_or(0);
        if block.number() > head_number {
            inner.head = hash;
        }
        inner.blocks.insert(
            hash,
            StoredBlock {
                block: block.clone(),
                source,
            },
        );
        log::debug!("Stored block {} ({}) from {}", block.number(), hash, source);
        Ok(())
    }

    fn header_by_hash(&self, hash: &Hash) -> Option<Header> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.blocks.get(hash).map(|stored| stored.block.header.clone())
    }

    fn head(&self) -> Header {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner
            .blocks
            .get(&inner.head)
            .map(|stored| stored.block.header.clone())
            .expect("head block is always stored")
    }
}
