use std::sync::Arc;

use crate::block::Block;
use crate::error::{Result, WatchtowerError};
use crate::interfaces::{BlockSource, ChainStore, TxPool};

/// Commits acceptable blocks and re-anchors the pool on the new head
#[derive(Clone)]
pub struct BlockApplier {
    chain: Arc<dyn ChainStore>,
    txpool: Option<Arc<dyn TxPool>>,
}

impl BlockApplier {
    pub fn new(chain: Arc<dyn ChainStore>, txpool: Option<Arc<dyn TxPool>>) -> Self {
        Self { chain, txpool }
    }

    pub fn apply(&self, block: &Block) -> Result<()> {
        let hash = block.hash();
        self.chain
            .write_block(block, BlockSource::WatchTower)
            .map_err(|source| WatchtowerError::ChainWrite {
                number: block.number(),
                hash,
                source,
            })?;

        if let Some(txpool) = &self.txpool {
            txpool.reset_with_header(&block.header);
        }

        log::info!("Block committed to blockchain (number: {}, hash: {})", block.number(), hash);
        log::debug!("Received block header: {:?}", block.header);
        log::debug!("Received block transactions: {:?}", block.transactions);

        Ok(())
    }
}
