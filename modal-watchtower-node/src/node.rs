use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use modal_watchtower::memory::{MemoryChain, MemoryExecutor, MemoryTxPool};
use modal_watchtower::{
    Block, Ed25519Key, Ed25519TxSigner, Genesis, NoBlockValidation, TxPool, Watchtower,
    WatchtowerIdentity,
};

use crate::config::Config;

/// In-memory collaborators a watchtower node runs against
pub struct WatchtowerNode {
    pub executor: Arc<MemoryExecutor>,
    pub chain: Arc<MemoryChain>,
    pub txpool: Option<Arc<MemoryTxPool>>,
    pub genesis: Block,
    pub watchtower: Watchtower,
}

impl WatchtowerNode {
    pub fn new(genesis: &Genesis, key: Ed25519Key, txpool_enabled: bool) -> Self {
        let executor = Arc::new(MemoryExecutor::new());
        let genesis = genesis.commit(&executor);
        let chain = Arc::new(MemoryChain::new(genesis.clone(), executor.clone()));
        let txpool = txpool_enabled.then(|| {
            Arc::new(MemoryTxPool::new(
                genesis.header.clone(),
                executor.clone(),
                Arc::new(Ed25519TxSigner),
            ))
        });

        let identity = WatchtowerIdentity::from_key(Arc::new(key));
        log::info!(
            "Watchtower account {} on genesis {}",
            identity.account(),
            genesis.hash()
        );

        let watchtower = Watchtower::new(
            chain.clone(),
            executor.clone(),
            txpool.clone().map(|pool| pool as Arc<dyn TxPool>),
            Arc::new(NoBlockValidation),
            identity,
        );

        Self {
            executor,
            chain,
            txpool,
            genesis,
            watchtower,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let key = config.load_key()?;
        let genesis = config.load_genesis()?;
        Ok(Self::new(&genesis, key, config.txpool_enabled()))
    }
}

/// Write a fraud-proof block into `outbox` as `<hash>.json`
pub fn write_fraudproof(outbox: &Path, fraudproof: &Block) -> Result<PathBuf> {
    fs::create_dir_all(outbox)
        .with_context(|| format!("Failed to create outbox {}", outbox.display()))?;
    let path = outbox.join(format!("{}.json", fraudproof.hash()));
    fs::write(&path, fraudproof.to_json()?)
        .with_context(|| format!("Failed to write fraud proof {}", path.display()))?;
    Ok(path)
}
