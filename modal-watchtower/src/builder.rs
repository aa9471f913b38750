//! Fluent block construction on top of a known parent.
//!
//! Every setter consumes and returns the builder. The first configuration
//! error is latched and later calls become no-ops, so `build()` either yields
//! a complete block or that first error.

use std::sync::Arc;
use thiserror::Error;

use crate::block::{Block, ExtraData, Header, KEY_SIGNATURE};
use crate::crypto::SigningKey;
use crate::interfaces::{ChainStore, StateExecutor};
use crate::primitives::{Address, Hash};
use crate::transaction::Transaction;

#[derive(Debug, Error)]
pub enum BuilderError {
    #[error("Parent block not found: {0}")]
    ParentNotFound(Hash),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Coinbase address not set")]
    MissingCoinbase,

    #[error("Gas limit exceeded: transactions need {used}, block allows {limit}")]
    GasLimitExceeded { used: u64, limit: u64 },

    #[error("Failed to execute transactions: {0}")]
    Execution(#[source] anyhow::Error),

    #[error("Failed to seal block: {0}")]
    Sealing(#[source] anyhow::Error),
}

pub trait BlockBuilderFactory: Send + Sync {
    fn from_parent_hash(&self, parent_hash: &Hash) -> Result<BlockBuilder, BuilderError>;
}

/// Resolves parents from the chain store and executes on the state executor
pub struct ChainBlockBuilderFactory {
    chain: Arc<dyn ChainStore>,
    executor: Arc<dyn StateExecutor>,
}

impl ChainBlockBuilderFactory {
    pub fn new(chain: Arc<dyn ChainStore>, executor: Arc<dyn StateExecutor>) -> Self {
        Self { chain, executor }
    }
}

impl BlockBuilderFactory for ChainBlockBuilderFactory {
    fn from_parent_hash(&self, parent_hash: &Hash) -> Result<BlockBuilder, BuilderError> {
        let parent = self
            .chain
            .header_by_hash(parent_hash)
            .ok_or(BuilderError::ParentNotFound(*parent_hash))?;
        Ok(BlockBuilder::new(parent, self.executor.clone()))
    }
}

pub struct BlockBuilder {
    parent: Header,
    executor: Arc<dyn StateExecutor>,
    coinbase: Option<Address>,
    gas_limit: u64,
    timestamp: Option<u64>,
    extra_data: ExtraData,
    transactions: Vec<Transaction>,
    signing_key: Option<Arc<dyn SigningKey>>,
    error: Option<BuilderError>,
}

impl BlockBuilder {
    pub fn new(parent: Header, executor: Arc<dyn StateExecutor>) -> Self {
        let gas_limit = parent.gas_limit;
        Self {
            parent,
            executor,
            coinbase: None,
            gas_limit,
            timestamp: None,
            extra_data: ExtraData::new(),
            transactions: Vec::new(),
            signing_key: None,
            error: None,
        }
    }

    fn configure(mut self, f: impl FnOnce(&mut Self) -> Result<(), BuilderError>) -> Self {
        if self.error.is_none() {
            if let Err(e) = f(&mut self) {
                self.error = Some(e);
            }
        }
        self
    }

    pub fn set_coinbase_address(self, coinbase: Address) -> Self {
        self.configure(|b| {
            if coinbase.is_zero() {
                return Err(BuilderError::InvalidConfiguration(
                    "coinbase cannot be the zero address".to_string(),
                ));
            }
            b.coinbase = Some(coinbase);
            Ok(())
        })
    }

    pub fn set_gas_limit(self, gas_limit: u64) -> Self {
        self.configure(|b| {
            if gas_limit == 0 {
                return Err(BuilderError::InvalidConfiguration(
                    "gas limit must be positive".to_string(),
                ));
            }
            b.gas_limit = gas_limit;
            Ok(())
        })
    }

    pub fn set_timestamp(self, timestamp: u64) -> Self {
        self.configure(|b| {
            if timestamp <= b.parent.timestamp {
                return Err(BuilderError::InvalidConfiguration(format!(
                    "timestamp {} must be after parent timestamp {}",
                    timestamp, b.parent.timestamp
                )));
            }
            b.timestamp = Some(timestamp);
            Ok(())
        })
    }

    pub fn set_extra_data_field(self, key: &str, value: Vec<u8>) -> Self {
        self.configure(|b| {
            if key.is_empty() {
                return Err(BuilderError::InvalidConfiguration(
                    "extra data key cannot be empty".to_string(),
                ));
            }
            if key == KEY_SIGNATURE {
                return Err(BuilderError::InvalidConfiguration(format!(
                    "{} is reserved for the block seal",
                    KEY_SIGNATURE
                )));
            }
            b.extra_data.insert(key, value);
            Ok(())
        })
    }

    pub fn add_transactions(self, txs: Vec<Transaction>) -> Self {
        self.configure(|b| {
            if let Some(unsigned) = txs.iter().find(|tx| !tx.is_signed()) {
                return Err(BuilderError::InvalidConfiguration(format!(
                    "transaction {} from {} is not signed",
                    unsigned.hash(),
                    unsigned.from
                )));
            }
            b.transactions.extend(txs);
            Ok(())
        })
    }

    pub fn sign_with(self, key: Arc<dyn SigningKey>) -> Self {
        self.configure(|b| {
            b.signing_key = Some(key);
            Ok(())
        })
    }

    pub fn build(self) -> Result<Block, BuilderError> {
        if let Some(e) = self.error {
            return Err(e);
        }

        let coinbase = self.coinbase.ok_or(BuilderError::MissingCoinbase)?;

        let used = self
            .transactions
            .iter()
            .fold(0u64, |acc, tx| acc.saturating_add(tx.gas_limit));
        if used > self.gas_limit {
            return Err(BuilderError::GasLimitExceeded {
                used,
                limit: self.gas_limit,
            });
        }

        self.extra_data
            .check_fraudproof_markers()
            .map_err(BuilderError::InvalidConfiguration)?;

        let mut transition = self
            .executor
            .begin_transition(&self.parent.state_root, &self.parent, &coinbase)
            .map_err(BuilderError::Execution)?;
        for tx in &self.transactions {
            transition.apply(tx).map_err(BuilderError::Execution)?;
        }
        let state_root = transition.commit().map_err(BuilderError::Execution)?;

        let number = self.parent.number.checked_add(1).ok_or_else(|| {
            BuilderError::InvalidConfiguration(format!(
                "parent number {} has no successor",
                self.parent.number
            ))
        })?;
        let timestamp = match self.timestamp {
            Some(timestamp) => timestamp,
            None => {
                let earliest = self.parent.timestamp.checked_add(1).ok_or_else(|| {
                    BuilderError::InvalidConfiguration(format!(
                        "parent timestamp {} has no successor",
                        self.parent.timestamp
                    ))
                })?;
                let now = chrono::Utc::now().timestamp().max(0) as u64;
                now.max(earliest)
            }
        };

        let mut header = Header {
            number,
            parent_hash: self.parent.hash(),
            state_root,
            timestamp,
            gas_limit: self.gas_limit,
            miner: coinbase.as_bytes().to_vec(),
            extra_data: self.extra_data,
        };

        if let Some(key) = self.signing_key {
            let seal = key
                .sign(header.seal_hash().as_bytes())
                .map_err(BuilderError::Sealing)?;
            header.extra_data.insert(KEY_SIGNATURE, seal.to_bytes());
        }

        Ok(Block::new(header, self.transactions))
    }
}
