use thiserror::Error;

use crate::builder::BuilderError;
use crate::primitives::Hash;

#[derive(Debug, Error)]
pub enum WatchtowerError {
    #[error("Invalid block: {0}")]
    InvalidBlock(String),

    #[error("Parent block not found: {0}")]
    ParentBlockNotFound(Hash),

    #[error("Failed to begin state transition at {state_root}: {source}")]
    StateTransition {
        state_root: Hash,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to build dispute resolution transaction: {0}")]
    DisputeTransaction(#[source] anyhow::Error),

    #[error("Failed to sign transaction: {0}")]
    Signing(#[source] anyhow::Error),

    #[error("Failed to add fraud proof transaction to the pool: {0}")]
    PoolSubmission(#[source] anyhow::Error),

    #[error("Block builder error: {0}")]
    Builder(#[from] BuilderError),

    #[error("Failed to write block {number} ({hash}): {source}")]
    ChainWrite {
        number: u64,
        hash: Hash,
        #[source]
        source: anyhow::Error,
    },

    #[error("Invalid fraud proof: {0}")]
    InvalidFraudproof(String),
}

pub type Result<T> = std::result::Result<T, WatchtowerError>;
