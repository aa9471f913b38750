//! In-memory collaborators for devnets and tests.

pub mod chain;
pub mod state;
pub mod txpool;

pub use chain::{MemoryChain, StoredBlock};
pub use state::{AccountNonces, MemoryExecutor};
pub use txpool::MemoryTxPool;
