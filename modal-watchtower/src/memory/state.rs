use anyhow::{anyhow, bail, Result};
use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock};

use crate::block::Header;
use crate::interfaces::{StateExecutor, Transition};
use crate::primitives::{Address, Hash};
use crate::transaction::Transaction;

/// Account nonces keyed by address; the whole of the in-memory world state
pub type AccountNonces = BTreeMap<Address, u64>;

/// Content-addressed account state, one snapshot per state root
#[derive(Debug, Default)]
pub struct MemoryExecutor {
    states: RwLock<HashMap<Hash, AccountNonces>>,
}

impl MemoryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state_root_of(accounts: &AccountNonces) -> Hash {
        let encoded = serde_json::to_vec(accounts).expect("serialization should not fail");
        Hash::digest(&encoded)
    }

    /// Store a snapshot and return its root
    pub fn insert_state(&self, accounts: AccountNonces) -> Hash {
        let root = Self::state_root_of(&accounts);
        self.states
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(root, accounts);
        root
    }

    pub fn nonce_at(&self, state_root: &Hash, address: &Address) -> Option<u64> {
        let states = self.states.read().unwrap_or_else(PoisonError::into_inner);
        states
            .get(state_root)
            .map(|accounts| accounts.get(address).copied().unwrap_or(0))
    }
}

impl StateExecutor for MemoryExecutor {
    fn begin_transition<'a>(
        &'a self,
        state_root: &Hash,
        _header: &Header,
        _coinbase: &Address,
    ) -> Result<Box<dyn Transition + 'a>> {
        let states = self.states.read().unwrap_or_else(PoisonError::into_inner);
        let accounts = states
            .get(state_root)
            .cloned()
            .ok_or_else(|| anyhow!("unknown state root {}", state_root))?;
        Ok(Box::new(MemoryTransition {
            executor: self,
            accounts,
        }))
    }
}

struct MemoryTransition<'a> {
    executor: &'a MemoryExecutor,
    accounts: AccountNonces,
}

impl Transition for MemoryTransition<'_> {
    fn nonce(&self, address: &Address) -> u64 {
        self.accounts.get(address).copied().unwrap_or(0)
    }

    fn apply(&mut self, tx: &Transaction) -> Result<()> {
        let expected = self.nonce(&tx.from);
        if tx.nonce != expected {
            bail!(
                "invalid nonce for {}: expected {}, got {}",
                tx.from,
                expected,
                tx.nonce
            );
        }
        self.accounts.insert(tx.from, expected + 1);
        Ok(())
    }

    fn commit(self: Box<Self>) -> Result<Hash> {
        Ok(self.executor.insert_state(self.accounts))
    }
}
