use anyhow::{bail, Result};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::block::Header;
use crate::crypto::TransactionSigner;
use crate::interfaces::{StateExecutor, TxPool};
use crate::primitives::{Address, Hash};
use crate::transaction::Transaction;

struct PoolInner {
    head: Header,
    pending: BTreeMap<Address, BTreeMap<u64, Transaction>>,
}

/// Pending transactions per sender, ordered by nonce
pub struct MemoryTxPool {
    executor: Arc<dyn StateExecutor>,
    signer: Arc<dyn TransactionSigner>,
    inner: Mutex<PoolInner>,
}

impl MemoryTxPool {
    pub fn new(head: Header, executor: Arc<dyn StateExecutor>, signer: Arc<dyn TransactionSigner>) -> Self {
        Self {
            executor,
            signer,
            inner: Mutex::new(PoolInner {
                head,
                pending: BTreeMap::new(),
            }),
        }
    }

    pub fn pending(&self, sender: &Address) -> Vec<Transaction> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner
            .pending
            .get(sender)
            .map(|txs| txs.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner
            .pending
            .values()
            .flat_map(|txs| txs.values())
            .any(|tx| &tx.hash() == hash)
    }

    pub fn len(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.pending.values().map(|txs| txs.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn head(&self) -> Header {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .head
            .clone()
    }

    fn state_nonce(&self, header: &Header, address: &Address) -> Result<u64> {
        let transition = self
            .executor
            .begin_transition(&header.state_root, header, &Address::ZERO)?;
        Ok(transition.nonce(address))
    }
}

impl TxPool for MemoryTxPool {
    fn add_tx(&self, tx: Transaction) -> Result<()> {
        let sender = self.signer.sender(&tx)?;
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);

        let state_nonce = self.state_nonce(&inner.head, &sender)?;
        if tx.nonce < state_nonce {
            bail!("nonce too low for {}: {} < {}", sender, tx.nonce, state_nonce);
        }

        let queue = inner.pending.entry(sender).or_default();
        if let Some(existing) = queue.get(&tx.nonce) {
            if existing.hash() == tx.hash() {
                bail!("transaction {} already known", tx.hash());
            }
            bail!("nonce {} already pending for {}", tx.nonce, sender);
        }

        log::debug!("Added transaction {} (from: {}, nonce: {}) to the pool", tx.hash(), sender, tx.nonce);
        queue.insert(tx.nonce, tx);
        Ok(())
    }

    fn reset_with_header(&self, header: &Header) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.head = header.clone();

        let senders: Vec<Address> = inner.pending.keys().copied().collect();
        let mut dropped = 0usize;
        for sender in senders {
            let state_nonce = match self.state_nonce(header, &sender) {
                Ok(nonce) => nonce,
                Err(e) => {
                    log::warn!("Cannot prune pool for {} at block {}: {}", sender, header.number, e);
                    continue;
                }
            };
            if let Some(queue) = inner.pending.get_mut(&sender) {
                let before = queue.len();
                queue.retain(|nonce, _| *nonce >= state_nonce);
                dropped += before - queue.len();
            }
        }
        inner.pending.retain(|_, queue| !queue.is_empty());

        log::debug!("Pool reset to block {} ({} stale transactions dropped)", header.number, dropped);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{Ed25519Key, Ed25519TxSigner, SigningKey};
    use crate::genesis::Genesis;
    use crate::memory::MemoryExecutor;
    use crate::transaction::TxKind;

    fn signed(key: &Ed25519Key, nonce: u64, value: u64) -> Transaction {
        let tx = Transaction::new(nonce, key.address(), None, 21_000, TxKind::Transfer { value });
        Ed25519TxSigner.sign_tx(tx, key).unwrap()
    }

    fn pool(nonce: u64) -> (MemoryTxPool, Ed25519Key, Arc<MemoryExecutor>) {
        let key = Ed25519Key::from_bytes(&[4u8; 32]);
        let executor = Arc::new(MemoryExecutor::new());
        let genesis = Genesis::new(1_000_000).with_account(key.address(), nonce).commit(&executor);
        let pool = MemoryTxPool::new(genesis.header, executor.clone(), Arc::new(Ed25519TxSigner));
        (pool, key, executor)
    }

    #[test]
    fn test_rejects_stale_duplicate_and_unsigned() {
        let (pool, key, _) = pool(2);
        assert!(pool.add_tx(signed(&key, 1, 1)).is_err());

        pool.add_tx(signed(&key, 2, 1)).unwrap();
        assert!(pool.add_tx(signed(&key, 2, 1)).is_err());
        assert!(pool.add_tx(signed(&key, 2, 9)).is_err());

        let unsigned = Transaction::new(3, key.address(), None, 1, TxKind::Transfer { value: 1 });
        assert!(pool.add_tx(unsigned).is_err());
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_reset_drops_included_nonces() {
        let (pool, key, executor) = pool(0);
        pool.add_tx(signed(&key, 0, 1)).unwrap();
        pool.add_tx(signed(&key, 1, 1)).unwrap();

        let mut next = pool.head();
        next.number = 1;
        next.state_root = executor.insert_state(crate::memory::AccountNonces::from([(key.address(), 1)]));
        pool.reset_with_header(&next);

        let remaining = pool.pending(&key.address());
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].nonce, 1);
        assert_eq!(pool.head().number, 1);
    }
}
