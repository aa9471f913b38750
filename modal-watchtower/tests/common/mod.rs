#![allow(dead_code)]

use std::sync::Arc;

use modal_watchtower::memory::{MemoryChain, MemoryExecutor, MemoryTxPool};
use modal_watchtower::{
    Address, Block, BlockBuilder, BlockValidationPolicy, ChainStore, Ed25519Key, Ed25519TxSigner,
    ExtraData, Genesis, Hash, Header, NoBlockValidation, SigningKey, Transaction,
    TransactionSigner, TxKind, TxPool, Watchtower, WatchtowerIdentity,
};

pub const GENESIS_GAS_LIMIT: u64 = 10_000_000;

/// Single-node chain with the watchtower account funded at genesis
pub struct Devnet {
    pub executor: Arc<MemoryExecutor>,
    pub chain: Arc<MemoryChain>,
    pub txpool: Arc<MemoryTxPool>,
    pub key: Arc<Ed25519Key>,
    pub genesis: Block,
}

impl Devnet {
    pub fn new(watchtower_nonce: u64) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();

        let key = Arc::new(Ed25519Key::from_bytes(&[42u8; 32]));
        let executor = Arc::new(MemoryExecutor::new());
        let genesis = Genesis::new(GENESIS_GAS_LIMIT)
            .with_account(key.address(), watchtower_nonce)
            .with_account(sequencer_key().address(), 0)
            .commit(&executor);
        let chain = Arc::new(MemoryChain::new(genesis.clone(), executor.clone()));
        let txpool = Arc::new(MemoryTxPool::new(
            genesis.header.clone(),
            executor.clone(),
            Arc::new(Ed25519TxSigner),
        ));

        Self {
            executor,
            chain,
            txpool,
            key,
            genesis,
        }
    }

    pub fn identity(&self) -> WatchtowerIdentity {
        WatchtowerIdentity::from_key(self.key.clone())
    }

    pub fn watchtower(&self) -> Watchtower {
        self.watchtower_with_policy(Arc::new(NoBlockValidation))
    }

    pub fn watchtower_with_policy(&self, policy: Arc<dyn BlockValidationPolicy>) -> Watchtower {
        Watchtower::new(
            self.chain.clone(),
            self.executor.clone(),
            Some(self.txpool.clone()),
            policy,
            self.identity(),
        )
    }

    pub fn watchtower_without_pool(&self) -> Watchtower {
        Watchtower::new(
            self.chain.clone(),
            self.executor.clone(),
            None,
            Arc::new(NoBlockValidation),
            self.identity(),
        )
    }

    /// Well-formed block produced on top of `parent`
    pub fn sequencer_block(&self, parent: &Header, txs: Vec<Transaction>) -> Block {
        BlockBuilder::new(parent.clone(), self.executor.clone())
            .set_coinbase_address(sequencer_key().address())
            .add_transactions(txs)
            .sign_with(Arc::new(sequencer_key()))
            .build()
            .expect("sequencer block should build")
    }

    /// Block whose state root no honest execution produces
    pub fn malicious_block(&self, parent_hash: Hash, proposer: Address, gas_limit: u64) -> Block {
        let number = self
            .chain
            .header_by_hash(&parent_hash)
            .map(|h| h.number + 1)
            .unwrap_or(1);
        Block::new(
            Header {
                number,
                parent_hash,
                state_root: Hash::digest(b"forged state"),
                timestamp: 1_700_000_000,
                gas_limit,
                miner: proposer.as_bytes().to_vec(),
                extra_data: ExtraData::new(),
            },
            vec![],
        )
    }

    pub fn watchtower_transfer(&self, nonce: u64) -> Transaction {
        let tx = Transaction::new(
            nonce,
            self.key.address(),
            Some(Address([0x77; 20])),
            21_000,
            TxKind::Transfer { value: 1 },
        );
        Ed25519TxSigner
            .sign_tx(tx, &*self.key)
            .expect("transfer should sign")
    }

    pub fn submit(&self, tx: Transaction) {
        self.txpool.add_tx(tx).expect("pool should accept transaction");
    }
}

pub fn sequencer_key() -> Ed25519Key {
    Ed25519Key::from_bytes(&[7u8; 32])
}

pub fn proposer() -> Address {
    Address([0xaa; 20])
}
