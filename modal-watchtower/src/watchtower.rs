use std::sync::Arc;

use crate::applier::BlockApplier;
use crate::block::Block;
use crate::builder::{BlockBuilderFactory, ChainBlockBuilderFactory};
use crate::crypto::{Ed25519TxSigner, SigningKey, TransactionSigner};
use crate::error::Result;
use crate::fraudproof::FraudproofAssembler;
use crate::interfaces::{ChainStore, StateExecutor, TxPool};
use crate::primitives::Address;
use crate::validation::{BlockValidationPolicy, ValidationGate};

pub trait WatchTower: Send + Sync {
    fn check_block_fully(&self, block: Option<&Block>) -> Result<()>;

    fn apply(&self, block: &Block) -> Result<()>;

    fn construct_fraudproof(&self, malicious: &Block) -> Result<Block>;
}

/// Account and signing key the watchtower acts as; fixed for its lifetime
#[derive(Clone)]
pub struct WatchtowerIdentity {
    account: Address,
    key: Arc<dyn SigningKey>,
}

impl WatchtowerIdentity {
    pub fn new(account: Address, key: Arc<dyn SigningKey>) -> Self {
        Self { account, key }
    }

    /// Identity whose account is the address controlled by `key`
    pub fn from_key(key: Arc<dyn SigningKey>) -> Self {
        Self {
            account: key.address(),
            key,
        }
    }

    pub fn account(&self) -> Address {
        self.account
    }

    pub fn key(&self) -> &Arc<dyn SigningKey> {
        &self.key
    }
}

impl std::fmt::Debug for WatchtowerIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchtowerIdentity")
            .field("account", &self.account)
            .finish()
    }
}

pub struct Watchtower {
    gate: ValidationGate,
    applier: BlockApplier,
    assembler: FraudproofAssembler,
    identity: WatchtowerIdentity,
}

impl Watchtower {
    /// Watchtower over the given collaborators, building blocks on the chain
    /// store with the canonical transaction signer.
    pub fn new(
        chain: Arc<dyn ChainStore>,
        executor: Arc<dyn StateExecutor>,
        txpool: Option<Arc<dyn TxPool>>,
        policy: Arc<dyn BlockValidationPolicy>,
        identity: WatchtowerIdentity,
    ) -> Self {
        let factory = Arc::new(ChainBlockBuilderFactory::new(chain.clone(), executor.clone()));
        Self::with_components(
            chain,
            executor,
            txpool,
            policy,
            factory,
            Arc::new(Ed25519TxSigner),
            identity,
        )
    }

    pub fn with_components(
        chain: Arc<dyn ChainStore>,
        executor: Arc<dyn StateExecutor>,
        txpool: Option<Arc<dyn TxPool>>,
        policy: Arc<dyn BlockValidationPolicy>,
        builder_factory: Arc<dyn BlockBuilderFactory>,
        tx_signer: Arc<dyn TransactionSigner>,
        identity: WatchtowerIdentity,
    ) -> Self {
        Self {
            gate: ValidationGate::new(policy),
            applier: BlockApplier::new(chain.clone(), txpool.clone()),
            assembler: FraudproofAssembler::new(chain, executor, txpool, builder_factory, tx_signer),
            identity,
        }
    }

    pub fn identity(&self) -> &WatchtowerIdentity {
        &self.identity
    }

    pub fn account(&self) -> Address {
        self.identity.account()
    }
}

impl WatchTower for Watchtower {
    fn check_block_fully(&self, block: Option<&Block>) -> Result<()> {
        self.gate.check_block_fully(block)
    }

    fn apply(&self, block: &Block) -> Result<()> {
        self.applier.apply(block)
    }

    fn construct_fraudproof(&self, malicious: &Block) -> Result<Block> {
        self.assembler.construct(malicious, &self.identity)
    }
}
