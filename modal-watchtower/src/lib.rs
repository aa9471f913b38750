//! Modality Watchtower
//!
//! Watchtowers re-validate blocks proposed by the sequencer and contest the
//! ones found invalid. They:
//! - Gate incoming blocks through structural checks and a pluggable policy
//! - Commit acceptable blocks and keep the transaction pool in step
//! - Build signed fraud-proof blocks carrying a dispute-resolution transaction
//!
//! Handing fraud proofs to the settlement layer is left to the caller.

pub mod applier;
pub mod block;
pub mod builder;
pub mod crypto;
pub mod error;
pub mod fraudproof;
pub mod genesis;
pub mod interfaces;
pub mod memory;
pub mod primitives;
pub mod staking;
pub mod transaction;
pub mod validation;
pub mod watchtower;

pub use applier::BlockApplier;
pub use block::{
    Block, ExtraData, Header, KEY_BEGIN_DISPUTE_RESOLUTION_OF, KEY_FRAUD_PROOF_OF, KEY_SIGNATURE,
};
pub use builder::{BlockBuilder, BlockBuilderFactory, BuilderError, ChainBlockBuilderFactory};
pub use crypto::{Ed25519Key, Ed25519TxSigner, Signature, SigningKey, TransactionSigner};
pub use error::{Result, WatchtowerError};
pub use fraudproof::{inspect_fraudproof, FraudproofAssembler, FraudproofSummary};
pub use genesis::Genesis;
pub use interfaces::{BlockSource, ChainStore, StateExecutor, Transition, TxPool};
pub use primitives::{Address, Hash};
pub use transaction::{Transaction, TxKind};
pub use validation::{
    BlockValidationPolicy, NoBlockValidation, PolicyResult, ValidationGate, ValidationOutcome,
};
pub use watchtower::{WatchTower, Watchtower, WatchtowerIdentity};
