//! Fraud-proof construction.
//!
//! Given a block known to be malicious, the assembler builds a sibling block
//! on the same parent that carries a single signed dispute-resolution
//! transaction and points back at the contested block through extra data.
//! Each call is independent: the nonce is read from the parent state every
//! time and nothing is cached between calls.

use std::sync::Arc;

use crate::block::{Block, KEY_BEGIN_DISPUTE_RESOLUTION_OF, KEY_FRAUD_PROOF_OF};
use crate::builder::{BlockBuilderFactory, BuilderError};
use crate::crypto::TransactionSigner;
use crate::error::{Result, WatchtowerError};
use crate::interfaces::{ChainStore, StateExecutor, TxPool};
use crate::primitives::{Address, Hash};
use crate::staking;
use crate::watchtower::WatchtowerIdentity;

pub struct FraudproofAssembler {
    chain: Arc<dyn ChainStore>,
    executor: Arc<dyn StateExecutor>,
    txpool: Option<Arc<dyn TxPool>>,
    builder_factory: Arc<dyn BlockBuilderFactory>,
    tx_signer: Arc<dyn TransactionSigner>,
}

impl FraudproofAssembler {
    pub fn new(
        chain: Arc<dyn ChainStore>,
        executor: Arc<dyn StateExecutor>,
        txpool: Option<Arc<dyn TxPool>>,
        builder_factory: Arc<dyn BlockBuilderFactory>,
        tx_signer: Arc<dyn TransactionSigner>,
    ) -> Self {
        Self {
            chain,
            executor,
            txpool,
            builder_factory,
            tx_signer,
        }
    }

    pub fn construct(&self, malicious: &Block, identity: &WatchtowerIdentity) -> Result<Block> {
        let malicious_hash = malicious.hash();
        let parent_hash = malicious.parent_hash();

        let builder = self
            .builder_factory
            .from_parent_hash(&parent_hash)
            .map_err(|e| match e {
                BuilderError::ParentNotFound(hash) => WatchtowerError::ParentBlockNotFound(hash),
                other => WatchtowerError::Builder(other),
            })?;

        let mut dispute_tx = staking::begin_dispute_resolution_tx(
            identity.account(),
            malicious.header.miner_address(),
            malicious.header.gas_limit,
        )
        .map_err(WatchtowerError::DisputeTransaction)?;

        let parent = self
            .chain
            .header_by_hash(&parent_hash)
            .ok_or(WatchtowerError::ParentBlockNotFound(parent_hash))?;
        {
            let transition = self
                .executor
                .begin_transition(&parent.state_root, &parent, &identity.account())
                .map_err(|source| WatchtowerError::StateTransition {
                    state_root: parent.state_root,
                    source,
                })?;
            dispute_tx.nonce = transition.nonce(&dispute_tx.from);
        }

        let signed = self
            .tx_signer
            .sign_tx(dispute_tx, &**identity.key())
            .map_err(WatchtowerError::Signing)?;
        let dispute_hash = signed.hash();

        if let Some(txpool) = &self.txpool {
            if let Err(e) = txpool.add_tx(signed.clone()) {
                log::error!("Failed to add fraud proof transaction {} to the pool: {}", dispute_hash, e);
                return Err(WatchtowerError::PoolSubmission(e));
            }
        }

        log::info!(
            "Applied dispute resolution transaction to the txpool (hash: {}, nonce: {}, from: {})",
            dispute_hash,
            signed.nonce,
            signed.from
        );

        let block = builder
            .set_coinbase_address(identity.account())
            .set_gas_limit(malicious.header.gas_limit)
            .set_extra_data_field(KEY_FRAUD_PROOF_OF, malicious_hash.to_vec())
            .set_extra_data_field(KEY_BEGIN_DISPUTE_RESOLUTION_OF, dispute_hash.to_vec())
            .add_transactions(vec![signed])
            .sign_with(identity.key().clone())
            .build()?;

        log::info!(
            "Constructed fraud proof {} (number: {}) against block {} (number: {})",
            block.hash(),
            block.number(),
            malicious_hash,
            malicious.number()
        );

        Ok(block)
    }
}

/// What a well-formed fraud-proof block asserts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FraudproofSummary {
    pub malicious_block: Hash,
    pub dispute_tx: Hash,
    pub accuser: Address,
    pub accused: Address,
    pub nonce: u64,
}

/// Check a fraud-proof block the way a settlement-layer consumer would
pub fn inspect_fraudproof(block: &Block, signer: &dyn TransactionSigner) -> Result<FraudproofSummary> {
    let invalid = |msg: String| WatchtowerError::InvalidFraudproof(msg);

    block
        .header
        .extra_data
        .check_fraudproof_markers()
        .map_err(invalid)?;
    let malicious_block = block
        .fraud_proof_of()
        .ok_or_else(|| invalid(format!("block {} is not a fraud proof", block.hash())))?;
    let dispute_of = block
        .begin_dispute_resolution_of()
        .ok_or_else(|| invalid(format!("{} missing", KEY_BEGIN_DISPUTE_RESOLUTION_OF)))?;

    let tx = match block.transactions.as_slice() {
        [tx] => tx,
        txs => return Err(invalid(format!("expected one transaction, found {}", txs.len()))),
    };
    let accused = tx
        .accused()
        .ok_or_else(|| invalid("transaction is not a dispute resolution".to_string()))?;
    if tx.to != Some(staking::STAKING_CONTRACT_ADDRESS) {
        return Err(invalid(format!(
            "dispute transaction targets {:?} instead of the staking contract {}",
            tx.to,
            staking::STAKING_CONTRACT_ADDRESS
        )));
    }
    if tx.hash() != dispute_of {
        return Err(invalid(format!(
            "{} is {} but the transaction hash is {}",
            KEY_BEGIN_DISPUTE_RESOLUTION_OF,
            dispute_of,
            tx.hash()
        )));
    }

    let accuser = signer
        .sender(tx)
        .map_err(|e| invalid(format!("dispute transaction signature: {}", e)))?;
    let coinbase = block.header.miner_address();
    if accuser != coinbase {
        return Err(invalid(format!("accuser {} is not the coinbase {}", accuser, coinbase)));
    }

    let sealer = block
        .header
        .verify_seal()
        .map_err(|e| invalid(format!("block seal: {}", e)))?;
    if sealer != coinbase {
        return Err(invalid(format!("block sealed by {} instead of {}", sealer, coinbase)));
    }

    Ok(FraudproofSummary {
        malicious_block,
        dispute_tx: dispute_of,
        accuser,
        accused,
        nonce: tx.nonce,
    })
}
