//! Validation gate: structural checks followed by the injected policy.
//!
//! A policy error means the block could not be classified with confidence.
//! The gate logs it and reports the block as safe, so ambiguity never turns
//! into an accusation.

use std::sync::Arc;

use crate::block::Block;
use crate::error::{Result, WatchtowerError};

/// Verdict returned by a validation policy
#[derive(Debug)]
pub struct PolicyResult {
    pub result: anyhow::Result<()>,
    /// Reserved auxiliary flag; carried through but not acted upon
    pub reserved: bool,
}

impl PolicyResult {
    pub fn pass() -> Self {
        Self {
            result: Ok(()),
            reserved: false,
        }
    }

    pub fn fail(error: anyhow::Error) -> Self {
        Self {
            result: Err(error),
            reserved: false,
        }
    }

    pub fn with_reserved(mut self, reserved: bool) -> Self {
        self.reserved = reserved;
        self
    }
}

pub trait BlockValidationPolicy: Send + Sync {
    fn validate(&self, block: &Block) -> PolicyResult;
}

impl<F> BlockValidationPolicy for F
where
    F: Fn(&Block) -> PolicyResult + Send + Sync,
{
    fn validate(&self, block: &Block) -> PolicyResult {
        self(block)
    }
}

/// Policy that accepts every block; used for bootstrap and tests
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBlockValidation;

impl BlockValidationPolicy for NoBlockValidation {
    fn validate(&self, _block: &Block) -> PolicyResult {
        PolicyResult::pass()
    }
}

#[derive(Debug)]
pub enum ValidationOutcome {
    Acceptable,
    StructurallyInvalid(String),
    /// The policy could not decide; treated as acceptable
    PolicyUndetermined(anyhow::Error),
}

#[derive(Clone)]
pub struct ValidationGate {
    policy: Arc<dyn BlockValidationPolicy>,
}

impl ValidationGate {
    pub fn new(policy: Arc<dyn BlockValidationPolicy>) -> Self {
        Self { policy }
    }

    pub fn classify(&self, block: Option<&Block>) -> ValidationOutcome {
        let Some(block) = block else {
            return ValidationOutcome::StructurallyInvalid("block == nil".to_string());
        };

        let verdict = self.policy.validate(block);
        if verdict.reserved {
            log::debug!(
                "Validation policy raised the reserved flag for block {} ({})",
                block.number(),
                block.hash()
            );
        }

        match verdict.result {
            Ok(()) => ValidationOutcome::Acceptable,
            Err(e) => ValidationOutcome::PolicyUndetermined(e),
        }
    }

    pub fn check_block_fully(&self, block: Option<&Block>) -> Result<()> {
        match self.classify(block) {
            ValidationOutcome::StructurallyInvalid(reason) => Err(WatchtowerError::InvalidBlock(reason)),
            ValidationOutcome::PolicyUndetermined(e) => {
                if let Some(block) = block {
                    log::warn!(
                        "Block {} ({}, parent: {}) cannot be verified; no fraud proof will be built: {}",
                        block.number(),
                        block.hash(),
                        block.parent_hash(),
                        e
                    );
                }
                Ok(())
            }
            ValidationOutcome::Acceptable => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{ExtraData, Header};
    use crate::primitives::Hash;

    fn block() -> Block {
        Block::new(
            Header {
                number: 1,
                parent_hash: Hash::digest(b"p"),
                state_root: Hash::digest(b"s"),
                timestamp: 1,
                gas_limit: 1,
                miner: vec![1],
                extra_data: ExtraData::new(),
            },
            vec![],
        )
    }

    #[test]
    fn test_nil_block_is_structural_error() {
        let gate = ValidationGate::new(Arc::new(NoBlockValidation));
        assert!(matches!(gate.check_block_fully(None), Err(WatchtowerError::InvalidBlock(_))));
    }

    #[test]
    fn test_policy_error_is_suppressed() {
        let gate = ValidationGate::new(Arc::new(|_: &Block| {
            PolicyResult::fail(anyhow::anyhow!("cannot replay"))
        }));
        let b = block();
        assert!(matches!(gate.classify(Some(&b)), ValidationOutcome::PolicyUndetermined(_)));
        assert!(gate.check_block_fully(Some(&b)).is_ok());
    }

    #[test]
    fn test_reserved_flag_does_not_change_outcome() {
        let gate = ValidationGate::new(Arc::new(|_: &Block| PolicyResult::pass().with_reserved(true)));
        let b = block();
        assert!(matches!(gate.classify(Some(&b)), ValidationOutcome::Acceptable));
        assert!(gate.check_block_fully(Some(&b)).is_ok());
    }

    #[test]
    fn test_nil_block_skips_policy() {
        let gate = ValidationGate::new(Arc::new(|_: &Block| -> PolicyResult {
            panic!("policy must not run for a nil block")
        }));
        assert!(gate.check_block_fully(None).is_err());
    }
}
