use anyhow::{bail, Result};

use crate::primitives::Address;
use crate::transaction::{Transaction, TxKind};

/// Address of the staking contract that adjudicates disputes
pub const STAKING_CONTRACT_ADDRESS: Address = Address([
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x10, 0x01,
]);

/// Build the unsigned transaction that accuses `accused` and stakes `accuser`.
///
/// The nonce is left at zero; it has to be assigned from chain state before signing.
pub fn begin_dispute_resolution_tx(
    accuser: Address,
    accused: Address,
    gas_limit: u64,
) -> Result<Transaction> {
    if accused.is_zero() {
        bail!("cannot open a dispute against the zero address");
    }
    if accused == accuser {
        bail!("account {} cannot accuse itself", accuser);
    }

    Ok(Transaction::new(
        0,
        accuser,
        Some(STAKING_CONTRACT_ADDRESS),
        gas_limit,
        TxKind::BeginDisputeResolution { accused },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispute_tx_targets_staking_contract() {
        let tx = begin_dispute_resolution_tx(Address([1u8; 20]), Address([2u8; 20]), 8_000_000).unwrap();
        assert_eq!(tx.from, Address([1u8; 20]));
        assert_eq!(tx.to, Some(STAKING_CONTRACT_ADDRESS));
        assert_eq!(tx.gas_limit, 8_000_000);
        assert_eq!(tx.accused(), Some(Address([2u8; 20])));
        assert!(!tx.is_signed());
    }

    #[test]
    fn test_rejects_zero_and_self_accusation() {
        assert!(begin_dispute_resolution_tx(Address([1u8; 20]), Address::ZERO, 1).is_err());
        assert!(begin_dispute_resolution_tx(Address([1u8; 20]), Address([1u8; 20]), 1).is_err());
    }
}
