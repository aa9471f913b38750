use serde::{Deserialize, Serialize};

use crate::crypto::Signature;
use crate::primitives::{Address, Hash};

/// What a transaction does once executed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TxKind {
    Transfer { value: u64 },
    /// Opens a dispute against the proposer of a malicious block and stakes the sender
    BeginDisputeResolution { accused: Address },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub nonce: u64,
    pub from: Address,
    pub to: Option<Address>,
    pub gas_limit: u64,
    pub kind: TxKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<Signature>,
}

impl Transaction {
    pub fn new(nonce: u64, from: Address, to: Option<Address>, gas_limit: u64, kind: TxKind) -> Self {
        Self {
            nonce,
            from,
            to,
            gas_limit,
            kind,
            signature: None,
        }
    }

    /// Hash covered by the sender's signature
    pub fn signing_hash(&self) -> Hash {
        let unsigned = Transaction {
            signature: None,
            ..self.clone()
        };
        unsigned.hash()
    }

    /// Content hash, including the signature when present
    pub fn hash(&self) -> Hash {
        let encoded = serde_json::to_vec(self).expect("serialization should not fail");
        Hash::digest(&encoded)
    }

    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    /// Accused proposer when this is a dispute-resolution transaction
    pub fn accused(&self) -> Option<Address> {
        match self.kind {
            TxKind::BeginDisputeResolution { accused } => Some(accused),
            TxKind::Transfer { .. } => None,
        }
    }
}
