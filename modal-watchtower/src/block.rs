use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::crypto::Signature;
use crate::error::{Result, WatchtowerError};
use crate::primitives::{hex_bytes, Address, Hash};
use crate::transaction::Transaction;

/// Extra-data key holding the hash of the block a fraud proof contests
pub const KEY_FRAUD_PROOF_OF: &str = "FRAUDPROOF_OF";

/// Extra-data key holding the hash of the dispute-resolution transaction
pub const KEY_BEGIN_DISPUTE_RESOLUTION_OF: &str = "BEGIN_DISPUTE_RESOLUTION_OF";

/// Extra-data key holding the block seal (public key followed by signature)
pub const KEY_SIGNATURE: &str = "SIGNATURE";

/// Header-embedded key/value metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraData(BTreeMap<String, Bytes>);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
struct Bytes(#[serde(with = "hex_bytes")] Vec<u8>);

impl ExtraData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.0.get(key).map(|v| v.0.as_slice())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Vec<u8>) {
        self.0.insert(key.into(), Bytes(value));
    }

    pub fn remove(&mut self, key: &str) -> Option<Vec<u8>> {
        self.0.remove(key).map(|v| v.0)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Hash stored under `key`, if present and hash-sized
    pub fn hash_field(&self, key: &str) -> Option<Hash> {
        self.get(key).and_then(|bytes| Hash::from_slice(bytes).ok())
    }

    /// The two fraud-proof markers travel together or not at all
    pub fn check_fraudproof_markers(&self) -> std::result::Result<(), String> {
        let fraud_proof_of = self.contains_key(KEY_FRAUD_PROOF_OF);
        let dispute_of = self.contains_key(KEY_BEGIN_DISPUTE_RESOLUTION_OF);
        if fraud_proof_of != dispute_of {
            return Err(format!(
                "extra data must carry both {} and {} or neither",
                KEY_FRAUD_PROOF_OF, KEY_BEGIN_DISPUTE_RESOLUTION_OF
            ));
        }
        for key in [KEY_FRAUD_PROOF_OF, KEY_BEGIN_DISPUTE_RESOLUTION_OF] {
            if let Some(value) = self.get(key) {
                if Hash::from_slice(value).is_err() {
                    return Err(format!("{} must hold a 32-byte hash, got {} bytes", key, value.len()));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub number: u64,
    pub parent_hash: Hash,
    pub state_root: Hash,
    pub timestamp: u64,
    pub gas_limit: u64,
    /// Proposer of the block, as raw bytes
    #[serde(with = "hex_bytes")]
    pub miner: Vec<u8>,
    #[serde(default)]
    pub extra_data: ExtraData,
}

impl Header {
    pub fn hash(&self) -> Hash {
        let encoded = serde_json::to_vec(self).expect("serialization should not fail");
        Hash::digest(&encoded)
    }

    /// Hash the proposer seals: the header without its seal entry
    pub fn seal_hash(&self) -> Hash {
        let mut unsealed = self.clone();
        unsealed.extra_data.remove(KEY_SIGNATURE);
        unsealed.hash()
    }

    pub fn seal(&self) -> Option<Signature> {
        self.extra_data
            .get(KEY_SIGNATURE)
            .and_then(|bytes| Signature::from_bytes(bytes).ok())
    }

    /// Verify the seal and return the sealing account
    pub fn verify_seal(&self) -> anyhow::Result<Address> {
        let seal = self
            .seal()
            .ok_or_else(|| anyhow::anyhow!("block {} is not sealed", self.number))?;
        seal.verify(self.seal_hash().as_bytes())?;
        Ok(seal.signer())
    }

    /// Proposer interpreted as an account address
    pub fn miner_address(&self) -> Address {
        Address::from_slice(&self.miner)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: Header,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

/// Block as received over the wire, before its structure is checked
#[derive(Debug, Clone, Deserialize)]
struct WireBlock {
    header: Option<Header>,
    #[serde(default)]
    transactions: Vec<Transaction>,
}

impl Block {
    pub fn new(header: Header, transactions: Vec<Transaction>) -> Self {
        Self { header, transactions }
    }

    pub fn hash(&self) -> Hash {
        self.header.hash()
    }

    pub fn number(&self) -> u64 {
        self.header.number
    }

    pub fn parent_hash(&self) -> Hash {
        self.header.parent_hash
    }

    /// Hash of the block this one contests, when it is a fraud proof
    pub fn fraud_proof_of(&self) -> Option<Hash> {
        self.header.extra_data.hash_field(KEY_FRAUD_PROOF_OF)
    }

    pub fn begin_dispute_resolution_of(&self) -> Option<Hash> {
        self.header.extra_data.hash_field(KEY_BEGIN_DISPUTE_RESOLUTION_OF)
    }

    /// Decode a JSON block, treating a missing header as a structural error
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let wire: Option<WireBlock> = serde_json::from_slice(bytes)
            .map_err(|e| WatchtowerError::InvalidBlock(format!("malformed block: {}", e)))?;
        let wire = wire.ok_or_else(|| WatchtowerError::InvalidBlock("block == nil".to_string()))?;
        let header = wire
            .header
            .ok_or_else(|| WatchtowerError::InvalidBlock("block.header == nil".to_string()))?;
        Ok(Block::new(header, wire.transactions))
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
            .map_err(|e| WatchtowerError::InvalidBlock(format!("failed to encode block: {}", e)))
    }
}
