use anyhow::{anyhow, bail, Result};
use ed25519_dalek::{Signer, Verifier};
use serde::{Deserialize, Serialize};

use crate::primitives::{hex_bytes, Address};
use crate::transaction::Transaction;

pub const PUBLIC_KEY_LENGTH: usize = ed25519_dalek::PUBLIC_KEY_LENGTH;
pub const SIGNATURE_LENGTH: usize = ed25519_dalek::SIGNATURE_LENGTH;

/// A detached signature together with the public key that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    #[serde(with = "hex_bytes")]
    pub public_key: Vec<u8>,
    #[serde(with = "hex_bytes")]
    pub signature: Vec<u8>,
}

impl Signature {
    /// Packed form used in header extra data: public key then signature
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.public_key.len() + self.signature.len());
        out.extend_from_slice(&self.public_key);
        out.extend_from_slice(&self.signature);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != PUBLIC_KEY_LENGTH + SIGNATURE_LENGTH {
            bail!(
                "packed signature must be {} bytes, got {}",
                PUBLIC_KEY_LENGTH + SIGNATURE_LENGTH,
                bytes.len()
            );
        }
        Ok(Self {
            public_key: bytes[..PUBLIC_KEY_LENGTH].to_vec(),
            signature: bytes[PUBLIC_KEY_LENGTH..].to_vec(),
        })
    }

    /// Address of the account that produced this signature
    pub fn signer(&self) -> Address {
        Address::from_public_key(&self.public_key)
    }

    pub fn verify(&self, message: &[u8]) -> Result<()> {
        let public_key: [u8; PUBLIC_KEY_LENGTH] = self
            .public_key
            .as_slice()
            .try_into()
            .map_err(|_| anyhow!("invalid public key length {}", self.public_key.len()))?;
        let verifying_key = ed25519_dalek::VerifyingKey::from_bytes(&public_key)
            .map_err(|e| anyhow!("invalid public key: {}", e))?;
        let signature = ed25519_dalek::Signature::from_slice(&self.signature)
            .map_err(|e| anyhow!("malformed signature: {}", e))?;
        verifying_key
            .verify(message, &signature)
            .map_err(|e| anyhow!("signature verification failed: {}", e))
    }
}

/// Signing capability behind which key custody lives
pub trait SigningKey: Send + Sync {
    fn public_key(&self) -> Vec<u8>;

    fn sign(&self, message: &[u8]) -> Result<Signature>;

    fn address(&self) -> Address {
        Address::from_public_key(&self.public_key())
    }
}

/// In-memory Ed25519 key
#[derive(Clone)]
pub struct Ed25519Key {
    inner: ed25519_dalek::SigningKey,
}

impl Ed25519Key {
    pub fn generate() -> Self {
        let mut rng = rand::rngs::OsRng;
        Self {
            inner: ed25519_dalek::SigningKey::generate(&mut rng),
        }
    }

    pub fn from_bytes(secret: &[u8; ed25519_dalek::SECRET_KEY_LENGTH]) -> Self {
        Self {
            inner: ed25519_dalek::SigningKey::from_bytes(secret),
        }
    }

    pub fn from_hex(secret: &str) -> Result<Self> {
        let bytes = hex::decode(secret.strip_prefix("0x").unwrap_or(secret))?;
        let secret: [u8; ed25519_dalek::SECRET_KEY_LENGTH] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| anyhow!("private key must be 32 bytes, got {}", bytes.len()))?;
        Ok(Self::from_bytes(&secret))
    }

    pub fn secret_hex(&self) -> String {
        hex::encode(self.inner.to_bytes())
    }
}

impl std::fmt::Debug for Ed25519Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ed25519Key")
            .field("address", &self.address())
            .finish()
    }
}

impl SigningKey for Ed25519Key {
    fn public_key(&self) -> Vec<u8> {
        self.inner.verifying_key().to_bytes().to_vec()
    }

    fn sign(&self, message: &[u8]) -> Result<Signature> {
        let signature = self.inner.sign(message);
        Ok(Signature {
            public_key: self.public_key(),
            signature: signature.to_bytes().to_vec(),
        })
    }
}

/// The chain's transaction signing scheme
pub trait TransactionSigner: Send + Sync {
    fn sign_tx(&self, tx: Transaction, key: &dyn SigningKey) -> Result<Transaction>;

    /// Verify the signature and return the sending account
    fn sender(&self, tx: &Transaction) -> Result<Address>;
}

/// Canonical scheme: Ed25519 over the transaction signing hash
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519TxSigner;

impl TransactionSigner for Ed25519TxSigner {
    fn sign_tx(&self, mut tx: Transaction, key: &dyn SigningKey) -> Result<Transaction> {
        let signer = key.address();
        if signer != tx.from {
            bail!("key for {} cannot sign for sender {}", signer, tx.from);
        }
        let signature = key.sign(tx.signing_hash().as_bytes())?;
        tx.signature = Some(signature);
        Ok(tx)
    }

    fn sender(&self, tx: &Transaction) -> Result<Address> {
        let signature = tx
            .signature
            .as_ref()
            .ok_or_else(|| anyhow!("transaction {} is not signed", tx.hash()))?;
        signature.verify(tx.signing_hash().as_bytes())?;
        let signer = signature.signer();
        if signer != tx.from {
            bail!("signature belongs to {}, not sender {}", signer, tx.from);
        }
        Ok(signer)
    }
}
