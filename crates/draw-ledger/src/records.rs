use std::fmt;

use serde::{Deserialize, Serialize};

use draw_types::{DrawId, Identity, SlotIndex, Wei};

/// Transaction hash assigned at submission.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxHash([u8; 32]);

impl TxHash {
    /// Derive the hash of a purchase from its sender, nonce and value.
    pub fn derive(from: &Identity, nonce: u64, value: Wei) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"draw-tx-v1:");
        hasher.update(from.normalized().as_bytes());
        hasher.update(&nonce.to_be_bytes());
        hasher.update(&value.0.to_be_bytes());
        Self(*hasher.finalize().as_bytes())
    }

    pub fn from_raw(hash: [u8; 32]) -> Self {
        Self(hash)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn short_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.0[..4]))
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({})", self.short_hex())
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_hex())
    }
}

/// A purchase accepted by the ledger but not yet included.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTx {
    pub hash: TxHash,
    pub from: Identity,
    pub value: Wei,
    pub nonce: u64,
}

/// Proof that a purchase was included and executed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub tx_hash: TxHash,
    pub block: u64,
    pub draw: DrawId,
    /// Slot the contract assigned to the buyer.
    pub slot: SlotIndex,
    pub buyer: Identity,
}
