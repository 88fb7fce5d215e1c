use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// The ledger's "no owner" sentinel.
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// A wallet address as reported by the ledger or the wallet provider.
///
/// The original spelling is kept for display (checksummed addresses carry
/// mixed case), but equality and hashing only look at the lowercase form:
/// `0xAbC...` and `0xabc...` are the same identity.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity {
    raw: String,
    normalized: String,
}

impl Identity {
    /// Parse a `0x`-prefixed, 20-byte hex address.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let s = s.trim();
        let body = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| TypeError::InvalidAddress(s.to_string()))?;
        let bytes = hex::decode(body).map_err(|_| TypeError::InvalidAddress(s.to_string()))?;
        if bytes.len() != 20 {
            return Err(TypeError::InvalidAddress(s.to_string()));
        }
        Ok(Self {
            raw: s.to_string(),
            normalized: s.to_ascii_lowercase(),
        })
    }

    /// Interpret an owner word returned by the ledger.
    ///
    /// The zero address means the slot is unsold and maps to `None`.
    pub fn parse_owner(raw: &str) -> Result<Option<Self>, TypeError> {
        let identity = Self::parse(raw)?;
        if identity.is_zero() {
            Ok(None)
        } else {
            Ok(Some(identity))
        }
    }

    /// A random address, for tests and demos.
    pub fn random() -> Self {
        let mut bytes = [0u8; 20];
        rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
        Self::from_bytes(bytes)
    }

    /// Build an address from its 20 raw bytes.
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        let raw = format!("0x{}", hex::encode(bytes));
        Self {
            normalized: raw.clone(),
            raw,
        }
    }

    /// `true` for the ledger's null-address sentinel.
    pub fn is_zero(&self) -> bool {
        self.normalized == ZERO_ADDRESS
    }

    /// The address as originally spelled.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The lowercase form used for comparison.
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// Abbreviated display form: `0x1234...abcd`.
    pub fn short(&self) -> String {
        let len = self.raw.len();
        format!("{}...{}", &self.raw[..6], &self.raw[len - 4..])
    }
}

impl PartialEq for Identity {
    fn eq(&self, other: &Self) -> bool {
        self.normalized == other.normalized
    }
}

impl Eq for Identity {}

impl Hash for Identity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized.hash(state);
    }
}

impl TryFrom<String> for Identity {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Identity> for String {
    fn from(value: Identity) -> Self {
        value.raw
    }
}

impl std::str::FromStr for Identity {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({})", self.short())
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
