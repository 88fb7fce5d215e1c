use std::time::Duration;

use draw_ledger::LedgerError;
use draw_sync::{DrawSnapshot, SyncResult};
use draw_types::Wei;

/// Why a purchase attempt ended in `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PurchaseFailure {
    #[error("the wallet declined to sign")]
    UserRejected,

    #[error("insufficient funds: need {required}, have {available}")]
    InsufficientFunds { required: Wei, available: Wei },

    #[error("ledger unavailable: {0}")]
    LedgerUnavailable(String),

    #[error("purchase reverted: {0}")]
    Reverted(String),

    #[error("purchase not settled within {0:?}")]
    SettlementTimeout(Duration),
}

impl From<LedgerError> for PurchaseFailure {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::UserRejected => Self::UserRejected,
            LedgerError::InsufficientFunds {
                required,
                available,
            } => Self::InsufficientFunds {
                required,
                available,
            },
            LedgerError::Reverted(reason) => Self::Reverted(reason),
            LedgerError::SettlementTimeout(after) => Self::SettlementTimeout(after),
            LedgerError::Unavailable(reason) => Self::LedgerUnavailable(reason),
            LedgerError::Malformed(e) => Self::LedgerUnavailable(e.to_string()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PurchaseError {
    #[error("a purchase is already in flight")]
    AlreadyInFlight,

    /// The attempt failed. `resync` is the refresh that followed it.
    #[error("purchase failed: {failure}")]
    Failed {
        failure: PurchaseFailure,
        resync: SyncResult<DrawSnapshot>,
    },
}

impl PurchaseError {
    pub fn failure(&self) -> Option<&PurchaseFailure> {
        match self {
            Self::AlreadyInFlight => None,
            Self::Failed { failure, .. } => Some(failure),
        }
    }
}
