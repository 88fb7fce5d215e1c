use std::time::Duration;

use draw_types::{TypeError, Wei};

/// Errors produced by ledger operations.
///
/// The variants follow where a failure originates: the transport
/// (`Unavailable`), the wallet (`UserRejected`, `InsufficientFunds`), or
/// contract execution (`Reverted`).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("ledger unavailable: {0}")]
    Unavailable(String),

    #[error("insufficient funds: need {required}, have {available}")]
    InsufficientFunds { required: Wei, available: Wei },

    #[error("transaction rejected by the wallet")]
    UserRejected,

    #[error("transaction reverted: {0}")]
    Reverted(String),

    #[error("transaction not included within {0:?}")]
    SettlementTimeout(Duration),

    #[error("malformed ledger data: {0}")]
    Malformed(#[from] TypeError),
}

pub type LedgerResult<T> = Result<T, LedgerError>;
