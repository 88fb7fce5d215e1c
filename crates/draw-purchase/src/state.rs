use std::fmt;

use draw_ledger::{Receipt, TxHash};

use crate::error::PurchaseFailure;

/// Where a viewer's purchase attempt currently is.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum PurchaseState {
    #[default]
    Idle,
    Submitting,
    AwaitingSettlement {
        tx: TxHash,
    },
    Settled {
        receipt: Receipt,
    },
    Failed {
        reason: PurchaseFailure,
    },
}

impl PurchaseState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// `true` for `Settled` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Settled { .. } | Self::Failed { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Submitting => "submitting",
            Self::AwaitingSettlement { .. } => "awaiting-settlement",
            Self::Settled { .. } => "settled",
            Self::Failed { .. } => "failed",
        }
    }

    /// Whether the state machine allows moving from `self` to `next`.
    pub fn can_transition_to(&self, next: &PurchaseState) -> bool {
        use PurchaseState::*;
        matches!(
            (self, next),
            (Idle, Submitting)
                | (Submitting, AwaitingSettlement { .. })
                | (Submitting, Failed { .. })
                | (AwaitingSettlement { .. }, Settled { .. })
                | (AwaitingSettlement { .. }, Failed { .. })
                | (Settled { .. }, Idle)
                | (Failed { .. }, Idle)
        )
    }
}

impl fmt::Display for PurchaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AwaitingSettlement { tx } => write!(f, "awaiting-settlement({tx})"),
            Self::Failed { reason } => write!(f, "failed({reason})"),
            other => f.write_str(other.name()),
        }
    }
}
