use draw_ledger::LedgerError;
use draw_types::SlotIndex;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("ledger unavailable: {0}")]
    LedgerUnavailable(LedgerError),

    #[error("read of ticket {slot} failed: {source}")]
    PartialReadFailure { slot: SlotIndex, source: LedgerError },

    #[error("read task failed: {0}")]
    TaskFailed(String),
}

pub type SyncResult<T> = Result<T, SyncError>;
