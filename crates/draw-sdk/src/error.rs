use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("wallet connection failed: {0}")]
    WalletUnavailable(String),

    #[error("the connected wallet does not expose ledger events")]
    EventsUnavailable,

    #[error("failed to read config {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("ledger error: {0}")]
    Ledger(#[from] draw_ledger::LedgerError),

    #[error("sync error: {0}")]
    Sync(#[from] draw_sync::SyncError),

    #[error("invalid value: {0}")]
    Type(#[from] draw_types::TypeError),
}

pub type SdkResult<T> = Result<T, SdkError>;
