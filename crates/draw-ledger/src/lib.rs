//! Ledger capability for the ticket draw client.
//!
//! This crate defines the only boundary through which the client talks to
//! the draw contract:
//! - `LedgerClient` for point reads, purchase submission and inclusion
//! - `LedgerEvents` for the contract's event stream
//! - `InMemoryLedger`, a chain double for tests, demos and embedding
//!
//! Implementations never cache and never retry. Callers own both decisions.

pub mod error;
pub mod memory;
pub mod records;
pub mod traits;

pub use error::{LedgerError, LedgerResult};
pub use memory::{InMemoryClient, InMemoryLedger};
pub use records::{PendingTx, Receipt, TxHash};
pub use traits::{load_constants, LedgerClient, LedgerEvents};
