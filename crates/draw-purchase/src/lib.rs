//! Purchase coordination for the ticket draw client.
//!
//! A purchase moves through `Idle -> Submitting -> AwaitingSettlement` and
//! ends in `Settled` or `Failed`. Whichever way it ends, the coordinator
//! refreshes the draw exactly once before going back to `Idle`, so the
//! displayed state never silently diverges from the ledger.
//!
//! Only one attempt per viewer can be in flight. A second `purchase()` while
//! the first is running returns [`PurchaseError::AlreadyInFlight`] without
//! touching the ledger.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod state;

pub use config::PurchaseConfig;
pub use coordinator::{PurchaseCoordinator, Settlement};
pub use error::{PurchaseError, PurchaseFailure};
pub use state::PurchaseState;
