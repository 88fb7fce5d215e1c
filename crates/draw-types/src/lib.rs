//! Foundation types for the ticket draw client.
//!
//! Every other crate in the workspace depends on `draw-types`. Nothing here
//! performs I/O; the types describe what the ledger reports and what the
//! client derives from it.
//!
//! # Key Types
//!
//! - [`DrawId`]: Identifier of one round of the slot inventory
//! - [`SlotIndex`]: A 1-based ticket position inside a draw
//! - [`Identity`]: Wallet address with case-insensitive equality
//! - [`Wei`]: Native token amount in the ledger's smallest unit
//! - [`DrawConstants`]: Configured constants read once at connect time
//! - [`LedgerEvent`]: Events the ledger emits for purchases and draw changes

pub mod amount;
pub mod draw;
pub mod error;
pub mod event;
pub mod identity;

pub use amount::Wei;
pub use draw::{DrawConstants, DrawId, SlotIndex};
pub use error::TypeError;
pub use event::{EventKind, LedgerEvent};
pub use identity::Identity;
