//! Reconciliation engine for the ticket draw client.
//!
//! Keeps a local view of a draw consistent with the ledger:
//! - [`fan_out`] runs N independent ledger calls concurrently and joins them,
//!   aborting the rest on the first failure
//! - [`SnapshotBuilder`] reads every slot of a draw and merges the results
//!   into one immutable [`DrawSnapshot`]
//! - [`LatestSnapshot`] adopts completed snapshots in start order, so a slow
//!   refresh never overwrites a newer one
//! - [`RefreshTrigger`] decides when to refresh (polling, ledger events, or
//!   explicit requests) and [`run_refresh_loop`] drives it
//!
//! Snapshots are consistent per refresh, not across refreshes. The N reads
//! are not atomic with respect to purchases landing in between.

pub mod builder;
pub mod driver;
pub mod error;
pub mod fanout;
pub mod latest;
pub mod snapshot;
pub mod trigger;

pub use builder::SnapshotBuilder;
pub use driver::run_refresh_loop;
pub use error::{SyncError, SyncResult};
pub use fanout::{fan_out, FanOutError};
pub use latest::LatestSnapshot;
pub use snapshot::{DrawSnapshot, SlotOwnership};
pub use trigger::{
    EventFilter, EventTrigger, ManualTrigger, PollTrigger, RefreshHandle, RefreshReason,
    RefreshTrigger,
};
