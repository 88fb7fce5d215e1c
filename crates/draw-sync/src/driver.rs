use std::sync::Arc;

use tracing::{debug, warn};

use draw_types::Identity;

use crate::builder::SnapshotBuilder;
use crate::latest::LatestSnapshot;
use crate::trigger::RefreshTrigger;

/// Refresh on every request from `trigger` until it ends.
///
/// Each request runs one refresh of the current draw and offers the result
/// to `latest`. A failed refresh is logged and left for the next request;
/// the loop adds no retries of its own. Returns the number of snapshots
/// adopted.
pub async fn run_refresh_loop<T: RefreshTrigger>(
    builder: Arc<SnapshotBuilder>,
    latest: Arc<LatestSnapshot>,
    viewer: Option<Identity>,
    mut trigger: T,
) -> usize {
    let mut adopted = 0;
    while let Some(reason) = trigger.next().await {
        debug!(?reason, "refresh requested");
        match builder.refresh(None, viewer.as_ref()).await {
            Ok(snapshot) => {
                if latest.offer(snapshot) {
                    adopted += 1;
                }
            }
            Err(e) => warn!(error = %e, "refresh failed"),
        }
    }
    adopted
}
