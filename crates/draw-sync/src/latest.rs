use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use crate::snapshot::DrawSnapshot;

/// Holds the snapshot the presentation layer should show.
///
/// Completed refreshes are offered here. A snapshot is adopted only if its
/// refresh started after the one currently held; results of an older
/// refresh that finished late are dropped. Adopted snapshots replace the
/// previous one wholesale.
pub struct LatestSnapshot {
    tx: watch::Sender<Option<Arc<DrawSnapshot>>>,
}

impl LatestSnapshot {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    /// Offer a completed snapshot. Returns `true` if it was adopted.
    pub fn offer(&self, snapshot: DrawSnapshot) -> bool {
        let sequence = snapshot.sequence();
        let snapshot = Arc::new(snapshot);
        let adopted = self.tx.send_if_modified(move |held| {
            let stale = held
                .as_ref()
                .is_some_and(|current| current.sequence() >= sequence);
            if stale {
                return false;
            }
            *held = Some(snapshot);
            true
        });
        if !adopted {
            debug!(seq = sequence, "stale snapshot discarded");
        }
        adopted
    }

    pub fn get(&self) -> Option<Arc<DrawSnapshot>> {
        self.tx.borrow().clone()
    }

    /// Receiver that is notified whenever a snapshot is adopted.
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<DrawSnapshot>>> {
        self.tx.subscribe()
    }
}

impl Default for LatestSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::SlotOwnership;
    use draw_types::{DrawId, Identity};

    fn snap(sequence: u64, sold: usize) -> DrawSnapshot {
        let owners = (0..4)
            .map(|i| (i < sold).then(|| Identity::from_bytes([9; 20])))
            .collect();
        DrawSnapshot::new(DrawId(1), SlotOwnership::from_owners(owners), None, sequence)
    }

    #[test]
    fn starts_empty() {
        assert!(LatestSnapshot::new().get().is_none());
    }

    #[test]
    fn newer_refresh_replaces_older() {
        let latest = LatestSnapshot::new();
        assert!(latest.offer(snap(1, 0)));
        assert!(latest.offer(snap(2, 1)));
        assert_eq!(latest.get().unwrap().sold_count(), 1);
    }

    #[test]
    fn late_result_of_earlier_refresh_is_discarded() {
        let latest = LatestSnapshot::new();
        // Refresh 2 started later but finished first.
        assert!(latest.offer(snap(2, 3)));
        assert!(!latest.offer(snap(1, 0)));
        let held = latest.get().unwrap();
        assert_eq!(held.sequence(), 2);
        assert_eq!(held.sold_count(), 3);
    }

    #[test]
    fn same_sequence_is_not_adopted_twice() {
        let latest = LatestSnapshot::new();
        assert!(latest.offer(snap(5, 1)));
        assert!(!latest.offer(snap(5, 2)));
        assert_eq!(latest.get().unwrap().sold_count(), 1);
    }

    #[tokio::test]
    async fn subscribers_see_adopted_snapshots_only() {
        let latest = LatestSnapshot::new();
        let mut rx = latest.subscribe();
        latest.offer(snap(3, 2));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().as_ref().unwrap().sequence(), 3);

        latest.offer(snap(1, 0));
        assert!(!rx.has_changed().unwrap());
    }
}
