use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use draw_ledger::LedgerClient;
use draw_types::{DrawId, Identity, SlotIndex};

use crate::error::{SyncError, SyncResult};
use crate::fanout::{fan_out, FanOutError};
use crate::snapshot::{DrawSnapshot, SlotOwnership};

/// Reads every slot of a draw and merges the answers into a [`DrawSnapshot`].
///
/// Refreshes may overlap. Each one takes the next sequence number when it
/// starts, which [`crate::LatestSnapshot`] uses to keep only the newest.
pub struct SnapshotBuilder {
    client: Arc<dyn LedgerClient>,
    tickets_per_draw: u32,
    sequence: AtomicU64,
}

impl SnapshotBuilder {
    pub fn new(client: Arc<dyn LedgerClient>, tickets_per_draw: u32) -> Self {
        Self {
            client,
            tickets_per_draw,
            sequence: AtomicU64::new(0),
        }
    }

    pub fn tickets_per_draw(&self) -> u32 {
        self.tickets_per_draw
    }

    /// Sequence number of the most recently started refresh.
    pub fn last_sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    /// Build a snapshot of `draw`, or of the current draw when `None`.
    ///
    /// All owner reads run concurrently. If any of them fails the whole
    /// refresh fails with [`SyncError::PartialReadFailure`]; a snapshot with
    /// missing slots is never produced.
    pub async fn refresh(
        &self,
        draw: Option<DrawId>,
        viewer: Option<&Identity>,
    ) -> SyncResult<DrawSnapshot> {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let started = Instant::now();

        let draw_id = match draw {
            Some(id) => id,
            None => self
                .client
                .current_draw_id()
                .await
                .map_err(SyncError::LedgerUnavailable)?,
        };
        debug!(seq = sequence, draw = %draw_id, slots = self.tickets_per_draw, "refresh started");

        let slots: Vec<SlotIndex> = SlotIndex::all(self.tickets_per_draw).collect();
        let client = Arc::clone(&self.client);
        let owners = fan_out(slots, move |&slot| {
            let client = Arc::clone(&client);
            async move { client.owner_of(draw_id, slot).await }
        })
        .await
        .map_err(|e| match e {
            FanOutError::Failed { input, error } => SyncError::PartialReadFailure {
                slot: input,
                source: error,
            },
            FanOutError::Panicked(reason) => SyncError::TaskFailed(reason),
        })?;

        let snapshot = DrawSnapshot::new(draw_id, SlotOwnership::from_owners(owners), viewer, sequence);
        info!(
            seq = sequence,
            draw = %draw_id,
            sold = snapshot.sold_count(),
            owned = snapshot.viewer_slots().len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "refresh complete"
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use draw_ledger::{InMemoryLedger, LedgerError};
    use draw_types::{DrawConstants, Wei};

    fn constants(n: u32) -> DrawConstants {
        DrawConstants {
            tickets_per_draw: n,
            ticket_price: Wei::parse_ether("0.5").unwrap(),
            winner_prize: Wei::parse_ether("1").unwrap(),
            creator_prize: Wei::ZERO,
        }
    }

    fn addr(n: u8) -> Identity {
        Identity::from_bytes([n; 20])
    }

    fn builder_for(ledger: &Arc<InMemoryLedger>, viewer: &Identity) -> SnapshotBuilder {
        let n = ledger.constants().tickets_per_draw;
        SnapshotBuilder::new(Arc::new(ledger.connect(viewer.clone())), n)
    }

    #[tokio::test]
    async fn unsold_draw_for_any_size() {
        for n in [1, 2, 16, 40] {
            let ledger = InMemoryLedger::new(constants(n));
            let viewer = addr(1);
            let snap = builder_for(&ledger, &viewer).refresh(None, Some(&viewer)).await.unwrap();
            assert_eq!(snap.sold_count(), 0);
            assert!(snap.viewer_slots().is_empty());
            assert_eq!(snap.tickets_per_draw(), n);
            assert_eq!(ledger.owner_reads(), n as usize);
        }
    }

    #[tokio::test]
    async fn reads_current_draw_only_when_not_given() {
        let ledger = InMemoryLedger::new(constants(4));
        let viewer = addr(1);
        let builder = builder_for(&ledger, &viewer);

        builder.refresh(None, Some(&viewer)).await.unwrap();
        assert_eq!(ledger.draw_id_reads(), 1);

        let snap = builder.refresh(Some(DrawId(1)), Some(&viewer)).await.unwrap();
        assert_eq!(ledger.draw_id_reads(), 1);
        assert_eq!(snap.draw_id(), DrawId(1));
    }

    #[tokio::test]
    async fn classifies_viewer_slots() {
        let ledger = InMemoryLedger::new(constants(8));
        let viewer = addr(1);
        ledger.assign_slot(SlotIndex::new(6, 8).unwrap(), viewer.clone()).unwrap();
        ledger.assign_slot(SlotIndex::new(2, 8).unwrap(), addr(2)).unwrap();
        ledger.assign_slot(SlotIndex::new(3, 8).unwrap(), viewer.clone()).unwrap();

        let snap = builder_for(&ledger, &viewer).refresh(None, Some(&viewer)).await.unwrap();
        assert_eq!(snap.sold_count(), 3);
        let slots: Vec<u32> = snap.viewer_slots().iter().map(|s| s.get()).collect();
        assert_eq!(slots, vec![3, 6]);
    }

    #[tokio::test]
    async fn one_failed_read_fails_the_refresh() {
        let ledger = InMemoryLedger::new(constants(8));
        let viewer = addr(1);
        let bad = SlotIndex::new(5, 8).unwrap();
        ledger.fail_owner_read(bad);

        let err = builder_for(&ledger, &viewer)
            .refresh(None, Some(&viewer))
            .await
            .unwrap_err();
        match err {
            SyncError::PartialReadFailure { slot, source } => {
                assert_eq!(slot, bad);
                assert!(matches!(source, LedgerError::Unavailable(_)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn draw_counter_failure_is_ledger_unavailable() {
        let ledger = InMemoryLedger::new(constants(4));
        let viewer = addr(1);
        ledger.set_reads_available(false);
        let err = builder_for(&ledger, &viewer)
            .refresh(None, Some(&viewer))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::LedgerUnavailable(_)));
        assert_eq!(ledger.owner_reads(), 0);
    }

    #[tokio::test]
    async fn sequence_numbers_increase_per_refresh() {
        let ledger = InMemoryLedger::new(constants(2));
        let viewer = addr(1);
        let builder = builder_for(&ledger, &viewer);
        let first = builder.refresh(None, Some(&viewer)).await.unwrap();
        let second = builder.refresh(None, Some(&viewer)).await.unwrap();
        assert!(second.sequence() > first.sequence());
        assert_eq!(builder.last_sequence(), second.sequence());
    }

    #[tokio::test]
    async fn failed_refresh_still_consumes_a_sequence_number() {
        let ledger = InMemoryLedger::new(constants(2));
        let viewer = addr(1);
        let builder = builder_for(&ledger, &viewer);
        ledger.set_reads_available(false);
        assert!(builder.refresh(None, None).await.is_err());
        ledger.clear_faults();
        let snap = builder.refresh(None, None).await.unwrap();
        assert_eq!(snap.sequence(), 2);
    }
}
