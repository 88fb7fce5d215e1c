//! High-level SDK for the ticket draw client.
//!
//! A [`Session`] is the entry point: connect a [`Wallet`], then call
//! [`Session::refresh`] and [`Session::purchase`] and hand the projected view
//! to a [`RenderSink`]. Background refreshing is driven by the trigger named
//! in [`ClientConfig`].

pub mod config;
pub mod error;
pub mod render;
pub mod session;
pub mod trigger;
pub mod wallet;

pub use config::{ClientConfig, PreOwnedSlot, SimulationConfig, TriggerKind};
pub use error::{SdkError, SdkResult};
pub use render::{PurchaseTrigger, RenderSink, SlotAction};
pub use session::Session;
pub use trigger::ConfiguredTrigger;
pub use wallet::{Connection, SimulatedWallet, Wallet};

// Re-export key types
pub use draw_ledger::{InMemoryLedger, LedgerError, Receipt};
pub use draw_purchase::{PurchaseError, PurchaseFailure, PurchaseState, Settlement};
pub use draw_sync::{DrawSnapshot, RefreshHandle, SyncError};
pub use draw_types::{DrawConstants, DrawId, EventKind, Identity, LedgerEvent, SlotIndex, Wei};
pub use draw_view::{SlotState, SlotView, ViewModel};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;

    /// Helper: the viewer every scenario connects as.
    fn viewer() -> Identity {
        Identity::from_bytes([0x11; 20])
    }

    fn other(n: u8) -> Identity {
        Identity::from_bytes([0xa0 + n; 20])
    }

    fn slot(n: u32, tickets_per_draw: u32) -> SlotIndex {
        SlotIndex::new(n, tickets_per_draw).unwrap()
    }

    /// Helper: a session over a fresh in-memory ledger.
    async fn connect(config: &ClientConfig) -> (Arc<InMemoryLedger>, Session) {
        let ledger = config.simulation.build_ledger(&viewer()).unwrap();
        let wallet = SimulatedWallet::new(Arc::clone(&ledger), viewer());
        let session = Session::connect(&wallet, config).await.unwrap();
        (ledger, session)
    }

    #[derive(Default)]
    struct RecordingSink {
        views: Vec<ViewModel>,
        action_slots: Vec<Vec<SlotIndex>>,
        actions: Vec<SlotAction>,
        failures: Vec<PurchaseFailure>,
    }

    impl RenderSink for RecordingSink {
        fn render(&mut self, view: &ViewModel, actions: &[SlotAction]) {
            self.views.push(view.clone());
            self.action_slots
                .push(actions.iter().map(|a| a.slot).collect());
            self.actions = actions.to_vec();
        }

        fn render_failure(&mut self, failure: &PurchaseFailure) {
            self.failures.push(failure.clone());
        }
    }

    // -----------------------------------------------------------------------
    // 1. A fully unsold draw has nothing sold and nothing owned, for any size
    // -----------------------------------------------------------------------
    #[tokio::test]
    async fn unsold_draw_for_several_sizes() {
        for n in [1, 2, 7, 16, 40] {
            let mut config = ClientConfig::default();
            config.simulation.tickets_per_draw = n;
            let (_ledger, session) = connect(&config).await;
            let snapshot = session.refresh().await.unwrap();
            assert_eq!(snapshot.tickets_per_draw(), n);
            assert_eq!(snapshot.sold_count(), 0);
            assert!(snapshot.viewer_slots().is_empty());
        }
    }

    // -----------------------------------------------------------------------
    // 2. Connecting reads the constants once and caches them
    // -----------------------------------------------------------------------
    #[tokio::test]
    async fn connect_caches_constants() {
        let (_ledger, session) = connect(&ClientConfig::default()).await;
        let constants = session.constants();
        assert_eq!(constants.tickets_per_draw, 16);
        assert_eq!(constants.ticket_price, Wei::parse_ether("0.5").unwrap());
        assert_eq!(constants.winner_prize, Wei::parse_ether("7").unwrap());
        assert_eq!(session.identity(), &viewer());
        assert!(session.latest().is_none());
        assert!(session.view().is_none());
    }

    // -----------------------------------------------------------------------
    // 3. Sixteen slots, three sold to others and one to the viewer
    // -----------------------------------------------------------------------
    #[tokio::test]
    async fn mixed_draw_renders_twelve_purchase_triggers() {
        let mut config = ClientConfig::default();
        for (n, owner) in [(2, other(1)), (6, other(2)), (13, other(1))] {
            config.simulation.pre_owned.push(PreOwnedSlot {
                slot: n,
                owner: owner.to_string(),
            });
        }
        let (ledger, session) = connect(&config).await;
        ledger.assign_slot(slot(9, 16), viewer()).unwrap();

        let snapshot = session.refresh().await.unwrap();
        assert_eq!(snapshot.sold_count(), 4);
        assert_eq!(snapshot.viewer_slots(), &[slot(9, 16)]);

        let mut sink = RecordingSink::default();
        assert!(session.render(&mut sink));
        let view = &sink.views[0];
        assert_eq!(view.count(SlotState::SoldToOther), 3);
        assert_eq!(view.count(SlotState::OwnedByViewer), 1);
        assert_eq!(view.count(SlotState::Available), 12);
        assert_eq!(sink.action_slots[0].len(), 12);
        assert_eq!(sink.action_slots[0], view.purchasable);
    }

    // -----------------------------------------------------------------------
    // 4. A settled purchase refreshes once and adds exactly one owned slot
    // -----------------------------------------------------------------------
    #[tokio::test]
    async fn settled_purchase_through_a_slot_trigger() {
        let (ledger, session) = connect(&ClientConfig::default()).await;
        ledger.assign_slot(slot(1, 16), other(1)).unwrap();
        let before = session.refresh().await.unwrap();

        let mut sink = RecordingSink::default();
        session.render(&mut sink);
        ledger.reset_counters();
        let settlement = sink.actions[3].trigger.fire().await.unwrap();

        assert_eq!(ledger.draw_id_reads(), 1);
        assert_eq!(ledger.submissions(), 1);
        assert_eq!(settlement.receipt.slot, slot(2, 16));
        let after = session.latest().unwrap();
        assert_eq!(after.sold_count(), before.sold_count() + 1);
        assert_eq!(after.viewer_slots(), &[slot(2, 16)]);
        assert!(session.purchase_state().is_idle());
        assert_eq!(
            ledger.balance_of(&viewer()),
            Wei::parse_ether("9.5").unwrap()
        );
    }

    // -----------------------------------------------------------------------
    // 5. A purchase while another is in flight never reaches the ledger
    // -----------------------------------------------------------------------
    #[tokio::test]
    async fn second_purchase_is_refused_while_first_is_pending() {
        let (ledger, session) = connect(&ClientConfig::default()).await;
        let session = Arc::new(session);
        ledger.set_auto_mine(false);

        let mut states = session.subscribe_purchase();
        let first = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.purchase().await })
        };
        while !matches!(
            *states.borrow_and_update(),
            PurchaseState::AwaitingSettlement { .. }
        ) {
            states.changed().await.unwrap();
        }

        let second = session.purchase().await;
        assert!(matches!(second, Err(PurchaseError::AlreadyInFlight)));
        assert_eq!(ledger.submissions(), 1);

        ledger.mine();
        first.await.unwrap().unwrap();
        assert_eq!(ledger.submissions(), 1);
        assert_eq!(session.latest().unwrap().viewer_slots().len(), 1);
    }

    // -----------------------------------------------------------------------
    // 6. A reverted purchase refreshes once, changes nothing, and is rendered
    // -----------------------------------------------------------------------
    #[tokio::test]
    async fn reverted_purchase_is_reported_to_the_sink() {
        let (ledger, session) = connect(&ClientConfig::default()).await;
        let before = session.refresh().await.unwrap();
        ledger.reset_counters();
        ledger.revert_next("draw closed");

        let mut sink = RecordingSink::default();
        let err = session.purchase_and_render(&mut sink).await.unwrap_err();
        assert_eq!(
            err.failure(),
            Some(&PurchaseFailure::Reverted("draw closed".into()))
        );
        assert_eq!(ledger.draw_id_reads(), 1);
        assert_eq!(sink.failures, vec![PurchaseFailure::Reverted("draw closed".into())]);
        assert_eq!(sink.views.len(), 1);
        assert_eq!(sink.views[0].sold_count, before.sold_count());
    }

    // -----------------------------------------------------------------------
    // 7. Projecting and rendering make no ledger calls
    // -----------------------------------------------------------------------
    #[tokio::test]
    async fn rendering_is_free_of_ledger_calls() {
        let (ledger, session) = connect(&ClientConfig::default()).await;
        session.refresh().await.unwrap();
        ledger.reset_counters();

        let mut sink = RecordingSink::default();
        session.render(&mut sink);
        session.render(&mut sink);
        assert_eq!(sink.views[0], sink.views[1]);
        assert_eq!(ledger.owner_reads(), 0);
        assert_eq!(ledger.draw_id_reads(), 0);
        assert_eq!(ledger.submissions(), 0);
    }

    // -----------------------------------------------------------------------
    // 8. Ledger events drive the refresh loop
    // -----------------------------------------------------------------------
    #[tokio::test]
    async fn event_trigger_refreshes_on_foreign_purchase() {
        let mut config = ClientConfig::default();
        config.trigger = TriggerKind::Events;
        let (ledger, session) = connect(&config).await;

        let (trigger, handle) = ConfiguredTrigger::from_config(&config, &session).unwrap();
        assert!(handle.is_none());
        let mut rx = session.subscribe();
        let task = session.spawn_refresh_loop(trigger);

        ledger.assign_slot(slot(4, 16), other(3)).unwrap();
        rx.changed().await.unwrap();
        let latest = session.latest().unwrap();
        assert_eq!(latest.sold_count(), 1);
        assert!(latest.viewer_slots().is_empty());
        task.abort();
    }

    // -----------------------------------------------------------------------
    // 9. A completed draw rolls the view over to an empty draw
    // -----------------------------------------------------------------------
    #[tokio::test]
    async fn completed_draw_rolls_over() {
        let mut config = ClientConfig::default();
        config.simulation.tickets_per_draw = 2;
        let (ledger, session) = connect(&config).await;
        session.purchase().await.unwrap();
        session.purchase().await.unwrap();
        assert!(session.latest().unwrap().is_sold_out());

        let event = ledger.complete_draw(slot(2, 2)).unwrap();
        assert!(matches!(event, LedgerEvent::DrawCompleted { ref winner, .. } if *winner == viewer()));

        let snapshot = session.refresh().await.unwrap();
        assert_eq!(snapshot.draw_id(), DrawId(2));
        assert_eq!(snapshot.sold_count(), 0);
        assert!(snapshot.viewer_slots().is_empty());
    }

    // -----------------------------------------------------------------------
    // 10. Manual trigger hands back a refresh handle
    // -----------------------------------------------------------------------
    #[tokio::test]
    async fn manual_trigger_refreshes_on_request() {
        let mut config = ClientConfig::default();
        config.trigger = TriggerKind::Manual;
        let (_ledger, session) = connect(&config).await;

        let (trigger, handle) = ConfiguredTrigger::from_config(&config, &session).unwrap();
        let handle = handle.unwrap();
        let mut rx = session.subscribe();
        let task = session.spawn_refresh_loop(trigger);

        assert!(handle.request());
        rx.changed().await.unwrap();
        drop(handle);
        assert_eq!(task.await.unwrap(), 1);
    }

    // -----------------------------------------------------------------------
    // 11. Event triggers need a wallet that exposes events
    // -----------------------------------------------------------------------
    struct ReadOnlyWallet(Arc<InMemoryLedger>);

    #[async_trait]
    impl Wallet for ReadOnlyWallet {
        async fn connect(&self) -> SdkResult<Connection> {
            Ok(Connection {
                identity: viewer(),
                client: Arc::new(self.0.connect(viewer())),
                events: None,
            })
        }
    }

    #[tokio::test]
    async fn events_trigger_without_event_stream() {
        let mut config = ClientConfig::default();
        config.trigger = TriggerKind::Events;
        let ledger = config.simulation.build_ledger(&viewer()).unwrap();
        let session = Session::connect(&ReadOnlyWallet(ledger), &config).await.unwrap();
        assert!(session.events().is_none());
        assert!(matches!(
            ConfiguredTrigger::from_config(&config, &session),
            Err(SdkError::EventsUnavailable)
        ));
    }

    // -----------------------------------------------------------------------
    // 12. A ledger that is down fails the connect with a typed error
    // -----------------------------------------------------------------------
    #[tokio::test]
    async fn unavailable_ledger_fails_connect() {
        let config = ClientConfig::default();
        let ledger = config.simulation.build_ledger(&viewer()).unwrap();
        ledger.set_reads_available(false);
        let wallet = SimulatedWallet::new(ledger, viewer());
        let err = Session::connect(&wallet, &config).await.err().unwrap();
        assert!(matches!(err, SdkError::Ledger(LedgerError::Unavailable(_))));
    }

    // -----------------------------------------------------------------------
    // 13. A timed out purchase that lands later shows up on the next refresh
    // -----------------------------------------------------------------------
    #[tokio::test]
    async fn late_settlement_appears_on_next_refresh() {
        let mut config = ClientConfig::default();
        config.settlement_timeout_ms = 20;
        let (ledger, session) = connect(&config).await;
        ledger.set_auto_mine(false);

        let err = session.purchase().await.unwrap_err();
        assert_eq!(
            err.failure(),
            Some(&PurchaseFailure::SettlementTimeout(Duration::from_millis(20)))
        );
        assert_eq!(ledger.pending_count(), 1);

        ledger.mine();
        let snapshot = session.refresh().await.unwrap();
        assert_eq!(snapshot.viewer_slots(), &[slot(1, 16)]);
    }
}
