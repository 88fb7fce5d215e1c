use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use draw_ledger::{LedgerClient, Receipt};
use draw_sync::{DrawSnapshot, LatestSnapshot, SnapshotBuilder, SyncResult};
use draw_types::{Identity, Wei};

use crate::config::PurchaseConfig;
use crate::error::{PurchaseError, PurchaseFailure};
use crate::state::PurchaseState;

/// A purchase that settled, with the refresh that followed it.
#[derive(Debug)]
pub struct Settlement {
    pub receipt: Receipt,
    pub resync: SyncResult<DrawSnapshot>,
}

/// Drives purchase attempts for one viewer.
pub struct PurchaseCoordinator {
    client: Arc<dyn LedgerClient>,
    builder: Arc<SnapshotBuilder>,
    latest: Arc<LatestSnapshot>,
    viewer: Identity,
    price: Wei,
    config: PurchaseConfig,
    state: watch::Sender<PurchaseState>,
}

/// Marks an attempt as in flight. Dropping it puts the coordinator back to
/// `Idle`, including when the purchase future itself is dropped.
struct InFlight<'a> {
    state: &'a watch::Sender<PurchaseState>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.state.send_replace(PurchaseState::Idle);
    }
}

impl PurchaseCoordinator {
    /// `price` is the per-ticket price read from the ledger at connect time.
    pub fn new(
        client: Arc<dyn LedgerClient>,
        builder: Arc<SnapshotBuilder>,
        latest: Arc<LatestSnapshot>,
        price: Wei,
        config: PurchaseConfig,
    ) -> Self {
        let viewer = client.identity().clone();
        let (state, _) = watch::channel(PurchaseState::Idle);
        Self {
            client,
            builder,
            latest,
            viewer,
            price,
            config,
            state,
        }
    }

    pub fn state(&self) -> PurchaseState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<PurchaseState> {
        self.state.subscribe()
    }

    pub fn price(&self) -> Wei {
        self.price
    }

    pub fn config(&self) -> &PurchaseConfig {
        &self.config
    }

    /// Buy one ticket.
    ///
    /// Returns [`PurchaseError::AlreadyInFlight`] immediately if another
    /// attempt is running. Otherwise submits, waits for settlement, and then
    /// refreshes the draw once whatever the outcome; the refreshed snapshot is
    /// offered to the shared [`LatestSnapshot`] and returned alongside the
    /// result.
    pub async fn purchase(&self) -> Result<Settlement, PurchaseError> {
        let guard = self.begin()?;
        let outcome = self.attempt().await;
        let resync = self.resync().await;
        drop(guard);

        match outcome {
            Ok(receipt) => Ok(Settlement { receipt, resync }),
            Err(failure) => Err(PurchaseError::Failed { failure, resync }),
        }
    }

    fn begin(&self) -> Result<InFlight<'_>, PurchaseError> {
        let mut acquired = false;
        self.state.send_if_modified(|state| {
            if state.is_idle() {
                *state = PurchaseState::Submitting;
                acquired = true;
            }
            acquired
        });
        if !acquired {
            debug!(viewer = %self.viewer.short(), "purchase rejected: already in flight");
            return Err(PurchaseError::AlreadyInFlight);
        }
        debug!(viewer = %self.viewer.short(), "purchase state: idle -> submitting");
        Ok(InFlight { state: &self.state })
    }

    async fn attempt(&self) -> Result<Receipt, PurchaseFailure> {
        let tx = match self.client.submit_purchase(self.price).await {
            Ok(tx) => tx,
            Err(e) => return Err(self.fail(e.into())),
        };
        self.transition(PurchaseState::AwaitingSettlement { tx: tx.hash });

        match self
            .client
            .await_inclusion(&tx, self.config.settlement_timeout)
            .await
        {
            Ok(receipt) => {
                info!(
                    tx = %receipt.tx_hash,
                    draw = %receipt.draw,
                    slot = %receipt.slot,
                    "purchase settled"
                );
                self.transition(PurchaseState::Settled {
                    receipt: receipt.clone(),
                });
                Ok(receipt)
            }
            Err(e) => Err(self.fail(e.into())),
        }
    }

    fn fail(&self, failure: PurchaseFailure) -> PurchaseFailure {
        warn!(viewer = %self.viewer.short(), reason = %failure, "purchase failed");
        self.transition(PurchaseState::Failed {
            reason: failure.clone(),
        });
        failure
    }

    async fn resync(&self) -> SyncResult<DrawSnapshot> {
        let result = self.builder.refresh(None, Some(&self.viewer)).await;
        match &result {
            Ok(snapshot) => {
                self.latest.offer(snapshot.clone());
            }
            Err(e) => warn!(error = %e, "post-purchase refresh failed"),
        }
        result
    }

    fn transition(&self, next: PurchaseState) {
        self.state.send_modify(|state| {
            debug_assert!(
                state.can_transition_to(&next),
                "illegal purchase transition {} -> {}",
                state.name(),
                next.name()
            );
            debug!(from = state.name(), to = next.name(), "purchase state");
            *state = next;
        });
    }
}
