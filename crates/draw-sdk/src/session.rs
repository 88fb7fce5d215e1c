use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use draw_ledger::{load_constants, LedgerClient, LedgerEvents};
use draw_purchase::{PurchaseCoordinator, PurchaseError, PurchaseState, Settlement};
use draw_sync::{run_refresh_loop, DrawSnapshot, LatestSnapshot, RefreshTrigger, SnapshotBuilder};
use draw_types::{DrawConstants, Identity, LedgerEvent};
use draw_view::{ViewModel, ViewProjector};

use crate::config::ClientConfig;
use crate::error::SdkResult;
use crate::render::{PurchaseTrigger, RenderSink, SlotAction};
use crate::wallet::{Connection, Wallet};

/// Everything one connected viewer needs, built once on connect.
///
/// The identity and the draw constants are fixed for the session's
/// lifetime. The latest snapshot is replaced wholesale by each adopted
/// refresh.
pub struct Session {
    identity: Identity,
    constants: DrawConstants,
    client: Arc<dyn LedgerClient>,
    events: Option<Arc<dyn LedgerEvents>>,
    builder: Arc<SnapshotBuilder>,
    latest: Arc<LatestSnapshot>,
    coordinator: Arc<PurchaseCoordinator>,
}

impl Session {
    /// Connect `wallet` and read the draw constants.
    pub async fn connect(wallet: &dyn Wallet, config: &ClientConfig) -> SdkResult<Self> {
        let Connection {
            identity,
            client,
            events,
        } = wallet.connect().await?;
        let constants = load_constants(client.as_ref()).await?;
        info!(
            wallet = %identity.short(),
            tickets_per_draw = constants.tickets_per_draw,
            price = %constants.ticket_price,
            "session connected"
        );

        let builder = Arc::new(SnapshotBuilder::new(
            Arc::clone(&client),
            constants.tickets_per_draw,
        ));
        let latest = Arc::new(LatestSnapshot::new());
        let coordinator = Arc::new(PurchaseCoordinator::new(
            Arc::clone(&client),
            Arc::clone(&builder),
            Arc::clone(&latest),
            constants.ticket_price,
            config.purchase_config(),
        ));

        Ok(Self {
            identity,
            constants,
            client,
            events,
            builder,
            latest,
            coordinator,
        })
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn constants(&self) -> &DrawConstants {
        &self.constants
    }

    pub fn client(&self) -> &Arc<dyn LedgerClient> {
        &self.client
    }

    /// A fresh receiver on the ledger's event stream, if the wallet has one.
    pub fn events(&self) -> Option<broadcast::Receiver<LedgerEvent>> {
        self.events.as_ref().map(|events| events.subscribe())
    }

    // ---- Commands ----

    /// Refresh the current draw and offer the result as the latest snapshot.
    ///
    /// The snapshot is returned even if a refresh that started later has
    /// already been adopted.
    pub async fn refresh(&self) -> SdkResult<DrawSnapshot> {
        let snapshot = self.builder.refresh(None, Some(&self.identity)).await?;
        self.latest.offer(snapshot.clone());
        Ok(snapshot)
    }

    /// Buy one ticket. See [`PurchaseCoordinator::purchase`].
    pub async fn purchase(&self) -> Result<Settlement, PurchaseError> {
        self.coordinator.purchase().await
    }

    /// Buy one ticket and render the outcome to `sink`.
    pub async fn purchase_and_render(
        &self,
        sink: &mut dyn RenderSink,
    ) -> Result<Settlement, PurchaseError> {
        let result = self.purchase().await;
        if let Err(PurchaseError::Failed { failure, .. }) = &result {
            sink.render_failure(failure);
        }
        self.render(sink);
        result
    }

    pub fn purchase_state(&self) -> PurchaseState {
        self.coordinator.state()
    }

    pub fn subscribe_purchase(&self) -> watch::Receiver<PurchaseState> {
        self.coordinator.subscribe()
    }

    // ---- Views ----

    pub fn latest(&self) -> Option<Arc<DrawSnapshot>> {
        self.latest.get()
    }

    /// Receiver notified on every adopted snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<DrawSnapshot>>> {
        self.latest.subscribe()
    }

    /// The latest snapshot projected for this session's viewer.
    pub fn view(&self) -> Option<ViewModel> {
        self.latest
            .get()
            .map(|snapshot| ViewProjector::project(&snapshot, Some(&self.identity)))
    }

    /// One purchase trigger per purchasable slot of `view`.
    pub fn actions(&self, view: &ViewModel) -> Vec<SlotAction> {
        let trigger = PurchaseTrigger::new(Arc::clone(&self.coordinator));
        view.purchasable
            .iter()
            .map(|&slot| SlotAction {
                slot,
                trigger: trigger.clone(),
            })
            .collect()
    }

    /// Render the latest view. Returns `false` if nothing has been adopted yet.
    pub fn render(&self, sink: &mut dyn RenderSink) -> bool {
        let Some(view) = self.view() else {
            return false;
        };
        let actions = self.actions(&view);
        sink.render(&view, &actions);
        true
    }

    // ---- Background refresh ----

    /// Run the refresh loop on its own task until `trigger` ends.
    pub fn spawn_refresh_loop<T>(&self, trigger: T) -> JoinHandle<usize>
    where
        T: RefreshTrigger + 'static,
    {
        let builder = Arc::clone(&self.builder);
        let latest = Arc::clone(&self.latest);
        let viewer = self.identity.clone();
        tokio::spawn(async move {
            let adopted = run_refresh_loop(builder, latest, Some(viewer), trigger).await;
            if adopted == 0 {
                warn!("refresh loop ended without adopting a snapshot");
            }
            adopted
        })
    }
}
