use std::sync::Arc;

use draw_purchase::{PurchaseCoordinator, PurchaseError, PurchaseFailure, Settlement};
use draw_types::SlotIndex;
use draw_view::ViewModel;

/// Starts a purchase when fired.
///
/// The contract assigns the lowest unsold slot, so every trigger of a view
/// fires the same purchase; the slot only says where the trigger is shown.
#[derive(Clone)]
pub struct PurchaseTrigger {
    coordinator: Arc<PurchaseCoordinator>,
}

impl PurchaseTrigger {
    pub(crate) fn new(coordinator: Arc<PurchaseCoordinator>) -> Self {
        Self { coordinator }
    }

    pub async fn fire(&self) -> Result<Settlement, PurchaseError> {
        self.coordinator.purchase().await
    }
}

/// A purchasable slot and the trigger attached to it.
#[derive(Clone)]
pub struct SlotAction {
    pub slot: SlotIndex,
    pub trigger: PurchaseTrigger,
}

/// Presentation layer that draws view models.
pub trait RenderSink {
    /// `actions` holds one entry per purchasable slot, ascending.
    fn render(&mut self, view: &ViewModel, actions: &[SlotAction]);

    fn render_failure(&mut self, failure: &PurchaseFailure);
}
