use serde::Serialize;

use draw_types::{DrawId, Identity, SlotIndex};

/// How a slot looks to the viewer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotState {
    Available,
    SoldToOther,
    OwnedByViewer,
}

impl SlotState {
    pub fn is_available(self) -> bool {
        self == Self::Available
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SlotView {
    pub slot: SlotIndex,
    pub state: SlotState,
    /// Owner as read from the ledger, `None` while unsold.
    pub owner: Option<Identity>,
}

/// Everything a render sink needs to draw one draw for one viewer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ViewModel {
    pub draw_id: DrawId,
    pub tickets_per_draw: u32,
    pub sold_count: usize,
    pub viewer: Option<Identity>,
    /// Slots the viewer owns, ascending.
    pub viewer_slots: Vec<SlotIndex>,
    /// One entry per slot, ascending.
    pub slots: Vec<SlotView>,
    /// Slots that can still be bought, ascending.
    pub purchasable: Vec<SlotIndex>,
    /// Sequence of the refresh the model was projected from.
    pub sequence: u64,
}

impl ViewModel {
    pub fn is_sold_out(&self) -> bool {
        self.purchasable.is_empty()
    }

    pub fn count(&self, state: SlotState) -> usize {
        self.slots.iter().filter(|s| s.state == state).count()
    }
}
