use draw_sync::DrawSnapshot;
use draw_types::Identity;

use crate::model::{SlotState, SlotView, ViewModel};

/// Projects snapshots into view models.
pub struct ViewProjector;

impl ViewProjector {
    /// Classify every slot of `snapshot` relative to `viewer`.
    ///
    /// Ownership is re-read from the snapshot rather than taken from its
    /// derived fields, so a snapshot refreshed for one identity projects
    /// correctly for another. Without a viewer nothing is `OwnedByViewer`.
    pub fn project(snapshot: &DrawSnapshot, viewer: Option<&Identity>) -> ViewModel {
        let slots: Vec<SlotView> = snapshot
            .ownership()
            .iter()
            .map(|(slot, owner)| {
                let state = match owner {
                    None => SlotState::Available,
                    Some(owner) if Some(owner) == viewer => SlotState::OwnedByViewer,
                    Some(_) => SlotState::SoldToOther,
                };
                SlotView {
                    slot,
                    state,
                    owner: owner.cloned(),
                }
            })
            .collect();

        let viewer_slots = slots
            .iter()
            .filter(|s| s.state == SlotState::OwnedByViewer)
            .map(|s| s.slot)
            .collect();
        let purchasable = slots
            .iter()
            .filter(|s| s.state.is_available())
            .map(|s| s.slot)
            .collect();

        ViewModel {
            draw_id: snapshot.draw_id(),
            tickets_per_draw: snapshot.tickets_per_draw(),
            sold_count: snapshot.sold_count(),
            viewer: viewer.cloned(),
            viewer_slots,
            slots,
            purchasable,
            sequence: snapshot.sequence(),
        }
    }
}
