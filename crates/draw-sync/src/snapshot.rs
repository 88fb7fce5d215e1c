use draw_types::{DrawId, Identity, SlotIndex};

/// Owner of every slot of one draw, as read during one refresh.
///
/// Built once from the joined reads and never modified afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotOwnership {
    owners: Vec<Option<Identity>>,
}

impl SlotOwnership {
    /// `owners[i]` is the owner of slot `i + 1`.
    pub fn from_owners(owners: Vec<Option<Identity>>) -> Self {
        Self { owners }
    }

    /// A draw of `tickets_per_draw` slots with nothing sold.
    pub fn unsold(tickets_per_draw: u32) -> Self {
        Self {
            owners: vec![None; tickets_per_draw as usize],
        }
    }

    pub fn tickets_per_draw(&self) -> u32 {
        self.owners.len() as u32
    }

    pub fn owner(&self, slot: SlotIndex) -> Option<&Identity> {
        self.owners.get(slot.offset()).and_then(Option::as_ref)
    }

    /// Every slot with its owner, ascending by slot.
    pub fn iter(&self) -> impl Iterator<Item = (SlotIndex, Option<&Identity>)> + '_ {
        SlotIndex::all(self.tickets_per_draw()).zip(self.owners.iter().map(Option::as_ref))
    }

    pub fn sold_count(&self) -> usize {
        self.owners.iter().filter(|o| o.is_some()).count()
    }

    /// Slots owned by `who`, ascending.
    pub fn slots_owned_by(&self, who: &Identity) -> Vec<SlotIndex> {
        self.iter()
            .filter(|(_, owner)| *owner == Some(who))
            .map(|(slot, _)| slot)
            .collect()
    }
}

/// Point-in-time view of one draw, derived for one viewer.
///
/// The derived fields are computed at construction, so `sold_count` always
/// equals the number of sold slots in `ownership` and `viewer_slots` always
/// lists exactly the viewer's slots in ascending order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DrawSnapshot {
    draw_id: DrawId,
    ownership: SlotOwnership,
    sold_count: usize,
    viewer: Option<Identity>,
    viewer_slots: Vec<SlotIndex>,
    sequence: u64,
}

impl DrawSnapshot {
    pub fn new(
        draw_id: DrawId,
        ownership: SlotOwnership,
        viewer: Option<&Identity>,
        sequence: u64,
    ) -> Self {
        let sold_count = ownership.sold_count();
        let viewer_slots = viewer
            .map(|who| ownership.slots_owned_by(who))
            .unwrap_or_default();
        Self {
            draw_id,
            ownership,
            sold_count,
            viewer: viewer.cloned(),
            viewer_slots,
            sequence,
        }
    }

    pub fn draw_id(&self) -> DrawId {
        self.draw_id
    }

    pub fn ownership(&self) -> &SlotOwnership {
        &self.ownership
    }

    pub fn tickets_per_draw(&self) -> u32 {
        self.ownership.tickets_per_draw()
    }

    pub fn sold_count(&self) -> usize {
        self.sold_count
    }

    /// Identity the snapshot was derived for.
    pub fn viewer(&self) -> Option<&Identity> {
        self.viewer.as_ref()
    }

    pub fn viewer_slots(&self) -> &[SlotIndex] {
        &self.viewer_slots
    }

    /// Refresh sequence number, taken when the refresh started.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn is_sold_out(&self) -> bool {
        self.sold_count == self.ownership.tickets_per_draw() as usize
    }
}
