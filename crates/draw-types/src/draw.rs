use std::fmt;

use serde::{Deserialize, Serialize};

use crate::amount::Wei;
use crate::error::TypeError;

/// Identifier of one draw. Assigned by the ledger and never decreases.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DrawId(pub u64);

impl DrawId {
    pub fn get(self) -> u64 {
        self.0
    }

    /// The draw that starts after this one completes.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for DrawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A ticket position inside a draw, 1-based.
///
/// A `SlotIndex` can only be built against a known draw size, so holding one
/// means the value lies in `[1, tickets_per_draw]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotIndex(u32);

impl SlotIndex {
    pub fn new(slot: u32, tickets_per_draw: u32) -> Result<Self, TypeError> {
        if slot == 0 || slot > tickets_per_draw {
            return Err(TypeError::SlotOutOfRange {
                slot,
                tickets_per_draw,
            });
        }
        Ok(Self(slot))
    }

    /// Every slot of a draw with `tickets_per_draw` tickets, ascending.
    pub fn all(tickets_per_draw: u32) -> impl Iterator<Item = SlotIndex> {
        (1..=tickets_per_draw).map(SlotIndex)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Zero-based position, for indexing per-draw vectors.
    pub fn offset(self) -> usize {
        (self.0 - 1) as usize
    }
}

impl fmt::Display for SlotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Constants configured on the draw contract.
///
/// Read once when a session connects and treated as immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawConstants {
    pub tickets_per_draw: u32,
    pub ticket_price: Wei,
    pub winner_prize: Wei,
    pub creator_prize: Wei,
}

impl DrawConstants {
    pub fn validate(&self) -> Result<(), TypeError> {
        if self.tickets_per_draw == 0 {
            return Err(TypeError::EmptyDraw);
        }
        Ok(())
    }

    /// Total a full draw collects in ticket sales.
    pub fn pot(&self) -> Option<Wei> {
        self.ticket_price.checked_mul(u128::from(self.tickets_per_draw))
    }
}
