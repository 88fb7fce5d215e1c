use std::fmt;

use serde::{Deserialize, Serialize};

use crate::draw::{DrawId, SlotIndex};
use crate::identity::Identity;

/// Classification of ledger events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    TicketPurchased,
    DrawStarted,
    DrawCompleted,
    DrawTimedOut,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::TicketPurchased => "TicketPurchased",
            Self::DrawStarted => "DrawStarted",
            Self::DrawCompleted => "DrawCompleted",
            Self::DrawTimedOut => "DrawTimedOut",
        };
        write!(f, "{s}")
    }
}

/// An event emitted by the draw contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEvent {
    TicketPurchased {
        buyer: Identity,
        draw: DrawId,
        slot: SlotIndex,
    },
    DrawStarted {
        draw: DrawId,
    },
    DrawCompleted {
        draw: DrawId,
        winner: Identity,
        winning_slot: SlotIndex,
    },
    DrawTimedOut {
        draw: DrawId,
    },
}

impl LedgerEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::TicketPurchased { .. } => EventKind::TicketPurchased,
            Self::DrawStarted { .. } => EventKind::DrawStarted,
            Self::DrawCompleted { .. } => EventKind::DrawCompleted,
            Self::DrawTimedOut { .. } => EventKind::DrawTimedOut,
        }
    }

    /// The draw this event belongs to.
    pub fn draw(&self) -> DrawId {
        match self {
            Self::TicketPurchased { draw, .. }
            | Self::DrawStarted { draw }
            | Self::DrawCompleted { draw, .. }
            | Self::DrawTimedOut { draw } => *draw,
        }
    }
}

impl fmt::Display for LedgerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TicketPurchased { buyer, draw, slot } => {
                write!(f, "ticket {slot} of draw {draw} bought by {}", buyer.short())
            }
            Self::DrawStarted { draw } => write!(f, "draw {draw} started"),
            Self::DrawCompleted {
                draw,
                winner,
                winning_slot,
            } => write!(
                f,
                "draw {draw} completed: ticket {winning_slot} won ({})",
                winner.short()
            ),
            Self::DrawTimedOut { draw } => write!(f, "draw {draw} timed out"),
        }
    }
}
