use thiserror::Error;

/// Errors produced by type construction and parsing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("slot {slot} outside of [1, {tickets_per_draw}]")]
    SlotOutOfRange { slot: u32, tickets_per_draw: u32 },

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("draw must have at least one ticket")]
    EmptyDraw,
}
