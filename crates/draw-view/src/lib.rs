//! Render-ready projection of a ticket draw.
//!
//! [`ViewProjector::project`] turns a [`draw_sync::DrawSnapshot`] into a
//! [`ViewModel`] for one viewer. Projection is pure: it reads nothing from
//! the ledger and the same inputs always give the same model.

pub mod model;
pub mod projector;

pub use model::{SlotState, SlotView, ViewModel};
pub use projector::ViewProjector;
