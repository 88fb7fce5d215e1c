use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;

use draw_types::{DrawConstants, DrawId, Identity, LedgerEvent, SlotIndex, Wei};

use crate::error::LedgerResult;
use crate::records::{PendingTx, Receipt};

/// Capability over the draw contract, bound to one connected identity.
///
/// Reads are side-effect free. `submit_purchase` signs with the bound
/// identity; the signing key never leaves the wallet behind the
/// implementation.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// The identity purchases are signed with.
    fn identity(&self) -> &Identity;

    async fn current_draw_id(&self) -> LedgerResult<DrawId>;

    /// Owner of `slot` in `draw`, or `None` while unsold.
    async fn owner_of(&self, draw: DrawId, slot: SlotIndex) -> LedgerResult<Option<Identity>>;

    async fn tickets_per_draw(&self) -> LedgerResult<u32>;
    async fn ticket_price(&self) -> LedgerResult<Wei>;
    async fn winner_prize(&self) -> LedgerResult<Wei>;
    async fn creator_prize(&self) -> LedgerResult<Wei>;

    /// Sign and broadcast a `buyTicket` call carrying `value`.
    async fn submit_purchase(&self, value: Wei) -> LedgerResult<PendingTx>;

    /// Wait until `tx` is included, or give up after `timeout`.
    ///
    /// Only the calling task waits. A timeout says nothing about whether the
    /// transaction lands later.
    async fn await_inclusion(&self, tx: &PendingTx, timeout: Duration) -> LedgerResult<Receipt>;
}

/// Access to the contract's event stream.
pub trait LedgerEvents: Send + Sync {
    fn subscribe(&self) -> broadcast::Receiver<LedgerEvent>;
}

/// Read all configured constants concurrently.
pub async fn load_constants(client: &dyn LedgerClient) -> LedgerResult<DrawConstants> {
    let (tickets_per_draw, ticket_price, winner_prize, creator_prize) = tokio::try_join!(
        client.tickets_per_draw(),
        client.ticket_price(),
        client.winner_prize(),
        client.creator_prize(),
    )?;
    let constants = DrawConstants {
        tickets_per_draw,
        ticket_price,
        winner_prize,
        creator_prize,
    };
    constants.validate()?;
    Ok(constants)
}
