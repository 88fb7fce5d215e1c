use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, warn};

use draw_ledger::LedgerClient;
use draw_sdk::{Identity, InMemoryLedger, RefreshHandle, SlotIndex};

/// Other buyers on the in-memory ledger.
///
/// Every `period` a fresh buyer purchases one ticket. Once the draw is sold
/// out the operator completes it with a random winning ticket. After each
/// step `refresh` (if any) is asked for a refresh.
pub async fn simulate(ledger: Arc<InMemoryLedger>, period: Duration, refresh: Option<RefreshHandle>) {
    let mut interval = tokio::time::interval(period);
    interval.tick().await;
    loop {
        interval.tick().await;
        step(&ledger).await;
        if let Some(handle) = &refresh {
            handle.request();
        }
    }
}

async fn step(ledger: &Arc<InMemoryLedger>) {
    let constants = ledger.constants().clone();
    let draw = ledger.current_draw();
    if ledger.sold_count(draw) >= constants.tickets_per_draw as usize {
        let winning = rand::thread_rng().gen_range(1..=constants.tickets_per_draw);
        let result = SlotIndex::new(winning, constants.tickets_per_draw)
            .map_err(Into::into)
            .and_then(|slot| ledger.complete_draw(slot));
        if let Err(e) = result {
            warn!(draw = %draw, error = %e, "could not complete draw");
        }
        return;
    }

    let buyer = Identity::random();
    ledger.set_balance(&buyer, constants.ticket_price);
    let client = ledger.connect(buyer.clone());
    match client.submit_purchase(constants.ticket_price).await {
        Ok(tx) => debug!(buyer = %buyer.short(), tx = %tx.hash, "simulated purchase"),
        Err(e) => warn!(buyer = %buyer.short(), error = %e, "simulated purchase failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use draw_sdk::{DrawConstants, DrawId, Wei};

    fn ledger(n: u32) -> Arc<InMemoryLedger> {
        InMemoryLedger::new(DrawConstants {
            tickets_per_draw: n,
            ticket_price: Wei(5),
            winner_prize: Wei(8),
            creator_prize: Wei(2),
        })
    }

    #[tokio::test]
    async fn buyers_fill_the_draw_then_it_completes() {
        let ledger = ledger(2);
        step(&ledger).await;
        step(&ledger).await;
        assert_eq!(ledger.sold_count(DrawId(1)), 2);

        step(&ledger).await;
        assert_eq!(ledger.current_draw(), DrawId(2));
        assert_eq!(ledger.sold_count(DrawId(2)), 0);
    }
}
