use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info};

use draw_types::identity::ZERO_ADDRESS;
use draw_types::{DrawConstants, DrawId, Identity, LedgerEvent, SlotIndex, Wei};

use crate::error::{LedgerError, LedgerResult};
use crate::records::{PendingTx, Receipt, TxHash};
use crate::traits::{LedgerClient, LedgerEvents};

const EVENT_CAPACITY: usize = 256;

/// In-memory draw contract for tests, local demos, and embedding.
///
/// Holds the state the real contract would: the current draw, slot owners,
/// buyer balances and a mempool. Transactions are included when [`mine`]
/// runs, which happens on every submission while auto-mining is on.
///
/// The chain never picks a winner by itself. [`complete_draw`] and
/// [`time_out_draw`] are operator actions.
///
/// [`mine`]: InMemoryLedger::mine
/// [`complete_draw`]: InMemoryLedger::complete_draw
/// [`time_out_draw`]: InMemoryLedger::time_out_draw
pub struct InMemoryLedger {
    constants: DrawConstants,
    inner: RwLock<ChainState>,
    faults: Mutex<FaultPlan>,
    counters: CallCounters,
    auto_mine: AtomicBool,
    blocks: watch::Sender<u64>,
    events: broadcast::Sender<LedgerEvent>,
}

struct ChainState {
    draw: DrawId,
    owners: HashMap<(DrawId, SlotIndex), Identity>,
    balances: HashMap<Identity, Wei>,
    nonces: HashMap<Identity, u64>,
    mempool: Vec<QueuedTx>,
    outcomes: HashMap<TxHash, TxOutcome>,
    block: u64,
}

struct QueuedTx {
    tx: PendingTx,
    forced_revert: Option<String>,
}

#[derive(Clone)]
enum TxOutcome {
    Included(Receipt),
    Reverted(String),
}

#[derive(Default)]
struct FaultPlan {
    reads_down: bool,
    failing_slots: HashSet<SlotIndex>,
    reject_next_signature: bool,
    revert_next: Option<String>,
    read_latency: Duration,
}

#[derive(Default)]
struct CallCounters {
    draw_id_reads: AtomicUsize,
    owner_reads: AtomicUsize,
    submissions: AtomicUsize,
}

impl InMemoryLedger {
    /// A fresh chain at draw 1 with auto-mining on.
    pub fn new(constants: DrawConstants) -> Arc<Self> {
        let (blocks, _) = watch::channel(0);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Arc::new(Self {
            constants,
            inner: RwLock::new(ChainState {
                draw: DrawId(1),
                owners: HashMap::new(),
                balances: HashMap::new(),
                nonces: HashMap::new(),
                mempool: Vec::new(),
                outcomes: HashMap::new(),
                block: 0,
            }),
            faults: Mutex::new(FaultPlan::default()),
            counters: CallCounters::default(),
            auto_mine: AtomicBool::new(true),
            blocks,
            events,
        })
    }

    /// A client handle that signs as `identity`.
    pub fn connect(self: &Arc<Self>, identity: Identity) -> InMemoryClient {
        InMemoryClient {
            ledger: Arc::clone(self),
            identity,
        }
    }

    pub fn constants(&self) -> &DrawConstants {
        &self.constants
    }

    // ---- Operator controls ----

    pub fn set_balance(&self, who: &Identity, amount: Wei) {
        self.state_mut().balances.insert(who.clone(), amount);
    }

    pub fn balance_of(&self, who: &Identity) -> Wei {
        self.state().balances.get(who).copied().unwrap_or(Wei::ZERO)
    }

    pub fn current_draw(&self) -> DrawId {
        self.state().draw
    }

    /// Record `owner` on `slot` of the current draw without a transaction.
    pub fn assign_slot(&self, slot: SlotIndex, owner: Identity) -> LedgerResult<()> {
        self.check_slot(slot)?;
        let draw = {
            let mut state = self.state_mut();
            let draw = state.draw;
            if state.owners.contains_key(&(draw, slot)) {
                return Err(LedgerError::Reverted(format!("ticket {slot} already sold")));
            }
            state.owners.insert((draw, slot), owner.clone());
            draw
        };
        let _ = self.events.send(LedgerEvent::TicketPurchased {
            buyer: owner,
            draw,
            slot,
        });
        Ok(())
    }

    /// Owner of `slot` in `draw` as the contract stores it.
    pub fn owner(&self, draw: DrawId, slot: SlotIndex) -> Option<Identity> {
        self.state().owners.get(&(draw, slot)).cloned()
    }

    pub fn sold_count(&self, draw: DrawId) -> usize {
        self.state().owners.keys().filter(|(d, _)| *d == draw).count()
    }

    /// Close the current draw with `winning_slot` and start the next one.
    pub fn complete_draw(&self, winning_slot: SlotIndex) -> LedgerResult<LedgerEvent> {
        let (completed, started) = {
            let mut state = self.state_mut();
            let draw = state.draw;
            let winner = state
                .owners
                .get(&(draw, winning_slot))
                .cloned()
                .ok_or_else(|| LedgerError::Reverted(format!("ticket {winning_slot} is unsold")))?;
            state.draw = draw.next();
            (
                LedgerEvent::DrawCompleted {
                    draw,
                    winner,
                    winning_slot,
                },
                LedgerEvent::DrawStarted { draw: state.draw },
            )
        };
        info!(event = %completed, "draw completed");
        let _ = self.events.send(completed.clone());
        let _ = self.events.send(started);
        Ok(completed)
    }

    /// Abandon the current draw and start the next one.
    pub fn time_out_draw(&self) -> LedgerEvent {
        let (timed_out, started) = {
            let mut state = self.state_mut();
            let draw = state.draw;
            state.draw = draw.next();
            (
                LedgerEvent::DrawTimedOut { draw },
                LedgerEvent::DrawStarted { draw: state.draw },
            )
        };
        info!(event = %timed_out, "draw timed out");
        let _ = self.events.send(timed_out.clone());
        let _ = self.events.send(started);
        timed_out
    }

    /// When off, submitted transactions wait in the mempool until [`Self::mine`].
    pub fn set_auto_mine(&self, on: bool) {
        self.auto_mine.store(on, Ordering::SeqCst);
    }

    pub fn pending_count(&self) -> usize {
        self.state().mempool.len()
    }

    /// Include every pending transaction in a new block. Returns the block number.
    pub fn mine(&self) -> u64 {
        let mut emitted = Vec::new();
        let block = {
            let mut state = self.state_mut();
            state.block += 1;
            let block = state.block;
            let queued = std::mem::take(&mut state.mempool);
            for QueuedTx { tx, forced_revert } in queued {
                let outcome = match forced_revert {
                    Some(reason) => TxOutcome::Reverted(reason),
                    None => execute_purchase(&self.constants, &mut state, &tx, block),
                };
                match &outcome {
                    TxOutcome::Included(receipt) => {
                        debug!(tx = %tx.hash, slot = %receipt.slot, block, "purchase included");
                        emitted.push(LedgerEvent::TicketPurchased {
                            buyer: receipt.buyer.clone(),
                            draw: receipt.draw,
                            slot: receipt.slot,
                        });
                    }
                    TxOutcome::Reverted(reason) => {
                        debug!(tx = %tx.hash, block, reason = %reason, "purchase reverted");
                    }
                }
                state.outcomes.insert(tx.hash, outcome);
            }
            block
        };
        for event in emitted {
            let _ = self.events.send(event);
        }
        self.blocks.send_replace(block);
        block
    }

    // ---- Fault injection ----

    /// Make every read and submission fail as if the transport were down.
    pub fn set_reads_available(&self, available: bool) {
        self.faults().reads_down = !available;
    }

    /// Make `owner_of` fail for one slot.
    pub fn fail_owner_read(&self, slot: SlotIndex) {
        self.faults().failing_slots.insert(slot);
    }

    /// The wallet declines to sign the next submission.
    pub fn reject_next_signature(&self) {
        self.faults().reject_next_signature = true;
    }

    /// The next submitted transaction is included but reverts with `reason`.
    pub fn revert_next(&self, reason: impl Into<String>) {
        self.faults().revert_next = Some(reason.into());
    }

    /// Delay applied to every read before it is served.
    pub fn set_read_latency(&self, latency: Duration) {
        self.faults().read_latency = latency;
    }

    pub fn clear_faults(&self) {
        *self.faults() = FaultPlan::default();
    }

    // ---- Call counters ----

    pub fn draw_id_reads(&self) -> usize {
        self.counters.draw_id_reads.load(Ordering::SeqCst)
    }

    pub fn owner_reads(&self) -> usize {
        self.counters.owner_reads.load(Ordering::SeqCst)
    }

    pub fn submissions(&self) -> usize {
        self.counters.submissions.load(Ordering::SeqCst)
    }

    pub fn reset_counters(&self) {
        self.counters.draw_id_reads.store(0, Ordering::SeqCst);
        self.counters.owner_reads.store(0, Ordering::SeqCst);
        self.counters.submissions.store(0, Ordering::SeqCst);
    }

    // ---- Internals ----

    fn state(&self) -> RwLockReadGuard<'_, ChainState> {
        self.inner.read().expect("ledger lock poisoned")
    }

    fn state_mut(&self) -> RwLockWriteGuard<'_, ChainState> {
        self.inner.write().expect("ledger lock poisoned")
    }

    fn faults(&self) -> MutexGuard<'_, FaultPlan> {
        self.faults.lock().expect("fault plan lock poisoned")
    }

    fn check_slot(&self, slot: SlotIndex) -> LedgerResult<()> {
        if slot.get() > self.constants.tickets_per_draw {
            return Err(LedgerError::Reverted(format!("invalid ticket number {}", slot.get())));
        }
        Ok(())
    }

    async fn serve_read(&self, slot: Option<SlotIndex>) -> LedgerResult<()> {
        let latency = self.faults().read_latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        let faults = self.faults();
        if faults.reads_down {
            return Err(LedgerError::Unavailable("transport down".into()));
        }
        if let Some(slot) = slot {
            if faults.failing_slots.contains(&slot) {
                return Err(LedgerError::Unavailable(format!("read of ticket {slot} failed")));
            }
        }
        Ok(())
    }

    /// The owner word as the contract returns it: the zero address when unsold.
    fn owner_word(&self, draw: DrawId, slot: SlotIndex) -> String {
        self.state()
            .owners
            .get(&(draw, slot))
            .map(|owner| owner.as_str().to_string())
            .unwrap_or_else(|| ZERO_ADDRESS.to_string())
    }

    fn submit(&self, from: &Identity, value: Wei) -> LedgerResult<PendingTx> {
        self.counters.submissions.fetch_add(1, Ordering::SeqCst);
        {
            let mut faults = self.faults();
            if faults.reads_down {
                return Err(LedgerError::Unavailable("transport down".into()));
            }
            if std::mem::take(&mut faults.reject_next_signature) {
                return Err(LedgerError::UserRejected);
            }
        }

        let tx = {
            let mut state = self.state_mut();
            let available = state.balances.get(from).copied().unwrap_or(Wei::ZERO);
            if available < value {
                return Err(LedgerError::InsufficientFunds {
                    required: value,
                    available,
                });
            }
            let next_nonce = state.nonces.entry(from.clone()).or_insert(0);
            let nonce = *next_nonce;
            *next_nonce += 1;

            let tx = PendingTx {
                hash: TxHash::derive(from, nonce, value),
                from: from.clone(),
                value,
                nonce,
            };
            let forced_revert = self.faults().revert_next.take();
            state.mempool.push(QueuedTx {
                tx: tx.clone(),
                forced_revert,
            });
            tx
        };
        debug!(tx = %tx.hash, from = %from.short(), value = %value, "purchase submitted");

        if self.auto_mine.load(Ordering::SeqCst) {
            self.mine();
        }
        Ok(tx)
    }

    async fn wait_for(&self, tx: &PendingTx, timeout: Duration) -> LedgerResult<Receipt> {
        let mut blocks = self.blocks.subscribe();
        let wait = async {
            loop {
                let outcome = self.state().outcomes.get(&tx.hash).cloned();
                match outcome {
                    Some(TxOutcome::Included(receipt)) => return Ok(receipt),
                    Some(TxOutcome::Reverted(reason)) => return Err(LedgerError::Reverted(reason)),
                    None => {}
                }
                if blocks.changed().await.is_err() {
                    return Err(LedgerError::Unavailable("block stream closed".into()));
                }
            }
        };
        tokio::time::timeout(timeout, wait)
            .await
            .map_err(|_| LedgerError::SettlementTimeout(timeout))?
    }
}

fn execute_purchase(
    constants: &DrawConstants,
    state: &mut ChainState,
    tx: &PendingTx,
    block: u64,
) -> TxOutcome {
    if tx.value != constants.ticket_price {
        return TxOutcome::Reverted("incorrect ticket price".into());
    }
    let draw = state.draw;
    let Some(slot) = SlotIndex::all(constants.tickets_per_draw)
        .find(|slot| !state.owners.contains_key(&(draw, *slot)))
    else {
        return TxOutcome::Reverted("draw is full".into());
    };
    let balance = state.balances.get(&tx.from).copied().unwrap_or(Wei::ZERO);
    let Some(remaining) = balance.checked_sub(tx.value) else {
        return TxOutcome::Reverted("insufficient balance".into());
    };

    state.balances.insert(tx.from.clone(), remaining);
    state.owners.insert((draw, slot), tx.from.clone());
    TxOutcome::Included(Receipt {
        tx_hash: tx.hash,
        block,
        draw,
        slot,
        buyer: tx.from.clone(),
    })
}

/// [`LedgerClient`] over an [`InMemoryLedger`], bound to one identity.
#[derive(Clone)]
pub struct InMemoryClient {
    ledger: Arc<InMemoryLedger>,
    identity: Identity,
}

impl InMemoryClient {
    pub fn ledger(&self) -> &Arc<InMemoryLedger> {
        &self.ledger
    }
}

#[async_trait]
impl LedgerClient for InMemoryClient {
    fn identity(&self) -> &Identity {
        &self.identity
    }

    async fn current_draw_id(&self) -> LedgerResult<DrawId> {
        self.ledger.counters.draw_id_reads.fetch_add(1, Ordering::SeqCst);
        self.ledger.serve_read(None).await?;
        Ok(self.ledger.current_draw())
    }

    async fn owner_of(&self, draw: DrawId, slot: SlotIndex) -> LedgerResult<Option<Identity>> {
        self.ledger.counters.owner_reads.fetch_add(1, Ordering::SeqCst);
        self.ledger.check_slot(slot)?;
        self.ledger.serve_read(Some(slot)).await?;
        let word = self.ledger.owner_word(draw, slot);
        Ok(Identity::parse_owner(&word)?)
    }

    async fn tickets_per_draw(&self) -> LedgerResult<u32> {
        self.ledger.serve_read(None).await?;
        Ok(self.ledger.constants.tickets_per_draw)
    }

    async fn ticket_price(&self) -> LedgerResult<Wei> {
        self.ledger.serve_read(None).await?;
        Ok(self.ledger.constants.ticket_price)
    }

    async fn winner_prize(&self) -> LedgerResult<Wei> {
        self.ledger.serve_read(None).await?;
        Ok(self.ledger.constants.winner_prize)
    }

    async fn creator_prize(&self) -> LedgerResult<Wei> {
        self.ledger.serve_read(None).await?;
        Ok(self.ledger.constants.creator_prize)
    }

    async fn submit_purchase(&self, value: Wei) -> LedgerResult<PendingTx> {
        self.ledger.submit(&self.identity, value)
    }

    async fn await_inclusion(&self, tx: &PendingTx, timeout: Duration) -> LedgerResult<Receipt> {
        self.ledger.wait_for(tx, timeout).await
    }
}

impl LedgerEvents for InMemoryClient {
    fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.ledger.events.subscribe()
    }
}
