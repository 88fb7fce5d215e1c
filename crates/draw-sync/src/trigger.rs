use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{Interval, MissedTickBehavior};
use tracing::warn;

use draw_types::{EventKind, LedgerEvent};

/// Why a refresh was requested.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RefreshReason {
    /// A polling interval elapsed.
    Poll,
    /// The ledger emitted a matching event.
    Event(LedgerEvent),
    /// Events were missed because the receiver fell behind.
    EventsLagged(u64),
    /// The presentation layer asked for one.
    Manual,
    /// A purchase attempt finished.
    PostPurchase,
}

/// Source of refresh requests.
///
/// Deployments choose between polling and event subscription; the
/// reconciliation loop does not care which. `None` ends the loop.
#[async_trait]
pub trait RefreshTrigger: Send {
    async fn next(&mut self) -> Option<RefreshReason>;
}

/// Fires on a fixed interval. The first tick fires immediately.
pub struct PollTrigger {
    interval: Interval,
}

impl PollTrigger {
    pub fn new(period: Duration) -> Self {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }
}

#[async_trait]
impl RefreshTrigger for PollTrigger {
    async fn next(&mut self) -> Option<RefreshReason> {
        self.interval.tick().await;
        Some(RefreshReason::Poll)
    }
}

/// Filter for the ledger events that should cause a refresh.
#[derive(Clone, Debug, Default)]
pub struct EventFilter {
    /// If set, only events of these kinds pass.
    pub kinds: Option<Vec<EventKind>>,
}

impl EventFilter {
    pub fn kinds(kinds: impl Into<Vec<EventKind>>) -> Self {
        Self {
            kinds: Some(kinds.into()),
        }
    }

    pub fn matches(&self, event: &LedgerEvent) -> bool {
        match &self.kinds {
            Some(kinds) => kinds.contains(&event.kind()),
            None => true,
        }
    }
}

/// Fires on ledger events that pass an [`EventFilter`].
pub struct EventTrigger {
    events: broadcast::Receiver<LedgerEvent>,
    filter: EventFilter,
}

impl EventTrigger {
    pub fn new(events: broadcast::Receiver<LedgerEvent>, filter: EventFilter) -> Self {
        Self { events, filter }
    }
}

#[async_trait]
impl RefreshTrigger for EventTrigger {
    async fn next(&mut self) -> Option<RefreshReason> {
        loop {
            match self.events.recv().await {
                Ok(event) if self.filter.matches(&event) => return Some(RefreshReason::Event(event)),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event receiver lagged");
                    return Some(RefreshReason::EventsLagged(skipped));
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Handle the presentation layer uses to request a refresh.
#[derive(Clone)]
pub struct RefreshHandle {
    tx: mpsc::Sender<()>,
}

impl RefreshHandle {
    /// Ask for a refresh. Returns `false` if one is already queued or the
    /// loop has stopped.
    pub fn request(&self) -> bool {
        self.tx.try_send(()).is_ok()
    }
}

/// Fires when a [`RefreshHandle`] asks.
pub struct ManualTrigger {
    rx: mpsc::Receiver<()>,
}

impl ManualTrigger {
    pub fn channel() -> (RefreshHandle, ManualTrigger) {
        let (tx, rx) = mpsc::channel(1);
        (RefreshHandle { tx }, ManualTrigger { rx })
    }
}

#[async_trait]
impl RefreshTrigger for ManualTrigger {
    async fn next(&mut self) -> Option<RefreshReason> {
        self.rx.recv().await.map(|_| RefreshReason::Manual)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use draw_types::{DrawId, Identity, SlotIndex};

    fn purchased() -> LedgerEvent {
        LedgerEvent::TicketPurchased {
            buyer: Identity::from_bytes([1; 20]),
            draw: DrawId(1),
            slot: SlotIndex::new(1, 16).unwrap(),
        }
    }

    #[test]
    fn default_filter_matches_everything() {
        let filter = EventFilter::default();
        assert!(filter.matches(&purchased()));
        assert!(filter.matches(&LedgerEvent::DrawTimedOut { draw: DrawId(1) }));
    }

    #[test]
    fn kind_filter() {
        let filter = EventFilter::kinds([EventKind::DrawCompleted, EventKind::DrawTimedOut]);
        assert!(!filter.matches(&purchased()));
        assert!(filter.matches(&LedgerEvent::DrawTimedOut { draw: DrawId(1) }));
    }

    #[tokio::test]
    async fn poll_trigger_fires_immediately_then_on_interval() {
        let mut trigger = PollTrigger::new(Duration::from_millis(10));
        assert_eq!(trigger.next().await, Some(RefreshReason::Poll));
        assert_eq!(trigger.next().await, Some(RefreshReason::Poll));
    }

    #[tokio::test]
    async fn event_trigger_skips_filtered_events() {
        let (tx, rx) = broadcast::channel(8);
        let mut trigger = EventTrigger::new(rx, EventFilter::kinds([EventKind::DrawStarted]));
        tx.send(purchased()).unwrap();
        tx.send(LedgerEvent::DrawStarted { draw: DrawId(2) }).unwrap();
        assert_eq!(
            trigger.next().await,
            Some(RefreshReason::Event(LedgerEvent::DrawStarted { draw: DrawId(2) }))
        );
    }

    #[tokio::test]
    async fn event_trigger_reports_lag() {
        let (tx, rx) = broadcast::channel(1);
        let mut trigger = EventTrigger::new(rx, EventFilter::default());
        tx.send(purchased()).unwrap();
        tx.send(purchased()).unwrap();
        tx.send(purchased()).unwrap();
        assert!(matches!(trigger.next().await, Some(RefreshReason::EventsLagged(_))));
    }

    #[tokio::test]
    async fn event_trigger_ends_when_ledger_goes_away() {
        let (tx, rx) = broadcast::channel::<LedgerEvent>(1);
        let mut trigger = EventTrigger::new(rx, EventFilter::default());
        drop(tx);
        assert_eq!(trigger.next().await, None);
    }

    #[tokio::test]
    async fn manual_trigger_coalesces_requests() {
        let (handle, mut trigger) = ManualTrigger::channel();
        assert!(handle.request());
        assert!(!handle.request());
        assert_eq!(trigger.next().await, Some(RefreshReason::Manual));
        drop(handle);
        assert_eq!(trigger.next().await, None);
    }
}
