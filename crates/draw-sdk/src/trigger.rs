use async_trait::async_trait;

use draw_sync::{
    EventFilter, EventTrigger, ManualTrigger, PollTrigger, RefreshHandle, RefreshReason,
    RefreshTrigger,
};
use draw_types::EventKind;

use crate::config::{ClientConfig, TriggerKind};
use crate::error::{SdkError, SdkResult};
use crate::session::Session;

/// The refresh trigger selected by [`ClientConfig::trigger`].
pub enum ConfiguredTrigger {
    Poll(PollTrigger),
    Events(EventTrigger),
    Manual(ManualTrigger),
}

impl ConfiguredTrigger {
    /// Build the trigger `config` asks for.
    ///
    /// The handle is returned for `manual` only. `events` needs a wallet
    /// that exposes the ledger's event stream.
    pub fn from_config(
        config: &ClientConfig,
        session: &Session,
    ) -> SdkResult<(Self, Option<RefreshHandle>)> {
        match config.trigger {
            TriggerKind::Poll => Ok((Self::Poll(PollTrigger::new(config.poll_interval())), None)),
            TriggerKind::Events => {
                let events = session.events().ok_or(SdkError::EventsUnavailable)?;
                let filter = EventFilter::kinds([
                    EventKind::TicketPurchased,
                    EventKind::DrawStarted,
                    EventKind::DrawCompleted,
                    EventKind::DrawTimedOut,
                ]);
                Ok((Self::Events(EventTrigger::new(events, filter)), None))
            }
            TriggerKind::Manual => {
                let (handle, trigger) = ManualTrigger::channel();
                Ok((Self::Manual(trigger), Some(handle)))
            }
        }
    }
}

#[async_trait]
impl RefreshTrigger for ConfiguredTrigger {
    async fn next(&mut self) -> Option<RefreshReason> {
        match self {
            Self::Poll(t) => t.next().await,
            Self::Events(t) => t.next().await,
            Self::Manual(t) => t.next().await,
        }
    }
}
