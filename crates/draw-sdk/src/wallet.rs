use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use draw_ledger::{InMemoryLedger, LedgerClient, LedgerEvents};
use draw_types::Identity;

use crate::error::SdkResult;

/// An established wallet session.
pub struct Connection {
    pub identity: Identity,
    pub client: Arc<dyn LedgerClient>,
    /// The contract's event stream, when the provider offers one.
    pub events: Option<Arc<dyn LedgerEvents>>,
}

/// Source of the viewer identity and a ledger client bound to it.
///
/// Key custody stays with the provider; the session only ever sees the
/// address and a client that signs on its behalf.
#[async_trait]
pub trait Wallet: Send + Sync {
    async fn connect(&self) -> SdkResult<Connection>;
}

/// Wallet over an [`InMemoryLedger`].
pub struct SimulatedWallet {
    ledger: Arc<InMemoryLedger>,
    identity: Identity,
}

impl SimulatedWallet {
    pub fn new(ledger: Arc<InMemoryLedger>, identity: Identity) -> Self {
        Self { ledger, identity }
    }

    pub fn ledger(&self) -> &Arc<InMemoryLedger> {
        &self.ledger
    }
}

#[async_trait]
impl Wallet for SimulatedWallet {
    async fn connect(&self) -> SdkResult<Connection> {
        let client = Arc::new(self.ledger.connect(self.identity.clone()));
        info!(wallet = %self.identity.short(), "wallet connected");
        Ok(Connection {
            identity: self.identity.clone(),
            client: client.clone(),
            events: Some(client),
        })
    }
}
