use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use draw_ledger::InMemoryLedger;
use draw_purchase::PurchaseConfig;
use draw_types::{DrawConstants, Identity, SlotIndex, Wei};

use crate::error::{SdkError, SdkResult};

/// How the refresh loop is driven.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    #[default]
    Poll,
    Events,
    Manual,
}

/// Client configuration, usually loaded from a TOML file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Address to connect with. A random one is used when unset.
    #[serde(default)]
    pub wallet: Option<String>,
    #[serde(default = "default_settlement_timeout_ms")]
    pub settlement_timeout_ms: u64,
    #[serde(default)]
    pub trigger: TriggerKind,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

fn default_settlement_timeout_ms() -> u64 {
    120_000
}

fn default_poll_interval_ms() -> u64 {
    5_000
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            wallet: None,
            settlement_timeout_ms: default_settlement_timeout_ms(),
            trigger: TriggerKind::default(),
            poll_interval_ms: default_poll_interval_ms(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn load(path: impl AsRef<Path>) -> SdkResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SdkError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> SdkResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| SdkError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> SdkResult<String> {
        toml::to_string_pretty(self).map_err(|e| SdkError::InvalidConfig(e.to_string()))
    }

    pub fn validate(&self) -> SdkResult<()> {
        if self.settlement_timeout_ms == 0 {
            return Err(SdkError::InvalidConfig("settlement_timeout_ms must be positive".into()));
        }
        if self.poll_interval_ms == 0 {
            return Err(SdkError::InvalidConfig("poll_interval_ms must be positive".into()));
        }
        if let Some(wallet) = &self.wallet {
            Identity::parse(wallet)?;
        }
        self.simulation.constants()?;
        Ok(())
    }

    /// The configured wallet address, if any.
    pub fn wallet_identity(&self) -> SdkResult<Option<Identity>> {
        Ok(self.wallet.as_deref().map(Identity::parse).transpose()?)
    }

    pub fn purchase_config(&self) -> PurchaseConfig {
        PurchaseConfig::with_settlement_timeout(Duration::from_millis(self.settlement_timeout_ms))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Settings for the in-memory ledger the CLI runs against.
///
/// Amounts are decimal ether strings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_tickets_per_draw")]
    pub tickets_per_draw: u32,
    #[serde(default = "default_ticket_price")]
    pub ticket_price: String,
    #[serde(default = "default_winner_prize")]
    pub winner_prize: String,
    #[serde(default = "default_creator_prize")]
    pub creator_prize: String,
    /// Balance given to the connecting wallet.
    #[serde(default = "default_starting_balance")]
    pub starting_balance: String,
    /// Slots already sold when the ledger starts.
    #[serde(default)]
    pub pre_owned: Vec<PreOwnedSlot>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreOwnedSlot {
    pub slot: u32,
    pub owner: String,
}

fn default_tickets_per_draw() -> u32 {
    16
}

fn default_ticket_price() -> String {
    "0.5".into()
}

fn default_winner_prize() -> String {
    "7".into()
}

fn default_creator_prize() -> String {
    "1".into()
}

fn default_starting_balance() -> String {
    "10".into()
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tickets_per_draw: default_tickets_per_draw(),
            ticket_price: default_ticket_price(),
            winner_prize: default_winner_prize(),
            creator_prize: default_creator_prize(),
            starting_balance: default_starting_balance(),
            pre_owned: Vec::new(),
        }
    }
}

impl SimulationConfig {
    pub fn constants(&self) -> SdkResult<DrawConstants> {
        let constants = DrawConstants {
            tickets_per_draw: self.tickets_per_draw,
            ticket_price: Wei::parse_ether(&self.ticket_price)?,
            winner_prize: Wei::parse_ether(&self.winner_prize)?,
            creator_prize: Wei::parse_ether(&self.creator_prize)?,
        };
        constants.validate()?;
        Ok(constants)
    }

    pub fn starting_balance(&self) -> SdkResult<Wei> {
        Ok(Wei::parse_ether(&self.starting_balance)?)
    }

    /// Build the in-memory ledger, fund `viewer`, and record pre-owned slots.
    pub fn build_ledger(&self, viewer: &Identity) -> SdkResult<Arc<InMemoryLedger>> {
        let constants = self.constants()?;
        let tickets_per_draw = constants.tickets_per_draw;
        let ledger = InMemoryLedger::new(constants);
        ledger.set_balance(viewer, self.starting_balance()?);
        for pre in &self.pre_owned {
            let slot = SlotIndex::new(pre.slot, tickets_per_draw)?;
            let owner = Identity::parse(&pre.owner)?;
            ledger.assign_slot(slot, owner)?;
        }
        Ok(ledger)
    }
}
