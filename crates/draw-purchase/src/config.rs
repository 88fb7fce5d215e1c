use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for purchase attempts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseConfig {
    /// How long to wait for a submitted purchase to be included.
    pub settlement_timeout: Duration,
}

impl Default for PurchaseConfig {
    fn default() -> Self {
        Self {
            settlement_timeout: Duration::from_secs(120),
        }
    }
}

impl PurchaseConfig {
    pub fn with_settlement_timeout(settlement_timeout: Duration) -> Self {
        Self { settlement_timeout }
    }
}
