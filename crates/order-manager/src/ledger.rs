//! Result ledgers and outcome counts

use evolver_core::{Ledger, SecurityTrade, Trade};
use serde::{Deserialize, Serialize};

/// Trade and decision ledgers filled by the order listener
///
/// Only confirmed trades are recorded; each confirmation adds exactly one
/// entry to each ledger, keyed by trade time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerBook {
    pub trades: Ledger<SecurityTrade>,
    pub decisions: Ledger<Trade>,
}

impl LedgerBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, requested: &Trade, confirmed: &SecurityTrade) {
        self.trades.record(confirmed.time, confirmed.clone());
        self.decisions.record(confirmed.time, requested.clone());
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }
}

/// Terminal outcomes seen by the order listener
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub submitted: u64,
    pub confirmed: u64,
    pub rejected: u64,
}

impl OutcomeCounts {
    /// Every submission resolved to exactly one outcome
    pub fn is_balanced(&self) -> bool {
        self.submitted == self.confirmed + self.rejected
    }
}
