use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::values::{Amount, Shares, Ticker, Timestamp};

/// Point-in-time valuation reported by a portfolio manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioStatus {
    pub time: Timestamp,
    pub cash: Amount,
    pub holdings: BTreeMap<Ticker, Shares>,
    /// Holdings marked at bid (or last known price)
    pub market_value: Amount,
}

impl PortfolioStatus {
    /// Cash plus market value of holdings
    pub fn total_value(&self) -> Amount {
        self.cash + self.market_value
    }
}
