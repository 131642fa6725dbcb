use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Side;
use crate::values::{Amount, Price, Shares, Ticker, Timestamp};

/// Identifier of a trade request, assigned in submission order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TradeId(pub u64);

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

/// A buy/sell decision produced by a decision provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub stock: Ticker,
    pub side: Side,
}

impl Decision {
    pub fn buy(stock: impl Into<Ticker>) -> Self {
        Self {
            stock: stock.into(),
            side: Side::Buy,
        }
    }

    pub fn sell(stock: impl Into<Ticker>) -> Self {
        Self {
            stock: stock.into(),
            side: Side::Sell,
        }
    }
}

/// Requested trade, created from a decision
///
/// `shares` stays `None` until the portfolio sizes the request during
/// validation. Validation returns a new value; a submitted request is never
/// mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    pub stock: Ticker,
    pub side: Side,
    pub shares: Option<Shares>,
    pub time: Timestamp,
}

impl Trade {
    /// Create an unsized request
    pub fn new(id: TradeId, stock: impl Into<Ticker>, side: Side, time: Timestamp) -> Self {
        Self {
            id,
            stock: stock.into(),
            side,
            shares: None,
            time,
        }
    }

    /// Create a request with an explicit share count
    pub fn with_shares(mut self, shares: Shares) -> Self {
        self.shares = Some(shares);
        self
    }

    /// Build the request for a decision taken at `time`
    pub fn from_decision(id: TradeId, decision: &Decision, time: Timestamp) -> Self {
        Self::new(id, decision.stock.clone(), decision.side, time)
    }
}

/// Confirmed trade, produced only by the market exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityTrade {
    pub trade_id: TradeId,
    pub side: Side,
    pub stock: Ticker,
    pub time: Timestamp,
    pub shares: Shares,
    pub price: Price,
    /// Buy: price * shares + fixed cost. Sell: price * shares - fixed cost.
    pub total_cost: Amount,
}

impl SecurityTrade {
    /// Build a confirmation, applying the fixed trade cost for the side
    pub fn execute(
        trade: &Trade,
        shares: Shares,
        price: Price,
        fixed_trade_cost: Amount,
    ) -> Self {
        let notional = price * Decimal::from(shares);
        let total_cost = match trade.side {
            Side::Buy => notional + fixed_trade_cost,
            Side::Sell => notional - fixed_trade_cost,
        };

        Self {
            trade_id: trade.id,
            side: trade.side,
            stock: trade.stock.clone(),
            time: trade.time,
            shares,
            price,
            total_cost,
        }
    }

    /// Price times shares, before costs
    pub fn notional(&self) -> Amount {
        self.price * Decimal::from(self.shares)
    }

    /// Signed change in cash caused by this trade
    pub fn cash_delta(&self) -> Amount {
        match self.side {
            Side::Buy => -self.total_cost,
            Side::Sell => self.total_cost,
        }
    }
}
