//! Typed messages exchanged between simulation components
//!
//! Every event a service raises is one of these values, delivered over
//! channels in the order it was fired.

use serde::{Deserialize, Serialize};

use crate::entities::{Candle, ExchangeSession, Rejection, SecurityTrade, Trade};
use crate::values::{Amount, Price, Ticker, Timestamp};

/// Session boundary crossed at `time`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeStatusChanged {
    pub time: Timestamp,
    pub previous: ExchangeSession,
    pub new: ExchangeSession,
}

/// New quote published by the price service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceChanged {
    pub time: Timestamp,
    pub stock: Ticker,
    pub price: Price,
    pub candle: Candle,
}

/// Events fired by scheduled actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimEvent {
    /// Clock advanced by one evolution increment
    TimeIncrement(Timestamp),
    ExchangeStatus(ExchangeStatusChanged),
    Price(PriceChanged),
    /// Periodic reporting point
    Report(Timestamp),
}

impl SimEvent {
    pub fn time(&self) -> Timestamp {
        match self {
            SimEvent::TimeIncrement(t) | SimEvent::Report(t) => *t,
            SimEvent::ExchangeStatus(e) => e.time,
            SimEvent::Price(e) => e.time,
        }
    }
}

/// Envelope for a submitted trade, threaded through validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeSubmitted {
    pub time: Timestamp,
    pub available_funds: Amount,
    pub requested: Trade,
}

impl TradeSubmitted {
    pub fn new(requested: Trade) -> Self {
        Self {
            time: requested.time,
            available_funds: Amount::ZERO,
            requested,
        }
    }
}

/// Terminal outcome of a submitted trade
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeCompleted {
    pub requested: Trade,
    pub confirmed: Option<SecurityTrade>,
    pub rejection: Option<Rejection>,
    pub success: bool,
}

impl TradeCompleted {
    pub fn confirmed(requested: Trade, confirmed: SecurityTrade) -> Self {
        Self {
            requested,
            confirmed: Some(confirmed),
            rejection: None,
            success: true,
        }
    }

    pub fn rejected(requested: Trade, rejection: Rejection) -> Self {
        Self {
            requested,
            confirmed: None,
            rejection: Some(rejection),
            success: false,
        }
    }
}
