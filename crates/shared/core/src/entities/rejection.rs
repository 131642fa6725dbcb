use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::values::{Amount, Ticker, Timestamp};

/// Why a price could not be quoted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoPriceReason {
    /// Ticker not listed on the exchange
    UnknownStock,
    /// No valuation at or before the requested time
    NoValuation,
    /// Quoted price was zero or negative
    NonPositive,
}

/// Explicit "no price available" result for an instrument/time
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("no price for {stock} at {time}: {reason:?}")]
pub struct PriceUnavailable {
    pub stock: Ticker,
    pub time: Timestamp,
    pub reason: NoPriceReason,
}

impl PriceUnavailable {
    pub fn new(stock: impl Into<Ticker>, time: Timestamp, reason: NoPriceReason) -> Self {
        Self {
            stock: stock.into(),
            time,
            reason,
        }
    }
}

/// Normal (non-error) reason a requested trade did not execute
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rejection {
    /// Portfolio pre-check refused the request (e.g. nothing to sell)
    #[error("failed portfolio validation")]
    FailedValidation,

    /// Request reached the exchange without a positive share count
    #[error("no shares requested")]
    Unsized,

    /// No quote for the instrument at the trade time
    #[error("{0}")]
    NoPrice(PriceUnavailable),

    /// Buy cost exceeds available funds
    #[error("insufficient funds: required={required}, available={available}")]
    InsufficientFunds { required: Amount, available: Amount },

    /// Portfolio would not book an executed trade (e.g. it would overdraw cash)
    #[error("portfolio refused the executed trade")]
    PortfolioRefused,
}
