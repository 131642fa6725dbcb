use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Price value - uses Decimal for precision
pub type Price = Decimal;

/// Cash amount (funds, costs, valuations)
pub type Amount = Decimal;

/// Whole number of shares in a trade or holding
pub type Shares = u64;

/// Timestamp in UTC
pub type Timestamp = DateTime<Utc>;

/// Ticker identifying a stock on the exchange
pub type Ticker = String;
