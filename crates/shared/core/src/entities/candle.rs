use serde::{Deserialize, Serialize};

use crate::values::{Price, Timestamp};
use rust_decimal::Decimal;

/// Open/high/low/close/volume summary for one instrument over one period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candle {
    pub time: Timestamp,
    pub open: Price,
    pub high: Price,
    pub low: Price,
    pub close: Price,
    pub volume: Decimal,
}

impl Candle {
    /// Candle where every price equals `price`
    pub fn flat(time: Timestamp, price: Price) -> Self {
        Self {
            time,
            open: price,
            high: price,
            low: price,
            close: price,
            volume: Decimal::ZERO,
        }
    }
}
