use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::Candle;
use crate::values::{Ticker, Timestamp};

/// A listed stock with its time-ordered valuation sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StockData")]
pub struct Stock {
    pub ticker: Ticker,
    pub name: String,
    valuations: Vec<Candle>,
}

/// Wire form of [`Stock`]; loaded valuations may come in any order
#[derive(Deserialize)]
struct StockData {
    ticker: Ticker,
    name: String,
    #[serde(default)]
    valuations: Vec<Candle>,
}

impl From<StockData> for Stock {
    fn from(data: StockData) -> Self {
        Stock::new(data.ticker, data.name, data.valuations)
    }
}

impl Stock {
    /// Create a stock; valuations are sorted by time
    pub fn new(ticker: impl Into<Ticker>, name: impl Into<String>, mut valuations: Vec<Candle>) -> Self {
        valuations.sort_by_key(|c| c.time);
        Self {
            ticker: ticker.into(),
            name: name.into(),
            valuations,
        }
    }

    pub fn valuations(&self) -> &[Candle] {
        &self.valuations
    }

    /// Latest valuation at or before `time`
    pub fn candle_at(&self, time: Timestamp) -> Option<&Candle> {
        let idx = self.valuations.partition_point(|c| c.time <= time);
        idx.checked_sub(1).map(|i| &self.valuations[i])
    }

    /// Whether a valuation exists on the given calendar day
    pub fn valued_on(&self, day: NaiveDate) -> bool {
        let start = day.and_time(NaiveTime::MIN).and_utc();
        let idx = self.valuations.partition_point(|c| c.time < start);
        self.valuations
            .get(idx)
            .is_some_and(|c| c.time.date_naive() == day)
    }

    /// Valuations with `start <= time <= end`
    pub fn valuations_between(&self, start: Timestamp, end: Timestamp) -> &[Candle] {
        let lo = self.valuations.partition_point(|c| c.time < start);
        let hi = self.valuations.partition_point(|c| c.time <= end);
        &self.valuations[lo..hi.max(lo)]
    }
}

/// Read-only exchange snapshot handed to decision providers and price services
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeSnapshot {
    pub name: String,
    /// Country code for the public holiday calendar (e.g. "US")
    pub country_code: String,
    /// Session open, UTC
    pub open_time: NaiveTime,
    /// Session close, UTC
    pub close_time: NaiveTime,
    pub stocks: Vec<Stock>,
}

impl ExchangeSnapshot {
    pub fn stock(&self, ticker: &str) -> Option<&Stock> {
        self.stocks.iter().find(|s| s.ticker == ticker)
    }

    pub fn is_empty(&self) -> bool {
        self.stocks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn day(d: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
    }

    fn stock() -> Stock {
        Stock::new(
            "ACME",
            "Acme Corp",
            vec![
                Candle::flat(day(3), dec!(12)),
                Candle::flat(day(1), dec!(10)),
                Candle::flat(day(2), dec!(11)),
            ],
        )
    }

    #[test]
    fn test_valuations_sorted() {
        let s = stock();
        let times: Vec<_> = s.valuations().iter().map(|c| c.time).collect();
        assert_eq!(times, vec![day(1), day(2), day(3)]);
    }

    #[test]
    fn test_candle_at_uses_latest_prior() {
        let s = stock();
        assert!(s.candle_at(day(1) - chrono::Duration::seconds(1)).is_none());
        assert_eq!(s.candle_at(day(1)).unwrap().close, dec!(10));
        let midday = day(2) + chrono::Duration::hours(12);
        assert_eq!(s.candle_at(midday).unwrap().close, dec!(11));
        assert_eq!(s.candle_at(day(9)).unwrap().close, dec!(12));
    }

    #[test]
    fn test_valued_on() {
        let s = stock();
        assert!(s.valued_on(day(2).date_naive()));
        assert!(!s.valued_on(day(4).date_naive()));
    }

    #[test]
    fn test_deserialized_valuations_sorted() {
        let mut json = serde_json::to_value(stock()).unwrap();
        json["valuations"].as_array_mut().unwrap().reverse();
        assert_eq!(json["valuations"][0], serde_json::to_value(Candle::flat(day(3), dec!(12))).unwrap());

        let loaded: Stock = serde_json::from_value(json).unwrap();
        assert_eq!(loaded, stock());
        assert_eq!(loaded.candle_at(day(2)).unwrap().close, dec!(11));
    }

    #[test]
    fn test_valuations_between() {
        let s = stock();
        assert_eq!(s.valuations_between(day(2), day(3)).len(), 2);
        assert!(s.valuations_between(day(5), day(6)).is_empty());
    }
}
