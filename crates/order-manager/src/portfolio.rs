//! Cash portfolio manager
//!
//! Long-only portfolio of whole shares funded from a single cash balance.
//! Holdings and cash change only through [`PortfolioManager::add_trade`].

use evolver_core::{
    Amount, PortfolioStatus, Price, PriceChanged, SecurityTrade, Shares, Side, Ticker, Timestamp,
    Trade,
};
use evolver_ports::{PortfolioManager, PriceService};
use log::{debug, warn};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::error::{Error, Result};

/// How many shares a buy decision turns into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionSizing {
    /// Risk this fraction of available cash per decision, net of the trade fee
    CashFraction(Decimal),
    /// Always request this many shares
    FixedShares(Shares),
}

impl Default for PositionSizing {
    fn default() -> Self {
        PositionSizing::CashFraction(Decimal::new(1, 1))
    }
}

/// Construction settings for a [`CashPortfolio`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PortfolioSettings {
    pub sizing: PositionSizing,
    /// Fee the market charges per trade, used when sizing buys
    pub fixed_trade_cost: Amount,
}

impl PortfolioSettings {
    pub fn validate(&self) -> Result<()> {
        match self.sizing {
            PositionSizing::CashFraction(f) if f <= Decimal::ZERO || f > Decimal::ONE => Err(
                Error::InvalidSizing(format!("cash fraction {} outside (0, 1]", f)),
            ),
            PositionSizing::FixedShares(0) => {
                Err(Error::InvalidSizing("fixed share count is zero".to_string()))
            }
            _ if self.fixed_trade_cost < Decimal::ZERO => Err(Error::InvalidSizing(format!(
                "negative trade cost {}",
                self.fixed_trade_cost
            ))),
            _ => Ok(()),
        }
    }
}

/// Serialised starting portfolio
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub cash: Amount,
    #[serde(default)]
    pub holdings: BTreeMap<Ticker, Shares>,
}

impl PortfolioSnapshot {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Portfolio manager holding cash and whole-share long positions
#[derive(Debug, Clone)]
pub struct CashPortfolio {
    cash: Amount,
    holdings: BTreeMap<Ticker, Shares>,
    last_prices: HashMap<Ticker, Price>,
    valuations: Vec<PortfolioStatus>,
    settings: PortfolioSettings,
}

impl CashPortfolio {
    /// Portfolio holding only `cash`
    pub fn new(cash: Amount, settings: PortfolioSettings) -> Result<Self> {
        Self::from_snapshot(
            PortfolioSnapshot {
                cash,
                holdings: BTreeMap::new(),
            },
            settings,
        )
    }

    pub fn from_snapshot(snapshot: PortfolioSnapshot, settings: PortfolioSettings) -> Result<Self> {
        if snapshot.cash < Decimal::ZERO {
            return Err(Error::InvalidPortfolio(format!(
                "negative starting cash {}",
                snapshot.cash
            )));
        }
        settings.validate()?;

        let mut holdings = snapshot.holdings;
        holdings.retain(|_, shares| *shares > 0);

        Ok(Self {
            cash: snapshot.cash,
            holdings,
            last_prices: HashMap::new(),
            valuations: Vec::new(),
            settings,
        })
    }

    pub fn cash(&self) -> Amount {
        self.cash
    }

    pub fn holding(&self, stock: &str) -> Shares {
        self.holdings.get(stock).copied().unwrap_or(0)
    }

    pub fn snapshot(&self) -> PortfolioSnapshot {
        PortfolioSnapshot {
            cash: self.cash,
            holdings: self.holdings.clone(),
        }
    }

    fn size_buy(&self, time: Timestamp, trade: &Trade, prices: &dyn PriceService) -> Option<Shares> {
        match self.settings.sizing {
            PositionSizing::FixedShares(n) => Some(n),
            PositionSizing::CashFraction(fraction) => {
                let ask = prices.ask_price(time, &trade.stock).ok()?;
                let budget = self.available_funds(time) * fraction - self.settings.fixed_trade_cost;
                if budget <= Decimal::ZERO || ask <= Decimal::ZERO {
                    return None;
                }
                (budget / ask).floor().to_u64()
            }
        }
    }

    /// Mark price for a holding: bid at `time`, else the last quote seen
    fn mark(&self, time: Timestamp, stock: &str, prices: &dyn PriceService) -> Price {
        prices
            .bid_price(time, stock)
            .ok()
            .or_else(|| self.last_prices.get(stock).copied())
            .unwrap_or(Decimal::ZERO)
    }
}

impl PortfolioManager for CashPortfolio {
    fn available_funds(&self, _time: Timestamp) -> Amount {
        self.cash.max(Decimal::ZERO)
    }

    fn validate_trade(
        &self,
        time: Timestamp,
        trade: &Trade,
        prices: &dyn PriceService,
    ) -> Option<Trade> {
        let shares = match (trade.side, trade.shares) {
            (Side::Buy, Some(requested)) => requested,
            (Side::Buy, None) => self.size_buy(time, trade, prices)?,
            (Side::Sell, requested) => {
                let held = self.holding(&trade.stock);
                match requested {
                    Some(n) if n > held => return None,
                    Some(n) => n,
                    None => held,
                }
            }
        };

        if shares == 0 {
            return None;
        }
        if trade.side == Side::Sell {
            // Proceeds must cover the fee
            if let Ok(bid) = prices.bid_price(time, &trade.stock) {
                let proceeds = bid * Decimal::from(shares) - self.settings.fixed_trade_cost;
                if self.cash + proceeds < Decimal::ZERO {
                    return None;
                }
            }
        }
        Some(trade.clone().with_shares(shares))
    }

    fn add_trade(&mut self, time: Timestamp, trade: &Trade, confirmation: &SecurityTrade) -> bool {
        if confirmation.trade_id != trade.id || confirmation.stock != trade.stock {
            warn!(
                "[Portfolio] confirmation {} does not match request {}",
                confirmation.trade_id, trade.id
            );
            return false;
        }

        let cash_after = self.cash + confirmation.cash_delta();
        if cash_after < Decimal::ZERO {
            warn!(
                "[Portfolio] {} would overdraw cash ({} -> {})",
                confirmation.trade_id, self.cash, cash_after
            );
            return false;
        }

        match confirmation.side {
            Side::Buy => {
                *self.holdings.entry(confirmation.stock.clone()).or_default() += confirmation.shares;
            }
            Side::Sell => {
                let held = self.holding(&confirmation.stock);
                if confirmation.shares > held {
                    warn!(
                        "[Portfolio] {} sells {} of {} but only {} held",
                        confirmation.trade_id, confirmation.shares, confirmation.stock, held
                    );
                    return false;
                }
                if held == confirmation.shares {
                    self.holdings.remove(&confirmation.stock);
                } else {
                    self.holdings
                        .insert(confirmation.stock.clone(), held - confirmation.shares);
                }
            }
        }

        self.cash = cash_after;
        self.last_prices
            .insert(confirmation.stock.clone(), confirmation.price);
        debug!(
            "[Portfolio] applied {} at {}: cash now {}",
            confirmation.trade_id, time, self.cash
        );
        true
    }

    fn report_status(&mut self, time: Timestamp, prices: &dyn PriceService) -> PortfolioStatus {
        let market_value = self
            .holdings
            .iter()
            .map(|(stock, shares)| self.mark(time, stock, prices) * Decimal::from(*shares))
            .sum();

        let status = PortfolioStatus {
            time,
            cash: self.cash,
            holdings: self.holdings.clone(),
            market_value,
        };
        self.valuations.push(status.clone());
        status
    }

    fn on_price_update(&mut self, event: &PriceChanged) {
        self.last_prices.insert(event.stock.clone(), event.price);
    }

    fn valuations(&self) -> &[PortfolioStatus] {
        &self.valuations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use evolver_core::{Candle, NoPriceReason, PriceUnavailable, TradeId};
    use rust_decimal_macros::dec;

    struct Flat(Price);

    impl PriceService for Flat {
        fn ask_price(&self, _: Timestamp, _: &str) -> std::result::Result<Price, PriceUnavailable> {
            Ok(self.0)
        }
        fn bid_price(&self, _: Timestamp, _: &str) -> std::result::Result<Price, PriceUnavailable> {
            Ok(self.0)
        }
        fn candle(&self, time: Timestamp, _: &str) -> std::result::Result<Candle, PriceUnavailable> {
            Ok(Candle::flat(time, self.0))
        }
    }

    struct NoQuotes;

    impl PriceService for NoQuotes {
        fn ask_price(&self, t: Timestamp, s: &str) -> std::result::Result<Price, PriceUnavailable> {
            Err(PriceUnavailable::new(s, t, NoPriceReason::NoValuation))
        }
        fn bid_price(&self, t: Timestamp, s: &str) -> std::result::Result<Price, PriceUnavailable> {
            Err(PriceUnavailable::new(s, t, NoPriceReason::NoValuation))
        }
        fn candle(&self, t: Timestamp, s: &str) -> std::result::Result<Candle, PriceUnavailable> {
            Err(PriceUnavailable::new(s, t, NoPriceReason::NoValuation))
        }
    }

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap()
    }

    fn settings(sizing: PositionSizing, fee: Amount) -> PortfolioSettings {
        PortfolioSettings {
            sizing,
            fixed_trade_cost: fee,
        }
    }

    #[test]
    fn test_cash_fraction_sizing_is_fee_aware() {
        let portfolio =
            CashPortfolio::new(dec!(10000), settings(PositionSizing::CashFraction(dec!(0.5)), dec!(10)))
                .unwrap();
        let request = Trade::new(TradeId(1), "ACME", Side::Buy, now());

        // (5000 - 10) / 100 = 49.9
        let sized = portfolio.validate_trade(now(), &request, &Flat(dec!(100))).unwrap();
        assert_eq!(sized.shares, Some(49));
        assert_eq!(request.shares, None);
    }

    #[test]
    fn test_buy_without_quote_or_budget_fails_validation() {
        let portfolio =
            CashPortfolio::new(dec!(5), settings(PositionSizing::CashFraction(dec!(1)), dec!(10)))
                .unwrap();
        let request = Trade::new(TradeId(1), "ACME", Side::Buy, now());

        assert!(portfolio.validate_trade(now(), &request, &Flat(dec!(1))).is_none());
        assert!(portfolio.validate_trade(now(), &request, &NoQuotes).is_none());
    }

    #[test]
    fn test_sell_sized_to_full_holding() {
        let snapshot = PortfolioSnapshot {
            cash: dec!(0),
            holdings: [("ACME".to_string(), 12)].into_iter().collect(),
        };
        let portfolio = CashPortfolio::from_snapshot(snapshot, PortfolioSettings::default()).unwrap();

        let sell = Trade::new(TradeId(1), "ACME", Side::Sell, now());
        assert_eq!(
            portfolio.validate_trade(now(), &sell, &Flat(dec!(1))).unwrap().shares,
            Some(12)
        );

        let nothing_held = Trade::new(TradeId(2), "OTHER", Side::Sell, now());
        assert!(portfolio.validate_trade(now(), &nothing_held, &Flat(dec!(1))).is_none());

        let oversized = sell.clone().with_shares(13);
        assert!(portfolio.validate_trade(now(), &oversized, &Flat(dec!(1))).is_none());
    }

    #[test]
    fn test_add_trade_moves_cash_and_holdings() {
        let mut portfolio =
            CashPortfolio::new(dec!(1000), settings(PositionSizing::FixedShares(5), dec!(1))).unwrap();
        let buy = Trade::new(TradeId(1), "ACME", Side::Buy, now()).with_shares(5);
        let bought = SecurityTrade::execute(&buy, 5, dec!(100), dec!(1));

        assert!(portfolio.add_trade(now(), &buy, &bought));
        assert_eq!(portfolio.cash(), dec!(499));
        assert_eq!(portfolio.holding("ACME"), 5);

        let sell = Trade::new(TradeId(2), "ACME", Side::Sell, now()).with_shares(5);
        let sold = SecurityTrade::execute(&sell, 5, dec!(110), dec!(1));
        assert!(portfolio.add_trade(now(), &sell, &sold));
        assert_eq!(portfolio.cash(), dec!(1048));
        assert_eq!(portfolio.holding("ACME"), 0);
        assert!(portfolio.snapshot().holdings.is_empty());
    }

    #[test]
    fn test_add_trade_refuses_overdraft_and_mismatch() {
        let mut portfolio =
            CashPortfolio::new(dec!(100), settings(PositionSizing::FixedShares(5), dec!(0))).unwrap();
        let buy = Trade::new(TradeId(1), "ACME", Side::Buy, now()).with_shares(5);
        let too_big = SecurityTrade::execute(&buy, 5, dec!(100), dec!(0));
        assert!(!portfolio.add_trade(now(), &buy, &too_big));

        let other = Trade::new(TradeId(9), "ACME", Side::Buy, now()).with_shares(1);
        let small = SecurityTrade::execute(&other, 1, dec!(1), dec!(0));
        assert!(!portfolio.add_trade(now(), &buy, &small));
        assert_eq!(portfolio.cash(), dec!(100));
    }

    #[test]
    fn test_sell_cannot_overdraw_through_fee() {
        let snapshot = PortfolioSnapshot {
            cash: dec!(0),
            holdings: [("ACME".to_string(), 1)].into_iter().collect(),
        };
        let mut portfolio = CashPortfolio::from_snapshot(
            snapshot,
            settings(PositionSizing::FixedShares(1), dec!(10)),
        )
        .unwrap();

        let sell = Trade::new(TradeId(1), "ACME", Side::Sell, now());
        assert!(portfolio.validate_trade(now(), &sell, &Flat(dec!(5))).is_none());
        assert!(portfolio.validate_trade(now(), &sell, &Flat(dec!(10))).is_some());

        // Confirmed elsewhere at a price the fee swamps
        let sell = sell.with_shares(1);
        let sold = SecurityTrade::execute(&sell, 1, dec!(5), dec!(10));
        assert!(!portfolio.add_trade(now(), &sell, &sold));
        assert_eq!(portfolio.cash(), dec!(0));
        assert_eq!(portfolio.holding("ACME"), 1);
    }

    #[test]
    fn test_report_marks_to_bid_then_last_quote() {
        let snapshot = PortfolioSnapshot {
            cash: dec!(50),
            holdings: [("ACME".to_string(), 2)].into_iter().collect(),
        };
        let mut portfolio = CashPortfolio::from_snapshot(snapshot, PortfolioSettings::default()).unwrap();

        let status = portfolio.report_status(now(), &Flat(dec!(10)));
        assert_eq!(status.market_value, dec!(20));
        assert_eq!(status.total_value(), dec!(70));

        portfolio.on_price_update(&PriceChanged {
            time: now(),
            stock: "ACME".to_string(),
            price: dec!(30),
            candle: Candle::flat(now(), dec!(30)),
        });
        let status = portfolio.report_status(now(), &NoQuotes);
        assert_eq!(status.market_value, dec!(60));
        assert_eq!(portfolio.valuations().len(), 2);
    }

    #[test]
    fn test_invalid_construction() {
        assert!(matches!(
            CashPortfolio::new(dec!(-1), PortfolioSettings::default()),
            Err(Error::InvalidPortfolio(_))
        ));
        assert!(matches!(
            CashPortfolio::new(dec!(1), settings(PositionSizing::CashFraction(dec!(1.5)), dec!(0))),
            Err(Error::InvalidSizing(_))
        ));
        assert!(matches!(PortfolioSnapshot::from_json("{"), Err(Error::Parse(_))));

        let parsed = PortfolioSnapshot::from_json(r#"{"cash": "250.5", "holdings": {"ACME": 3}}"#).unwrap();
        assert_eq!(parsed.cash, dec!(250.5));
        assert_eq!(parsed.holdings.get("ACME"), Some(&3));
    }
}
