//! Synthetic exchange data
//!
//! Generates one daily candle per trading day for a set of made-up stocks,
//! following a seeded geometric random walk. Used when no market data is
//! supplied, and by the binary for quick runs.

use chrono::{Days, NaiveTime};
use evolver_core::{Candle, EvolverSettings, ExchangeSnapshot, Price, Stock};
use evolver_exchange::HolidayCalendar;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

use crate::config::{ExchangeConfig, SyntheticConfig};

pub struct SyntheticExchange {
    config: SyntheticConfig,
    exchange: ExchangeConfig,
}

impl SyntheticExchange {
    pub fn new(config: SyntheticConfig, exchange: ExchangeConfig) -> Self {
        Self { config, exchange }
    }

    fn calendar(&self) -> HolidayCalendar {
        HolidayCalendar::for_country(&self.exchange.country_code)
            .with_holidays(self.exchange.extra_holidays.iter().copied())
    }

    /// Build the snapshot covering every trading day of the run window
    ///
    /// Candles are stamped at 00:00 UTC. The same seed always yields the same
    /// prices.
    pub fn snapshot(&self, settings: &EvolverSettings) -> ExchangeSnapshot {
        let calendar = self.calendar();
        let first = settings.start_time().date_naive();
        let last = settings.end_time().date_naive();

        let days: Vec<_> = std::iter::successors(Some(first), |d| d.checked_add_days(Days::new(1)))
            .take_while(|d| *d <= last)
            .filter(|d| calendar.is_trading_day(*d))
            .map(|d| d.and_time(NaiveTime::MIN).and_utc())
            .filter(|t| settings.contains(*t))
            .collect();

        let stocks = (0..self.config.stocks)
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(self.config.seed.wrapping_add(i as u64));
                let mut close = self.config.initial_price.to_f64().unwrap_or(100.0);

                let candles = days
                    .iter()
                    .map(|time| {
                        let open = close;
                        close = self.step(&mut rng, close);
                        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.005));
                        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.005));
                        Candle {
                            time: *time,
                            open: to_price(open),
                            high: to_price(high),
                            low: to_price(low),
                            close: to_price(close),
                            volume: Decimal::from(rng.gen_range(10_000u32..1_000_000)),
                        }
                    })
                    .collect();

                let ticker = format!("SYN{:03}", i + 1);
                Stock::new(ticker.clone(), format!("Synthetic {}", ticker), candles)
            })
            .collect();

        log::info!(
            "[Synthetic] {} stocks over {} trading days (seed {})",
            self.config.stocks,
            days.len(),
            self.config.seed
        );

        ExchangeSnapshot {
            name: self.exchange.name.clone(),
            country_code: self.exchange.country_code.clone(),
            open_time: self.exchange.open_time,
            close_time: self.exchange.close_time,
            stocks,
        }
    }

    /// One day of geometric Brownian motion
    fn step(&self, rng: &mut StdRng, price: f64) -> f64 {
        let sigma = self.config.daily_volatility;
        let drift = self.config.daily_drift - 0.5 * sigma * sigma;
        let shock: f64 = StandardNormal.sample(rng);
        let next = price * (drift + sigma * shock).exp();
        // Keep a cent floor so ask/bid stay positive
        next.max(0.01)
    }
}

fn to_price(value: f64) -> Price {
    Decimal::from_f64(value)
        .map(|d| d.round_dp(2))
        .unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveDate, TimeZone, Utc, Weekday};
    use rust_decimal_macros::dec;

    fn january() -> EvolverSettings {
        EvolverSettings::daily(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap(),
        )
        .unwrap()
    }

    fn config(stocks: usize, volatility: f64) -> SyntheticConfig {
        SyntheticConfig {
            stocks,
            daily_volatility: volatility,
            ..SyntheticConfig::default()
        }
    }

    #[test]
    fn test_one_candle_per_trading_day() {
        let snapshot = SyntheticExchange::new(config(3, 0.02), ExchangeConfig::default()).snapshot(&january());

        assert_eq!(snapshot.stocks.len(), 3);
        assert_eq!(snapshot.stocks[0].ticker, "SYN001");
        for stock in &snapshot.stocks {
            // 23 weekdays minus New Year and MLK day
            assert_eq!(stock.valuations().len(), 21);
            assert!(stock.valuations().iter().all(|c| {
                c.time.weekday() != Weekday::Sat && c.time.weekday() != Weekday::Sun
            }));
            assert!(stock.valuations().iter().all(|c| c.close > Decimal::ZERO));
            assert!(stock.valuations().iter().all(|c| c.low <= c.close && c.close <= c.high));
        }
    }

    #[test]
    fn test_same_seed_same_prices() {
        let a = SyntheticExchange::new(config(2, 0.03), ExchangeConfig::default()).snapshot(&january());
        let b = SyntheticExchange::new(config(2, 0.03), ExchangeConfig::default()).snapshot(&january());
        assert_eq!(a, b);
        assert_ne!(a.stocks[0].valuations(), b.stocks[1].valuations());
    }

    #[test]
    fn test_zero_volatility_is_flat() {
        let snapshot = SyntheticExchange::new(config(1, 0.0), ExchangeConfig::default()).snapshot(&january());
        assert!(snapshot.stocks[0].valuations().iter().all(|c| c.close == dec!(100)));
    }

    #[test]
    fn test_extra_holidays_skipped() {
        let exchange = ExchangeConfig {
            extra_holidays: vec![NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()],
            ..ExchangeConfig::default()
        };
        let snapshot = SyntheticExchange::new(config(1, 0.02), exchange).snapshot(&january());
        let stock = &snapshot.stocks[0];
        assert!(!stock.valued_on(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()));
        assert!(stock.valued_on(NaiveDate::from_ymd_opt(2024, 1, 3).unwrap()));
    }
}
