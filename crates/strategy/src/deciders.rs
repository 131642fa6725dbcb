//! Built-in decision providers
//!
//! Trivial providers used to drive the simulator: they exercise the trade
//! pipeline, they are not trading strategies.

use chrono::Duration;
use evolver_core::{Decision, DecisionSystemSettings, ExchangeSnapshot, Timestamp};
use evolver_ports::{DecisionError, DecisionProvider, DecisionResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Stocks with a valuation on the calendar day of `day`, in snapshot order
fn valued_stocks<'a>(
    day: Timestamp,
    exchange: &'a ExchangeSnapshot,
) -> impl Iterator<Item = &'a str> + 'a {
    let date = day.date_naive();
    exchange
        .stocks
        .iter()
        .filter(move |s| s.valued_on(date))
        .map(|s| s.ticker.as_str())
}

/// Buys every stock valued on the decision day
#[derive(Debug, Clone, Default)]
pub struct BuyAll;

impl DecisionProvider for BuyAll {
    fn name(&self) -> &str {
        "BuyAll"
    }

    fn calibrate(&mut self, settings: &mut DecisionSystemSettings) -> DecisionResult<()> {
        settings.burn_in_end = settings.start_time;
        Ok(())
    }

    fn decide(&mut self, day: Timestamp, exchange: &ExchangeSnapshot) -> Vec<Decision> {
        valued_stocks(day, exchange).map(Decision::buy).collect()
    }
}

/// Sells every stock valued on the decision day
#[derive(Debug, Clone, Default)]
pub struct SellAll;

impl DecisionProvider for SellAll {
    fn name(&self) -> &str {
        "SellAll"
    }

    fn calibrate(&mut self, settings: &mut DecisionSystemSettings) -> DecisionResult<()> {
        settings.burn_in_end = settings.start_time;
        Ok(())
    }

    fn decide(&mut self, day: Timestamp, exchange: &ExchangeSnapshot) -> Vec<Decision> {
        valued_stocks(day, exchange).map(Decision::sell).collect()
    }
}

/// Seeded coin flips: each valued stock is bought, sold or left alone
#[derive(Debug, Clone)]
pub struct RandomDecider {
    seed: u64,
    rng: StdRng,
    burn_in: Duration,
}

impl RandomDecider {
    pub fn new(seed: u64, burn_in_days: u32) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
            burn_in: Duration::days(i64::from(burn_in_days)),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl DecisionProvider for RandomDecider {
    fn name(&self) -> &str {
        "Random"
    }

    fn calibrate(&mut self, settings: &mut DecisionSystemSettings) -> DecisionResult<()> {
        if settings.stock_count == 0 {
            return Err(DecisionError::InvalidSettings(
                "no stocks to decide on".to_string(),
            ));
        }
        // Calibration restarts the sequence so repeated runs match
        self.rng = StdRng::seed_from_u64(self.seed);
        settings.burn_in_end = settings.start_time + self.burn_in;
        Ok(())
    }

    fn decide(&mut self, day: Timestamp, exchange: &ExchangeSnapshot) -> Vec<Decision> {
        let mut decisions = Vec::new();
        for ticker in valued_stocks(day, exchange) {
            match self.rng.gen_range(0..3) {
                0 => decisions.push(Decision::buy(ticker)),
                1 => decisions.push(Decision::sell(ticker)),
                _ => {}
            }
        }
        decisions
    }
}

/// Which built-in provider to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DecisionKind {
    #[default]
    BuyAll,
    SellAll,
    Random,
}

/// Build a provider. `seed` and `burn_in_days` only affect `Random`.
pub fn build_decider(kind: DecisionKind, seed: u64, burn_in_days: u32) -> Box<dyn DecisionProvider> {
    match kind {
        DecisionKind::BuyAll => Box::new(BuyAll),
        DecisionKind::SellAll => Box::new(SellAll),
        DecisionKind::Random => Box::new(RandomDecider::new(seed, burn_in_days)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, TimeZone, Utc};
    use evolver_core::{Candle, Side, Stock};
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn day(d: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
    }

    fn exchange() -> Arc<ExchangeSnapshot> {
        let valued = |days: &[u32]| {
            days.iter()
                .map(|d| Candle::flat(day(*d), dec!(10)))
                .collect::<Vec<_>>()
        };
        Arc::new(ExchangeSnapshot {
            name: "TEST".to_string(),
            country_code: "US".to_string(),
            open_time: NaiveTime::from_hms_opt(14, 30, 0).unwrap(),
            close_time: NaiveTime::from_hms_opt(21, 0, 0).unwrap(),
            stocks: vec![
                Stock::new("AAA", "Alpha", valued(&[1, 2, 3])),
                Stock::new("BBB", "Beta", valued(&[2, 3])),
            ],
        })
    }

    #[test]
    fn test_buy_all_only_valued_stocks() {
        let exchange = exchange();
        let mut decider = BuyAll;

        let first = decider.decide(day(1), &exchange);
        assert_eq!(first, vec![Decision::buy("AAA")]);

        let second = decider.decide(day(2), &exchange);
        assert_eq!(second.len(), 2);
        assert!(second.iter().all(|d| d.side == Side::Buy));
        assert!(decider.decide(day(9), &exchange).is_empty());
    }

    #[test]
    fn test_sell_all() {
        let decisions = SellAll.decide(day(3), &exchange());
        assert_eq!(decisions, vec![Decision::sell("AAA"), Decision::sell("BBB")]);
    }

    #[test]
    fn test_trivial_providers_need_no_burn_in() {
        let mut settings = DecisionSystemSettings::new(day(1), exchange());
        settings.burn_in_end = day(5);
        BuyAll.calibrate(&mut settings).unwrap();
        assert_eq!(settings.burn_in_end, settings.start_time);
    }

    #[test]
    fn test_random_is_reproducible_after_calibration() {
        let exchange = exchange();
        let run = |decider: &mut Box<dyn DecisionProvider>| {
            let mut settings = DecisionSystemSettings::new(day(1), exchange.clone());
            decider.calibrate(&mut settings).unwrap();
            (1..=3)
                .flat_map(|d| decider.decide(day(d), &exchange))
                .collect::<Vec<_>>()
        };

        let mut decider = build_decider(DecisionKind::Random, 42, 0);
        let first = run(&mut decider);
        let again = run(&mut decider);
        let mut other = build_decider(DecisionKind::Random, 42, 0);

        assert_eq!(first, again);
        assert_eq!(first, run(&mut other));
    }

    #[test]
    fn test_random_burn_in_and_empty_exchange() {
        let mut decider = RandomDecider::new(7, 3);
        let mut settings = DecisionSystemSettings::new(day(1), exchange());
        decider.calibrate(&mut settings).unwrap();
        assert_eq!(settings.burn_in_end, day(4));

        let empty = Arc::new(ExchangeSnapshot {
            stocks: Vec::new(),
            ..(*exchange()).clone()
        });
        let mut settings = DecisionSystemSettings::new(day(1), empty);
        assert!(matches!(
            decider.calibrate(&mut settings),
            Err(DecisionError::InvalidSettings(_))
        ));
    }
}
