//! Configuration loading for the simulator
//!
//! A single JSON document describes a run:
//! - Run window, clock step and clock source
//! - Market fees and spread
//! - Starting portfolio and position sizing
//! - Decision provider and execution policy
//! - Exchange session times and calendar
//! - Synthetic price generation
//! - Reporting frequency

use chrono::{Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use evolver_core::{Amount, EvolverSettings, ExchangeSnapshot, SettingsError, Timestamp};
use evolver_exchange::{ExchangeError, HolidayCalendar, SessionConfig};
use evolver_order_manager::{CashPortfolio, PortfolioSettings, PortfolioSnapshot, PositionSizing};
use evolver_strategy::StrategySettings;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::reporting::ReportFrequency;

/// Root configuration for a simulation run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default)]
    pub evolver: EvolverConfig,

    #[serde(default)]
    pub market: MarketConfig,

    #[serde(default)]
    pub portfolio: PortfolioConfig,

    #[serde(default)]
    pub strategy: StrategySettings,

    #[serde(default)]
    pub exchange: ExchangeConfig,

    #[serde(default)]
    pub synthetic: SyntheticConfig,

    #[serde(default)]
    pub reporting: ReportingConfig,
}

impl SimulationConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;

        Self::from_json(&content)
    }

    /// Parse configuration from JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.market.fixed_trade_cost < Decimal::ZERO {
            return Err(ConfigError::Invalid(format!(
                "negative fixed trade cost {}",
                self.market.fixed_trade_cost
            )));
        }
        if self.market.half_spread < Decimal::ZERO || self.market.half_spread >= Decimal::ONE {
            return Err(ConfigError::Invalid(format!(
                "half spread {} outside [0, 1)",
                self.market.half_spread
            )));
        }
        if self.synthetic.initial_price <= Decimal::ZERO {
            return Err(ConfigError::Invalid(format!(
                "synthetic initial price {} must be positive",
                self.synthetic.initial_price
            )));
        }
        if !self.synthetic.daily_volatility.is_finite() || self.synthetic.daily_volatility < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "synthetic volatility {} must be a non-negative number",
                self.synthetic.daily_volatility
            )));
        }
        Ok(())
    }

    /// Run window and step
    pub fn settings(&self) -> Result<EvolverSettings, SettingsError> {
        EvolverSettings::new(
            self.evolver.start,
            self.evolver.end,
            Duration::seconds(self.evolver.increment_secs),
        )
    }

    /// Portfolio settings, with the market fee used for sizing
    pub fn portfolio_settings(&self) -> PortfolioSettings {
        PortfolioSettings {
            sizing: self.portfolio.sizing,
            fixed_trade_cost: self.market.fixed_trade_cost,
        }
    }

    /// Starting portfolio from the snapshot if given, else from starting cash
    pub fn build_portfolio(&self) -> evolver_order_manager::Result<CashPortfolio> {
        let snapshot = self
            .portfolio
            .starting_portfolio
            .clone()
            .unwrap_or_else(|| PortfolioSnapshot {
                cash: self.portfolio.starting_cash,
                holdings: Default::default(),
            });
        CashPortfolio::from_snapshot(snapshot, self.portfolio_settings())
    }

    /// Session configuration for a loaded exchange, plus configured closures
    pub fn session_config(&self, exchange: &ExchangeSnapshot) -> Result<SessionConfig, ExchangeError> {
        let calendar = HolidayCalendar::for_country(&exchange.country_code)
            .with_holidays(self.exchange.extra_holidays.iter().copied());
        SessionConfig::new(exchange.open_time, exchange.close_time, calendar)
    }
}

/// Where simulated time comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ClockKind {
    /// Jumps straight to each due time
    #[default]
    Simulated,
    /// Waits for the wall clock; due times already past fire at once
    System,
}

/// Run window; a zero increment means one day
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolverConfig {
    pub start: Timestamp,
    pub end: Timestamp,
    pub increment_secs: i64,
    pub clock: ClockKind,
}

impl Default for EvolverConfig {
    fn default() -> Self {
        Self {
            start: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap_or_default(),
            end: Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).single().unwrap_or_default(),
            increment_secs: 86_400,
            clock: ClockKind::Simulated,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// Flat fee per executed trade
    pub fixed_trade_cost: Amount,
    /// Fraction of the close added to the ask and taken off the bid
    pub half_spread: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PortfolioConfig {
    pub starting_cash: Amount,
    /// Overrides `starting_cash` when present
    pub starting_portfolio: Option<PortfolioSnapshot>,
    pub sizing: PositionSizing,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            starting_cash: Decimal::from(20_000),
            starting_portfolio: None,
            sizing: PositionSizing::default(),
        }
    }
}

/// Exchange identity and session hours (UTC)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    pub name: String,
    pub country_code: String,
    pub open_time: NaiveTime,
    pub close_time: NaiveTime,
    /// Closures on top of the country calendar
    pub extra_holidays: Vec<NaiveDate>,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            name: "Evolver Exchange".to_string(),
            country_code: "US".to_string(),
            open_time: NaiveTime::from_hms_opt(14, 30, 0).unwrap_or(NaiveTime::MIN),
            close_time: NaiveTime::from_hms_opt(21, 0, 0).unwrap_or(NaiveTime::MIN),
            extra_holidays: Vec::new(),
        }
    }
}

/// Seeded random-walk price data
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    pub stocks: usize,
    pub initial_price: Decimal,
    /// Standard deviation of daily log returns
    pub daily_volatility: f64,
    /// Mean daily log return
    pub daily_drift: f64,
    pub seed: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            stocks: 5,
            initial_price: Decimal::from(100),
            daily_volatility: 0.02,
            daily_drift: 0.0,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportingConfig {
    pub frequency: Option<ReportFrequency>,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            frequency: Some(ReportFrequency::Monthly),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {error}")]
    Io { path: String, error: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use evolver_strategy::{DecisionKind, ExecutionPolicy};
    use rust_decimal_macros::dec;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = SimulationConfig::from_json("{}").unwrap();
        assert_eq!(config.portfolio.starting_cash, dec!(20000));
        assert_eq!(config.exchange.country_code, "US");
        assert_eq!(config.reporting.frequency, Some(ReportFrequency::Monthly));
        assert_eq!(config.evolver.clock, ClockKind::Simulated);
        assert_eq!(config.settings().unwrap().evolution_increment(), Duration::days(1));
    }

    #[test]
    fn test_full_document() {
        let json = r#"{
            "evolver": {
                "start": "2024-01-02T00:00:00Z",
                "end": "2024-01-03T00:00:00Z",
                "increment_secs": 0,
                "clock": "System"
            },
            "market": { "fixed_trade_cost": "10", "half_spread": "0.001" },
            "portfolio": { "starting_cash": "20000", "sizing": { "FixedShares": 150 } },
            "strategy": { "decision": "Random", "policy": "ExchangeOpen", "seed": 7, "burn_in_days": 2 },
            "exchange": { "name": "LSE", "country_code": "GB", "open_time": "08:00:00", "close_time": "16:30:00",
                          "extra_holidays": ["2024-01-02"] },
            "synthetic": { "stocks": 1, "initial_price": "100", "daily_volatility": 0.0, "seed": 1 },
            "reporting": { "frequency": null }
        }"#;

        let config = SimulationConfig::from_json(json).unwrap();
        let settings = config.settings().unwrap();
        assert_eq!(settings.evolution_increment(), Duration::days(1));
        assert_eq!(config.evolver.clock, ClockKind::System);
        assert_eq!(config.strategy.decision, DecisionKind::Random);
        assert_eq!(config.strategy.policy, ExecutionPolicy::ExchangeOpen);
        assert_eq!(config.portfolio.sizing, PositionSizing::FixedShares(150));
        assert_eq!(config.portfolio_settings().fixed_trade_cost, dec!(10));
        assert_eq!(config.reporting.frequency, None);

        let portfolio = config.build_portfolio().unwrap();
        assert_eq!(portfolio.cash(), dec!(20000));
    }

    #[test]
    fn test_invalid_documents() {
        assert!(matches!(SimulationConfig::from_json("not json"), Err(ConfigError::Parse(_))));
        assert!(matches!(
            SimulationConfig::from_json(r#"{"market": {"half_spread": "1.5"}}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            SimulationConfig::from_file("/definitely/not/here.json"),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_negative_increment_rejected_by_settings() {
        let mut config = SimulationConfig::default();
        config.evolver.increment_secs = -60;
        assert_eq!(config.settings(), Err(SettingsError::NegativeIncrement));
    }
}
