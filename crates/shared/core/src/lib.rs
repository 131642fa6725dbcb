//! Evolver Core Domain
//!
//! Pure domain types for the Evolver market simulator.
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod entities;
pub mod events;
pub mod ledger;
pub mod settings;
pub mod values;

// Re-export commonly used types at crate root
pub use entities::{
    Candle, Decision, ExchangeSession, ExchangeSnapshot, NoPriceReason, PortfolioStatus,
    PriceUnavailable, Rejection, SecurityTrade, Side, Stock, Trade, TradeId,
};
pub use events::{ExchangeStatusChanged, PriceChanged, SimEvent, TradeCompleted, TradeSubmitted};
pub use ledger::Ledger;
pub use settings::{DecisionSystemSettings, EvolverSettings, SettingsError};
pub use values::{Amount, Price, Shares, Ticker, Timestamp};
