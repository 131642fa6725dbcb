//! Evolver exchange
//!
//! Everything the simulator treats as "the exchange": trading calendars, the
//! session state machine that opens and closes the market, a snapshot-backed
//! price service and the market exchange that prices individual trades.

// Application layer
pub mod application;

// Infrastructure layer
pub mod infrastructure;

// Cross-cutting concerns
pub mod error;

// Re-export main types for convenience
pub use application::{ExchangeStateMachine, MarketExchange, SessionConfig, SessionTransition};
pub use error::{ExchangeError, Result};
pub use infrastructure::{ExchangePriceService, HolidayCalendar, HolidayRules};
