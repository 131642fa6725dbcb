pub mod market;
pub mod session;

pub use market::MarketExchange;
pub use session::{ExchangeStateMachine, SessionConfig, SessionTransition};
