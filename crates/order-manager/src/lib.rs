//! Evolver Order Manager
//!
//! Sits between the strategy orchestrator and the market exchange:
//! - **Order Listener**: validates, prices and settles submitted trades
//! - **Ledgers**: time-keyed record of confirmed trades and their requests
//! - **Cash Portfolio**: holdings and cash, the only mutable trading state
//!
//! ## Architecture
//!
//! ```text
//! Orchestrator ──► TradeSubmitted ──► ┌──────────────────────────────┐
//!                                     │        Order Listener        │
//!                                     │  validate_trade (sizing)     │
//!                                     │  available_funds             │
//!                                     │            │                 │
//!                                     │            ▼                 │
//!                                     │  MarketExchange::execute     │
//!                                     │            │ TradeCompleted  │
//!                                     │            ▼                 │
//!                                     │  add_trade + ledgers         │
//!                                     └──────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use evolver_order_manager::{CashPortfolio, OrderListener, share_portfolio};
//!
//! let portfolio = share_portfolio(CashPortfolio::new(dec!(20000), settings)?);
//! let (tx, handle) = OrderListener::new(portfolio, prices, market).spawn();
//!
//! tx.send(ListenerMessage::Submitted(TradeSubmitted::new(trade)))?;
//! drop(tx);
//! let output = handle.await?;
//! ```

pub mod error;
pub mod ledger;
pub mod listener;
pub mod portfolio;

// Re-export main types
pub use error::{Error, Result};
pub use ledger::{LedgerBook, OutcomeCounts};
pub use listener::{ListenerMessage, ListenerOutput, OrderListener, SharedPortfolio, share_portfolio};
pub use portfolio::{CashPortfolio, PortfolioSettings, PortfolioSnapshot, PositionSizing};
