//! Evolver Strategy
//!
//! Bridges simulation events into trade requests:
//! - Decision providers that say what to buy or sell on a given day
//! - Execution policies that say when a decision becomes a submitted trade
//! - The orchestrator task that ties both to the order listener
//!
//! ## Architecture
//!
//! ```text
//!  Scheduler actions ──► StrategyHandle (EventSink)
//!                              │ SimEvent (FIFO)
//!                              ▼
//!                     ┌─────────────────────┐
//!                     │     Orchestrator    │
//!                     │  TimeIncrement ──► DecisionProvider::decide
//!                     │  ExecutionPolicy    │
//!                     └─────────┬───────────┘
//!                               │ Submitted / PriceUpdate / Report / Flush
//!                               ▼
//!                         Order Listener
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use evolver_strategy::{build_decider, DecisionKind, ExecutionPolicy, StrategyOrchestrator};
//!
//! let decider = build_decider(DecisionKind::BuyAll, 0, 0);
//! let orchestrator = StrategyOrchestrator::new(decider, settings, ExecutionPolicy::LogExecution, listener_tx)?;
//! let (handle, task) = orchestrator.spawn();
//! ```

pub mod deciders;
pub mod orchestrator;
pub mod policy;

// Re-export main types
pub use deciders::{BuyAll, DecisionKind, RandomDecider, SellAll, build_decider};
pub use orchestrator::{OrchestratorSummary, StrategyHandle, StrategyMessage, StrategyOrchestrator};
pub use policy::{ExecutionPolicy, StrategySettings};
