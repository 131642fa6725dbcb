//! Evolver Runner - Event-Driven Market Simulation
//!
//! Wires the pieces of a run together:
//!
//! - **Scheduler**: time-ordered queue of everything that will happen
//! - **Clock**: simulated by default, advanced by the driver; the system
//!   clock paces a run against wall time
//! - **Exchange**: price updates and session transitions
//! - **Strategy**: decisions and execution policy
//! - **Order listener**: sizing, execution and portfolio bookkeeping
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────┐   fire_due    ┌───────────────────┐
//!   │  Scheduler   │──────────────▶│ scheduled actions │
//!   └──────▲───────┘               └─────────┬─────────┘
//!          │ next_due                        │ SimEvent
//!   ┌──────┴───────┐                         ▼
//!   │ EventEvolver │  flush   ┌──────────────────────────┐
//!   │  (driver)    │─────────▶│  StrategyOrchestrator    │
//!   └──────▲───────┘          └────────────┬─────────────┘
//!          │ valuations                    │ ListenerMessage
//!          │                               ▼
//!          │                  ┌──────────────────────────┐
//!          └──────────────────│     OrderListener        │
//!                             │  portfolio + exchange    │
//!                             └──────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! let config = SimulationConfig::from_file("run.json")?;
//! let result = evolver_runner::run_synthetic(&config).await?;
//! println!("final value {}", result.final_value());
//! ```

pub mod config;
pub mod error;
pub mod evolver;
pub mod metrics;
pub mod reporting;
pub mod result;
pub mod synthetic;

pub use config::{ClockKind, ConfigError, SimulationConfig};
pub use error::{ControlOperation, EvolverError, EvolverState, Result};
pub use evolver::{EventEvolver, StopHandle};
pub use metrics::annualized_return;
pub use reporting::{ReportFrequency, ReportHook};
pub use result::EvolverResult;
pub use synthetic::SyntheticExchange;

use evolver_clock::SystemClock;
use evolver_core::ExchangeSnapshot;
use evolver_exchange::MarketExchange;
use evolver_order_manager::share_portfolio;
use std::sync::Arc;

/// Run one simulation over a loaded exchange
pub async fn run(config: &SimulationConfig, exchange: Arc<ExchangeSnapshot>) -> Result<EvolverResult> {
    let settings = config.settings()?;
    let session = config.session_config(&exchange)?;
    let portfolio = share_portfolio(config.build_portfolio()?);

    let mut evolver = EventEvolver::new(settings, exchange, session, portfolio)
        .with_market(
            MarketExchange::new(config.market.fixed_trade_cost),
            config.market.half_spread,
        )
        .with_strategy(config.strategy)
        .with_report_frequency(config.reporting.frequency);
    if config.evolver.clock == ClockKind::System {
        evolver = evolver.with_clock(Arc::new(SystemClock::new()));
    }

    evolver.start().await?;
    evolver
        .into_result()
        .ok_or_else(|| EvolverError::TaskFailed("run finished without a result".to_string()))
}

/// Run one simulation over seeded synthetic prices
pub async fn run_synthetic(config: &SimulationConfig) -> Result<EvolverResult> {
    let settings = config.settings()?;
    let exchange = SyntheticExchange::new(config.synthetic.clone(), config.exchange.clone())
        .snapshot(&settings);
    run(config, Arc::new(exchange)).await
}
