use evolver_core::{Amount, Ledger, PortfolioStatus, SecurityTrade, Trade};
use evolver_order_manager::OutcomeCounts;
use serde::{Deserialize, Serialize};

/// Frozen outcome of one simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolverResult {
    /// Confirmed trades keyed by trade time
    pub trades: Ledger<SecurityTrade>,
    /// Requests behind each confirmed trade, keyed by trade time
    pub decisions: Ledger<Trade>,
    pub final_portfolio: PortfolioStatus,
    /// Every valuation taken during the run, oldest first
    pub valuations: Vec<PortfolioStatus>,
    pub annualized_return: Option<f64>,
    pub outcomes: OutcomeCounts,
    /// Decisions whose execution trigger never arrived
    pub pending_decisions: usize,
    /// The run ended on a stop request before the horizon
    pub stopped_early: bool,
}

impl EvolverResult {
    pub fn final_value(&self) -> Amount {
        self.final_portfolio.total_value()
    }
}
