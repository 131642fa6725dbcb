use serde::{Deserialize, Serialize};

/// When a decision turns into a submitted trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExecutionPolicy {
    /// Submit at the time increment that produced the decision
    #[default]
    LogExecution,
    /// Hold until the next Closed -> Continuous session change
    ExchangeOpen,
    /// Hold until the next price update for the decision's stock
    ExchangeEvent,
}

/// Settings for the strategy side of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategySettings {
    pub decision: crate::deciders::DecisionKind,
    pub policy: ExecutionPolicy,
    pub seed: u64,
    /// Extra history the random provider waits for before deciding
    pub burn_in_days: u32,
}
