use evolver_core::{Decision, DecisionSystemSettings, ExchangeSnapshot, Timestamp};

use crate::error::DecisionResult;

/// Port for decision providers
///
/// How decisions are computed is up to the implementation; the simulator only
/// relies on this contract.
pub trait DecisionProvider: Send {
    /// Provider name for logging
    fn name(&self) -> &str;

    /// Prepare for a run. May move `settings.burn_in_end` to claim (or give
    /// back) history.
    fn calibrate(&mut self, settings: &mut DecisionSystemSettings) -> DecisionResult<()>;

    /// Buy/sell decisions for `day` against the exchange snapshot
    fn decide(&mut self, day: Timestamp, exchange: &ExchangeSnapshot) -> Vec<Decision>;
}
