use evolver_core::{Amount, PortfolioStatus, PriceChanged, SecurityTrade, Timestamp, Trade};

use crate::prices::PriceService;

/// Port for the portfolio manager
///
/// The portfolio is the only mutable store of holdings and cash. The simulator
/// never looks at its internals beyond these calls.
pub trait PortfolioManager: Send + Sync {
    /// Cash available to fund buys at `time`
    fn available_funds(&self, time: Timestamp) -> Amount;

    /// Structural pre-check and sizing of a request
    ///
    /// Returns the request with its share count filled in, or `None` when it
    /// cannot be placed (e.g. nothing held to sell).
    fn validate_trade(
        &self,
        time: Timestamp,
        trade: &Trade,
        prices: &dyn PriceService,
    ) -> Option<Trade>;

    /// Apply a confirmed trade. Returns `false` if it could not be applied.
    fn add_trade(&mut self, time: Timestamp, trade: &Trade, confirmation: &SecurityTrade) -> bool;

    /// Value the portfolio at `time` and append it to the valuation history
    fn report_status(&mut self, time: Timestamp, prices: &dyn PriceService) -> PortfolioStatus;

    /// Mark holdings to a new quote
    fn on_price_update(&mut self, event: &PriceChanged);

    /// Valuations recorded so far, oldest first
    fn valuations(&self) -> &[PortfolioStatus];
}
