//! Market exchange (trade mechanism)
//!
//! Prices and validates one requested trade against available funds. Holds no
//! portfolio state. Buys fill at the ask, sells at the bid, always in full.

use evolver_core::{Amount, Rejection, SecurityTrade, Side, Timestamp, Trade, TradeCompleted, TradeSubmitted};
use evolver_ports::PriceService;
use log::{debug, info};
use rust_decimal::Decimal;

/// Trade mechanism with a flat per-trade fee
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketExchange {
    fixed_trade_cost: Amount,
}

impl Default for MarketExchange {
    fn default() -> Self {
        Self::new(Decimal::ZERO)
    }
}

impl MarketExchange {
    pub fn new(fixed_trade_cost: Amount) -> Self {
        Self { fixed_trade_cost }
    }

    pub fn fixed_trade_cost(&self) -> Amount {
        self.fixed_trade_cost
    }

    /// Price and check a single request
    ///
    /// Buy cost is `ask * shares + fixed cost` and must not exceed
    /// `available_funds`. Sells are not funds-checked.
    pub fn trade(
        &self,
        time: Timestamp,
        trade: &Trade,
        prices: &dyn PriceService,
        available_funds: Amount,
    ) -> Result<SecurityTrade, Rejection> {
        let shares = match trade.shares {
            Some(shares) if shares > 0 => shares,
            _ => return Err(Rejection::Unsized),
        };

        let price = match trade.side {
            Side::Buy => prices.ask_price(time, &trade.stock),
            Side::Sell => prices.bid_price(time, &trade.stock),
        }
        .map_err(Rejection::NoPrice)?;

        let confirmed = SecurityTrade::execute(trade, shares, price, self.fixed_trade_cost);

        if trade.side == Side::Buy && confirmed.total_cost > available_funds {
            return Err(Rejection::InsufficientFunds {
                required: confirmed.total_cost,
                available: available_funds,
            });
        }

        Ok(confirmed)
    }

    /// Resolve a submission to its terminal outcome
    pub fn execute(&self, submitted: &TradeSubmitted, prices: &dyn PriceService) -> TradeCompleted {
        let requested = submitted.requested.clone();

        match self.trade(submitted.time, &requested, prices, submitted.available_funds) {
            Ok(confirmed) => {
                debug!(
                    "[Market] {} {} {} x{} @ {} (total {})",
                    confirmed.trade_id,
                    confirmed.side,
                    confirmed.stock,
                    confirmed.shares,
                    confirmed.price,
                    confirmed.total_cost
                );
                TradeCompleted::confirmed(requested, confirmed)
            }
            Err(rejection) => {
                info!(
                    "[Market] {} {} {} rejected: {}",
                    requested.id, requested.side, requested.stock, rejection
                );
                TradeCompleted::rejected(requested, rejection)
            }
        }
    }
}
