//! Snapshot-backed price service
//!
//! Quotes come from the latest valuation at or before the requested time. A
//! symmetric half spread around the close gives the ask and bid.

use evolver_core::{
    Candle, EvolverSettings, ExchangeSnapshot, NoPriceReason, Price, PriceChanged,
    PriceUnavailable, SimEvent, Timestamp,
};
use evolver_ports::{EventSink, PriceService};
use evolver_scheduler::Scheduler;
use log::{debug, info};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Price service over a read-only exchange snapshot
#[derive(Debug, Clone)]
pub struct ExchangePriceService {
    exchange: Arc<ExchangeSnapshot>,
    half_spread: Decimal,
}

impl ExchangePriceService {
    /// `half_spread` is a fraction of the close (0.001 = 10 bps each side)
    pub fn new(exchange: Arc<ExchangeSnapshot>, half_spread: Decimal) -> Self {
        Self {
            exchange,
            half_spread: half_spread.max(Decimal::ZERO),
        }
    }

    pub fn exchange(&self) -> &Arc<ExchangeSnapshot> {
        &self.exchange
    }

    fn quote(&self, time: Timestamp, stock: &str, factor: Decimal) -> Result<Price, PriceUnavailable> {
        let candle = self.candle(time, stock)?;
        let price = candle.close * factor;
        if price <= Decimal::ZERO {
            return Err(PriceUnavailable::new(stock, time, NoPriceReason::NonPositive));
        }
        Ok(price)
    }

    /// Schedule a `PriceChanged` for every valuation inside the run window
    ///
    /// Stocks are visited in snapshot order, so updates sharing a timestamp
    /// fire in that order. Returns the number of events scheduled.
    pub fn initialize(
        &self,
        settings: &EvolverSettings,
        scheduler: &Scheduler,
        sink: Arc<dyn EventSink>,
    ) -> usize {
        let mut scheduled = 0;

        for stock in &self.exchange.stocks {
            for candle in stock.valuations_between(settings.start_time(), settings.end_time()) {
                let event = PriceChanged {
                    time: candle.time,
                    stock: stock.ticker.clone(),
                    price: candle.close,
                    candle: candle.clone(),
                };
                let sink = sink.clone();

                scheduler.schedule(candle.time, move |_| {
                    debug!("[Prices] {} -> {} at {}", event.stock, event.price, event.time);
                    sink.publish(SimEvent::Price(event))?;
                    Ok(())
                });
                scheduled += 1;
            }
        }

        info!(
            "[Prices] scheduled {} price updates for {} stocks",
            scheduled,
            self.exchange.stocks.len()
        );
        scheduled
    }
}

impl PriceService for ExchangePriceService {
    fn ask_price(&self, time: Timestamp, stock: &str) -> Result<Price, PriceUnavailable> {
        self.quote(time, stock, Decimal::ONE + self.half_spread)
    }

    fn bid_price(&self, time: Timestamp, stock: &str) -> Result<Price, PriceUnavailable> {
        self.quote(time, stock, Decimal::ONE - self.half_spread)
    }

    fn candle(&self, time: Timestamp, stock: &str) -> Result<Candle, PriceUnavailable> {
        let listed = self
            .exchange
            .stock(stock)
            .ok_or_else(|| PriceUnavailable::new(stock, time, NoPriceReason::UnknownStock))?;

        listed
            .candle_at(time)
            .cloned()
            .ok_or_else(|| PriceUnavailable::new(stock, time, NoPriceReason::NoValuation))
    }
}
