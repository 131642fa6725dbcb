use evolver_core::{Candle, Price, PriceUnavailable, Timestamp};

/// Port for quote lookups
///
/// A missing quote is an explicit `PriceUnavailable`, never a magic value.
pub trait PriceService: Send + Sync {
    /// Price a buyer pays at `time`
    fn ask_price(&self, time: Timestamp, stock: &str) -> Result<Price, PriceUnavailable>;

    /// Price a seller receives at `time`
    fn bid_price(&self, time: Timestamp, stock: &str) -> Result<Price, PriceUnavailable>;

    /// Latest candle at or before `time`
    fn candle(&self, time: Timestamp, stock: &str) -> Result<Candle, PriceUnavailable>;
}
