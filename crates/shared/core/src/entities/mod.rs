mod candle;
mod portfolio;
mod rejection;
mod session;
mod side;
mod stock;
mod trade;

pub use candle::Candle;
pub use portfolio::PortfolioStatus;
pub use rejection::{NoPriceReason, PriceUnavailable, Rejection};
pub use session::ExchangeSession;
pub use side::Side;
pub use stock::{ExchangeSnapshot, Stock};
pub use trade::{Decision, SecurityTrade, Trade, TradeId};
