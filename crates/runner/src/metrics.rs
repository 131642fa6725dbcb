use evolver_core::PortfolioStatus;
use rust_decimal::prelude::ToPrimitive;

const DAYS_PER_YEAR: f64 = 365.25;

/// Compound annualised return between two valuations
///
/// `(last / first) ^ (365.25 / days) - 1`. `None` when the valuations are not
/// at least a second apart or the first total value is not positive.
pub fn annualized_return(first: &PortfolioStatus, last: &PortfolioStatus) -> Option<f64> {
    let seconds = (last.time - first.time).num_seconds();
    if seconds <= 0 {
        return None;
    }

    let start = first.total_value().to_f64()?;
    let end = last.total_value().to_f64()?;
    if start <= 0.0 {
        return None;
    }

    let days = seconds as f64 / 86_400.0;
    let cagr = (end / start).powf(DAYS_PER_YEAR / days) - 1.0;
    cagr.is_finite().then_some(cagr)
}
