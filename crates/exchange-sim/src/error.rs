use chrono::NaiveTime;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExchangeError {
    #[error("Session open {open} must precede close {close}")]
    InvalidSessionTimes { open: NaiveTime, close: NaiveTime },
}

pub type Result<T> = std::result::Result<T, ExchangeError>;
