//! Order Manager errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid starting portfolio: {0}")]
    InvalidPortfolio(String),

    #[error("Invalid position sizing: {0}")]
    InvalidSizing(String),

    #[error("Portfolio parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
