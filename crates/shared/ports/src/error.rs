use thiserror::Error;

/// Failures raised by decision providers during calibration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecisionError {
    #[error("Not enough history: {0}")]
    InsufficientHistory(String),

    #[error("Invalid decision settings: {0}")]
    InvalidSettings(String),
}

/// Failure to deliver an event to its subscribers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PublishError {
    #[error("Event channel closed")]
    ChannelClosed,
}

pub type DecisionResult<T> = std::result::Result<T, DecisionError>;
