//! Scheduler errors

use evolver_ports::PublishError;
use thiserror::Error;

/// Failure raised by a scheduled action
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("Failed to publish event: {0}")]
    Publish(#[from] PublishError),

    #[error("Action failed: {0}")]
    Failed(String),
}
