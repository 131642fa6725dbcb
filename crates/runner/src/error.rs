//! Driver errors
//!
//! Only setup and infrastructure faults end up here. Trade rejections are
//! ordinary outcomes and never surface as an `EvolverError`.

use evolver_core::SettingsError;
use evolver_exchange::ExchangeError;
use evolver_ports::DecisionError;
use std::fmt;
use thiserror::Error;

use crate::config::ConfigError;

/// Lifecycle state of an [`crate::EventEvolver`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvolverState {
    Created,
    Initialized,
    Running,
    Stopped,
}

impl fmt::Display for EvolverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Control operations callers can ask the driver to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlOperation {
    Initialize,
    Start,
    Shutdown,
    Restart,
}

impl fmt::Display for ControlOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Error, Debug)]
pub enum EvolverError {
    #[error("Setup failed: {0}")]
    Setup(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid evolver settings: {0}")]
    Settings(#[from] SettingsError),

    #[error("Exchange error: {0}")]
    Exchange(#[from] ExchangeError),

    #[error("Decision provider error: {0}")]
    Decision(#[from] DecisionError),

    #[error("Portfolio error: {0}")]
    Portfolio(#[from] evolver_order_manager::Error),

    #[error("Unsupported operation: {0}")]
    Unsupported(ControlOperation),

    #[error("Cannot {operation} while {state}")]
    InvalidState {
        operation: ControlOperation,
        state: EvolverState,
    },

    #[error("Pipeline task failed: {0}")]
    TaskFailed(String),
}

pub type Result<T> = std::result::Result<T, EvolverError>;
