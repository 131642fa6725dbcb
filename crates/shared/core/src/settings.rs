use chrono::Duration;
use std::sync::Arc;
use thiserror::Error;

use crate::entities::ExchangeSnapshot;
use crate::values::Timestamp;

/// Run window and clock step shared by every service
///
/// Immutable after construction. A zero increment defaults to one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvolverSettings {
    start_time: Timestamp,
    end_time: Timestamp,
    evolution_increment: Duration,
}

/// Reasons settings cannot be built
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("evolution increment must be positive")]
    NegativeIncrement,

    #[error("end time precedes start time")]
    EndBeforeStart,
}

impl EvolverSettings {
    pub fn new(
        start_time: Timestamp,
        end_time: Timestamp,
        evolution_increment: Duration,
    ) -> Result<Self, SettingsError> {
        if evolution_increment < Duration::zero() {
            return Err(SettingsError::NegativeIncrement);
        }
        if end_time < start_time {
            return Err(SettingsError::EndBeforeStart);
        }

        let evolution_increment = if evolution_increment.is_zero() {
            Duration::days(1)
        } else {
            evolution_increment
        };

        Ok(Self {
            start_time,
            end_time,
            evolution_increment,
        })
    }

    /// Daily evolution between two times
    pub fn daily(start_time: Timestamp, end_time: Timestamp) -> Result<Self, SettingsError> {
        Self::new(start_time, end_time, Duration::days(1))
    }

    pub fn start_time(&self) -> Timestamp {
        self.start_time
    }

    pub fn end_time(&self) -> Timestamp {
        self.end_time
    }

    pub fn evolution_increment(&self) -> Duration {
        self.evolution_increment
    }

    pub fn contains(&self, time: Timestamp) -> bool {
        time >= self.start_time && time <= self.end_time
    }

    /// Clock tick times: `start + k * increment` up to and including `end`
    pub fn ticks(&self) -> impl Iterator<Item = Timestamp> + '_ {
        std::iter::successors(Some(self.start_time), move |t| {
            Some(*t + self.evolution_increment)
        })
        .take_while(move |t| *t <= self.end_time)
    }
}

/// Settings handed to a decision provider for calibration
#[derive(Debug, Clone)]
pub struct DecisionSystemSettings {
    pub start_time: Timestamp,
    /// No decisions are acted on before this time
    pub burn_in_end: Timestamp,
    pub stock_count: usize,
    pub exchange: Arc<ExchangeSnapshot>,
}

impl DecisionSystemSettings {
    /// Settings for a provider that needs no history
    pub fn new(start_time: Timestamp, exchange: Arc<ExchangeSnapshot>) -> Self {
        Self {
            start_time,
            burn_in_end: start_time,
            stock_count: exchange.stocks.len(),
            exchange,
        }
    }

    /// Restore `burn_in_end >= start_time` after calibration
    pub fn normalize(&mut self) {
        if self.burn_in_end < self.start_time {
            self.burn_in_end = self.start_time;
        }
    }
}
