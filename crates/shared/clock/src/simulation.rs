use async_trait::async_trait;
use evolver_core::Timestamp;
use evolver_ports::Clock;
use std::sync::{Arc, PoisonError, RwLock};

/// Simulated clock - the source of truth for time in a simulation run
///
/// Time only moves when the driver advances it to the next scheduled event.
/// It never moves backwards.
pub struct SimulationClock {
    /// Current simulation time
    current_time: RwLock<Timestamp>,
}

impl SimulationClock {
    /// Create a new simulation clock starting at `initial_time`
    pub fn new(initial_time: Timestamp) -> Arc<Self> {
        Arc::new(Self {
            current_time: RwLock::new(initial_time),
        })
    }

    /// Move the clock forward to `time`
    ///
    /// Returns the resulting time; a `time` in the past leaves the clock unchanged.
    pub fn advance_to(&self, time: Timestamp) -> Timestamp {
        let mut current = self
            .current_time
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if time > *current {
            *current = time;
        } else if time < *current {
            log::trace!(
                "[SimulationClock] ignoring backwards move from {} to {}",
                *current,
                time
            );
        }
        *current
    }
}

#[async_trait]
impl Clock for SimulationClock {
    fn now(&self) -> Timestamp {
        *self
            .current_time
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    async fn wait_until(&self, time: Timestamp) {
        self.advance_to(time);
    }

    fn name(&self) -> &str {
        "SimulationClock"
    }
}
