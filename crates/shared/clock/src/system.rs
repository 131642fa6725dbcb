use async_trait::async_trait;
use evolver_core::Timestamp;
use evolver_ports::Clock;
use chrono::Utc;

/// Real system clock for paced runs
///
/// This simply returns the current wall-clock time; waiting sleeps until the
/// wall clock reaches the requested time.
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }

    async fn wait_until(&self, time: Timestamp) {
        let remaining = time - Utc::now();
        if let Ok(remaining) = remaining.to_std() {
            tokio::time::sleep(remaining).await;
        }
    }

    fn name(&self) -> &str {
        "SystemClock"
    }
}
