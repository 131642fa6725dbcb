use async_trait::async_trait;
use evolver_core::Timestamp;

/// Port for time abstraction
///
/// This allows the simulator to use different time sources:
/// - Simulated time that only moves when the driver advances it
/// - Real system time for paced or live runs
#[async_trait]
pub trait Clock: Send + Sync {
    /// Get the current time according to this clock
    fn now(&self) -> Timestamp;

    /// Block until this clock reads at least `time`
    ///
    /// A simulated clock jumps straight to `time`; a wall clock sleeps.
    async fn wait_until(&self, time: Timestamp);

    /// Get the clock's name/identifier for debugging
    fn name(&self) -> &str {
        "Clock"
    }
}
