use evolver_core::SimEvent;

use crate::error::PublishError;

/// Port for publishing simulation events to subscribers
///
/// Events published through one sink are delivered in publish order.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: SimEvent) -> Result<(), PublishError>;
}
