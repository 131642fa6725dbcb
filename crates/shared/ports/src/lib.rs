//! Evolver Ports
//!
//! Port definitions (traits) for the Evolver market simulator.
//! These define the boundaries between the simulation core and its collaborators.

mod clock;
mod decision;
mod error;
mod portfolio;
mod prices;
mod sink;

pub use clock::Clock;
pub use decision::DecisionProvider;
pub use error::{DecisionError, DecisionResult, PublishError};
pub use portfolio::PortfolioManager;
pub use prices::PriceService;
pub use sink::EventSink;

// Re-export the explicit no-price result for convenience
pub use evolver_core::{NoPriceReason, PriceUnavailable};
