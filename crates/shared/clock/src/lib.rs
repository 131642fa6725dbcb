//! Evolver Clock Infrastructure
//!
//! Provides time sources for simulation and paced runs:
//!
//! - [`SimulationClock`]: simulated time, advanced only by the driver as
//!   scheduled events come due
//! - [`SystemClock`]: wall-clock time; waiting for a due time sleeps
//!
//! ## Usage
//!
//! ```ignore
//! use evolver_clock::{Clock, SimulationClock};
//!
//! let clock = SimulationClock::new(start);
//! clock.wait_until(start + Duration::days(1)).await; // instant jump
//! ```

mod simulation;
mod system;

pub use simulation::SimulationClock;
pub use system::SystemClock;

// Re-export the Clock trait for convenience
pub use evolver_ports::Clock;
