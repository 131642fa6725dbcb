//! Evolver Scheduler
//!
//! The single primitive for "run this action at time T". Services schedule
//! their events here during initialization; the simulation driver advances the
//! clock and fires whatever is due.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use evolver_scheduler::Scheduler;
//!
//! let scheduler = Scheduler::new();
//! scheduler.schedule(open_time, move |due| {
//!     sink.publish(SimEvent::TimeIncrement(due))?;
//!     Ok(())
//! });
//!
//! scheduler.start();
//! while let Some(due) = scheduler.next_due() {
//!     clock.wait_until(due).await;
//!     scheduler.fire_due(clock.now());
//! }
//! ```

pub mod error;
pub mod scheduler;

pub use error::ActionError;
pub use scheduler::{Action, EventId, FireReport, Scheduler};
