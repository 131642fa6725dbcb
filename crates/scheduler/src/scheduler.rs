//! Time-ordered event queue
//!
//! Events are ordered by due time; events with the same due time fire in the
//! order they were scheduled. The scheduler does not own a clock: the driver
//! calls [`Scheduler::fire_due`] with the current time on every tick.

use evolver_core::Timestamp;
use log::{debug, error, trace};
use priority_queue::PriorityQueue;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::ActionError;

/// Work to run when an event comes due. Receives the event's due time.
pub type Action = Box<dyn FnOnce(Timestamp) -> Result<(), ActionError> + Send>;

/// Handle to a scheduled event; also its insertion sequence number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(u64);

impl EventId {
    pub fn sequence(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Idle,
    Running,
    Stopped,
}

struct ScheduledEvent {
    due: Timestamp,
    action: Action,
}

struct SchedulerState {
    /// Min-ordering on (due, sequence)
    queue: PriorityQueue<EventId, Reverse<(Timestamp, EventId)>>,
    events: HashMap<EventId, ScheduledEvent>,
    next_sequence: u64,
    status: Status,
}

impl SchedulerState {
    fn pop_due(&mut self, now: Timestamp) -> Option<(EventId, ScheduledEvent)> {
        let (_, Reverse((due, _))) = self.queue.peek()?;
        if *due > now {
            return None;
        }
        let (id, _) = self.queue.pop()?;
        self.events.remove(&id).map(|event| (id, event))
    }
}

/// Outcome of one firing pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FireReport {
    /// Events executed (including failed ones)
    pub fired: usize,
    /// Events whose action returned an error or panicked
    pub failed: usize,
}

/// Time-ordered event scheduler
///
/// Cheap to clone; every clone schedules into the same queue. Concurrent
/// producers are serialised by the internal lock.
#[derive(Clone)]
pub struct Scheduler {
    state: Arc<Mutex<SchedulerState>>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SchedulerState {
                queue: PriorityQueue::new(),
                events: HashMap::new(),
                next_sequence: 0,
                status: Status::Idle,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SchedulerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Allow events to fire
    pub fn start(&self) {
        let mut state = self.lock();
        if state.status == Status::Idle {
            debug!("[Scheduler] started with {} pending events", state.queue.len());
            state.status = Status::Running;
        }
    }

    /// Halt firing and discard everything still queued
    pub fn stop(&self) {
        let mut state = self.lock();
        let discarded = state.queue.len();
        state.queue.clear();
        state.events.clear();
        state.status = Status::Stopped;
        debug!("[Scheduler] stopped, discarded {} pending events", discarded);
    }

    pub fn is_running(&self) -> bool {
        self.lock().status == Status::Running
    }

    /// Queue `action` to run at `due`
    ///
    /// Any due time is accepted, including times already passed; such events
    /// fire on the next tick. Nothing is deduplicated. After `stop()` the
    /// event is dropped.
    pub fn schedule_new_event(&self, action: Action, due: Timestamp) -> EventId {
        let mut state = self.lock();
        let id = EventId(state.next_sequence);
        state.next_sequence += 1;

        if state.status == Status::Stopped {
            debug!("[Scheduler] dropping event {} scheduled after stop", id.0);
            return id;
        }

        trace!("[Scheduler] scheduled event {} at {}", id.0, due);
        state.queue.push(id, Reverse((due, id)));
        state.events.insert(id, ScheduledEvent { due, action });
        id
    }

    /// Convenience wrapper around [`Scheduler::schedule_new_event`]
    pub fn schedule<F>(&self, due: Timestamp, action: F) -> EventId
    where
        F: FnOnce(Timestamp) -> Result<(), ActionError> + Send + 'static,
    {
        self.schedule_new_event(Box::new(action), due)
    }

    /// Due time of the earliest pending event
    pub fn next_due(&self) -> Option<Timestamp> {
        self.lock()
            .queue
            .peek()
            .map(|(_, Reverse((due, _)))| *due)
    }

    pub fn pending(&self) -> usize {
        self.lock().queue.len()
    }

    /// Run every event due at or before `now`, earliest first
    ///
    /// Events scheduled by an action that are already due run in the same
    /// pass. A failing action is logged and does not stop later events.
    pub fn fire_due(&self, now: Timestamp) -> FireReport {
        let mut report = FireReport::default();

        loop {
            // Release the lock before running the action so it can schedule
            let next = {
                let mut state = self.lock();
                if state.status != Status::Running {
                    break;
                }
                state.pop_due(now)
            };

            let Some((id, event)) = next else {
                break;
            };

            report.fired += 1;
            let due = event.due;
            let action = event.action;

            match catch_unwind(AssertUnwindSafe(move || action(due))) {
                Ok(Ok(())) => trace!("[Scheduler] fired event {} due {}", id.0, due),
                Ok(Err(e)) => {
                    report.failed += 1;
                    error!("[Scheduler] event {} due {} failed: {}", id.0, due, e);
                }
                Err(panic) => {
                    report.failed += 1;
                    let message = panic
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| panic.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".to_string());
                    error!("[Scheduler] event {} due {} panicked: {}", id.0, due, message);
                }
            }
        }

        report
    }
}
