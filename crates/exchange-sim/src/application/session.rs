//! Exchange session state machine
//!
//! Computes the session boundaries for every trading day in the run window and
//! schedules them. `Closed` is the rest state outside the scheduled windows;
//! a run starting inside a session starts `Continuous`.

use chrono::{NaiveDate, NaiveTime};
use evolver_core::{
    EvolverSettings, ExchangeSession, ExchangeSnapshot, ExchangeStatusChanged, SimEvent, Timestamp,
};
use evolver_ports::EventSink;
use evolver_scheduler::Scheduler;
use log::{debug, info};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::{ExchangeError, Result};
use crate::infrastructure::HolidayCalendar;

/// Immutable session configuration for one exchange
#[derive(Debug, Clone)]
pub struct SessionConfig {
    open_time: NaiveTime,
    close_time: NaiveTime,
    calendar: HolidayCalendar,
}

impl SessionConfig {
    /// Open and close are UTC wall times; open must precede close
    pub fn new(open_time: NaiveTime, close_time: NaiveTime, calendar: HolidayCalendar) -> Result<Self> {
        if open_time >= close_time {
            return Err(ExchangeError::InvalidSessionTimes {
                open: open_time,
                close: close_time,
            });
        }

        Ok(Self {
            open_time,
            close_time,
            calendar,
        })
    }

    /// Session times and calendar taken from an exchange snapshot
    pub fn for_exchange(exchange: &ExchangeSnapshot) -> Result<Self> {
        Self::new(
            exchange.open_time,
            exchange.close_time,
            HolidayCalendar::for_country(&exchange.country_code),
        )
    }

    pub fn calendar(&self) -> &HolidayCalendar {
        &self.calendar
    }

    pub fn open_time(&self) -> NaiveTime {
        self.open_time
    }

    pub fn close_time(&self) -> NaiveTime {
        self.close_time
    }
}

/// A scheduled session boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTransition {
    pub time: Timestamp,
    pub from: ExchangeSession,
    pub to: ExchangeSession,
}

/// Schedules and tracks closed <-> continuous trading transitions
pub struct ExchangeStateMachine {
    config: SessionConfig,
    session: Arc<Mutex<ExchangeSession>>,
}

impl ExchangeStateMachine {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            session: Arc::new(Mutex::new(ExchangeSession::Closed)),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Session as of the last fired transition
    pub fn current_session(&self) -> ExchangeSession {
        *self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Session in force at `time` according to the calendar
    pub fn session_at(&self, time: Timestamp) -> ExchangeSession {
        let open = self.config.calendar.is_trading_day(time.date_naive())
            && (self.config.open_time..self.config.close_time).contains(&time.time());
        if open {
            ExchangeSession::Continuous
        } else {
            ExchangeSession::Closed
        }
    }

    /// Every boundary inside the run window, in time order
    ///
    /// A trading day contributes one open and one close; non-trading days
    /// contribute nothing. Boundaries outside `[start, end]` are dropped.
    pub fn transitions(&self, settings: &EvolverSettings) -> Vec<SessionTransition> {
        let first_day = settings.start_time().date_naive();
        let last_day = settings.end_time().date_naive();

        first_day
            .iter_days()
            .take_while(|day| *day <= last_day)
            .filter(|day| self.config.calendar.is_trading_day(*day))
            .flat_map(|day| self.day_transitions(day))
            .filter(|t| settings.contains(t.time))
            .collect()
    }

    fn day_transitions(&self, day: NaiveDate) -> [SessionTransition; 2] {
        [
            SessionTransition {
                time: day.and_time(self.config.open_time).and_utc(),
                from: ExchangeSession::Closed,
                to: ExchangeSession::Continuous,
            },
            SessionTransition {
                time: day.and_time(self.config.close_time).and_utc(),
                from: ExchangeSession::Continuous,
                to: ExchangeSession::Closed,
            },
        ]
    }

    /// Schedule every transition in the window; returns how many were scheduled
    ///
    /// The current session is reset to the one in force at the start time.
    /// On firing it is updated and `ExchangeStatusChanged` is published to
    /// `sink`.
    pub fn initialize(
        &self,
        settings: &EvolverSettings,
        scheduler: &Scheduler,
        sink: Arc<dyn EventSink>,
    ) -> usize {
        let initial = self.session_at(settings.start_time());
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = initial;
        let transitions = self.transitions(settings);

        for transition in &transitions {
            let session = self.session.clone();
            let sink = sink.clone();
            let to = transition.to;

            scheduler.schedule(transition.time, move |due| {
                let previous = {
                    let mut current = session.lock().unwrap_or_else(PoisonError::into_inner);
                    std::mem::replace(&mut *current, to)
                };
                debug!("[Session] {:?} -> {:?} at {}", previous, to, due);
                sink.publish(SimEvent::ExchangeStatus(ExchangeStatusChanged {
                    time: due,
                    previous,
                    new: to,
                }))?;
                Ok(())
            });
        }

        info!(
            "[Session] {:?} at start, scheduled {} session transitions between {} and {}",
            initial,
            transitions.len(),
            settings.start_time(),
            settings.end_time()
        );
        transitions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone, Utc, Weekday};

    fn config() -> SessionConfig {
        SessionConfig::new(
            NaiveTime::from_hms_opt(14, 30, 0).unwrap(),
            NaiveTime::from_hms_opt(21, 0, 0).unwrap(),
            HolidayCalendar::for_country("US"),
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_open_after_close() {
        let result = SessionConfig::new(
            NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            HolidayCalendar::weekends_only(),
        );
        assert!(matches!(result, Err(ExchangeError::InvalidSessionTimes { .. })));
    }

    #[test]
    fn test_two_transitions_per_trading_day() {
        let machine = ExchangeStateMachine::new(config());
        // Tue 2 Jan .. Fri 5 Jan 2024
        let settings = EvolverSettings::daily(
            Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 5, 23, 59, 0).unwrap(),
        )
        .unwrap();

        let transitions = machine.transitions(&settings);
        assert_eq!(transitions.len(), 8);
        assert!(transitions.windows(2).all(|w| w[0].time < w[1].time));
        assert_eq!(transitions[0].to, ExchangeSession::Continuous);
        assert_eq!(transitions[1].to, ExchangeSession::Closed);
    }

    #[test]
    fn test_skips_weekend_and_holiday() {
        let machine = ExchangeStateMachine::new(config());
        // Sat 30 Dec 2023 .. Mon 1 Jan 2024 (New Year)
        let settings = EvolverSettings::daily(
            Utc.with_ymd_and_hms(2023, 12, 30, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 23, 0, 0).unwrap(),
        )
        .unwrap();

        assert!(machine.transitions(&settings).is_empty());
    }

    #[test]
    fn test_boundaries_outside_window_dropped() {
        let machine = ExchangeStateMachine::new(config());
        // Window starts after the open on Tue 2 Jan
        let settings = EvolverSettings::daily(
            Utc.with_ymd_and_hms(2024, 1, 2, 15, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 2, 22, 0, 0).unwrap(),
        )
        .unwrap();

        let transitions = machine.transitions(&settings);
        assert_eq!(transitions.len(), 1);
        assert_eq!(transitions[0].to, ExchangeSession::Closed);
        assert_eq!(transitions[0].time.weekday(), Weekday::Tue);
    }

    #[test]
    fn test_initial_state_closed() {
        let machine = ExchangeStateMachine::new(config());
        assert_eq!(machine.current_session(), ExchangeSession::Closed);
    }

    #[test]
    fn test_session_at_follows_calendar_and_hours() {
        let machine = ExchangeStateMachine::new(config());
        let at = |d, h, m| Utc.with_ymd_and_hms(2024, 1, d, h, m, 0).unwrap();

        assert_eq!(machine.session_at(at(2, 14, 30)), ExchangeSession::Continuous);
        assert_eq!(machine.session_at(at(2, 20, 59)), ExchangeSession::Continuous);
        assert_eq!(machine.session_at(at(2, 21, 0)), ExchangeSession::Closed);
        assert_eq!(machine.session_at(at(2, 9, 0)), ExchangeSession::Closed);
        // Saturday and New Year's Day
        assert_eq!(machine.session_at(at(6, 15, 0)), ExchangeSession::Closed);
        assert_eq!(machine.session_at(at(1, 15, 0)), ExchangeSession::Closed);
    }
}
