//! Periodic reporting points
//!
//! Report events are scheduled like any other event and value the portfolio
//! through the order listener. Hooks registered on the driver receive each
//! valuation once its instant has drained.

use chrono::{Datelike, Months, NaiveDate, NaiveTime};
use evolver_core::{EvolverSettings, PortfolioStatus, Timestamp};
use serde::{Deserialize, Serialize};

/// Diagnostics callback for portfolio valuations
pub type ReportHook = Box<dyn FnMut(&PortfolioStatus) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFrequency {
    /// Every day at 00:00
    Daily,
    /// Every Monday at 00:00
    Weekly,
    /// First of every month at 00:00
    Monthly,
}

impl ReportFrequency {
    /// Reporting times inside the run window, ascending
    pub fn report_times(&self, settings: &EvolverSettings) -> Vec<Timestamp> {
        let first = settings.start_time().date_naive();
        let last = settings.end_time().date_naive();

        let start = match self {
            ReportFrequency::Daily => Some(first),
            ReportFrequency::Weekly => {
                let offset = (7 - first.weekday().num_days_from_monday()) % 7;
                first.checked_add_days(chrono::Days::new(u64::from(offset)))
            }
            ReportFrequency::Monthly => {
                if first.day() == 1 {
                    Some(first)
                } else {
                    first
                        .with_day(1)
                        .and_then(|d| d.checked_add_months(Months::new(1)))
                }
            }
        };

        std::iter::successors(start, |d| self.next(*d))
            .take_while(|d| *d <= last)
            .map(|d| d.and_time(NaiveTime::MIN).and_utc())
            .filter(|t| settings.contains(*t))
            .collect()
    }

    fn next(&self, date: NaiveDate) -> Option<NaiveDate> {
        match self {
            ReportFrequency::Daily => date.succ_opt(),
            ReportFrequency::Weekly => date.checked_add_days(chrono::Days::new(7)),
            ReportFrequency::Monthly => date.checked_add_months(Months::new(1)),
        }
    }
}
