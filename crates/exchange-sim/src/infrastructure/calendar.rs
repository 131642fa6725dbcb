//! Public holiday calendars
//!
//! Rule-based calendars per country code. Dates are computed per year, so the
//! calendar works for any simulation window without data files.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Holiday rule set selected by country code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HolidayRules {
    /// NYSE holidays, Saturday moves to Friday and Sunday to Monday
    UnitedStates,
    /// England & Wales bank holidays with substitute days
    UnitedKingdom,
    /// German national holidays
    Germany,
    /// Only Saturday and Sunday are closed
    WeekendsOnly,
}

/// Trading-day calendar for one market
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HolidayCalendar {
    country_code: String,
    rules: HolidayRules,
    extra: BTreeSet<NaiveDate>,
}

impl HolidayCalendar {
    /// Calendar for a country code ("US", "GB"/"UK", "DE")
    ///
    /// Unknown codes fall back to weekends only.
    pub fn for_country(code: &str) -> Self {
        let rules = match code.to_ascii_uppercase().as_str() {
            "US" | "USA" => HolidayRules::UnitedStates,
            "GB" | "UK" => HolidayRules::UnitedKingdom,
            "DE" => HolidayRules::Germany,
            other => {
                log::warn!(
                    "No holiday rules for country code '{}', only weekends are closed",
                    other
                );
                HolidayRules::WeekendsOnly
            }
        };

        Self {
            country_code: code.to_string(),
            rules,
            extra: BTreeSet::new(),
        }
    }

    /// Calendar with no holidays besides weekends
    pub fn weekends_only() -> Self {
        Self {
            country_code: String::new(),
            rules: HolidayRules::WeekendsOnly,
            extra: BTreeSet::new(),
        }
    }

    /// Add explicit closure dates on top of the rules
    pub fn with_holidays(mut self, dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        self.extra.extend(dates);
        self
    }

    pub fn country_code(&self) -> &str {
        &self.country_code
    }

    pub fn rules(&self) -> HolidayRules {
        self.rules
    }

    pub fn is_weekend(date: NaiveDate) -> bool {
        matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.extra.contains(&date) || self.holidays_in_year(date.year()).contains(&date)
    }

    /// Not a weekend and not a public holiday
    pub fn is_trading_day(&self, date: NaiveDate) -> bool {
        !Self::is_weekend(date) && !self.is_holiday(date)
    }

    /// Rule-based holidays for `year` (explicit extras not included)
    pub fn holidays_in_year(&self, year: i32) -> BTreeSet<NaiveDate> {
        let mut days = BTreeSet::new();
        let Some(easter) = easter_sunday(year) else {
            return days;
        };

        match self.rules {
            HolidayRules::UnitedStates => {
                // New Year falling on Saturday is not observed on the Friday before
                if let Some(d) = ymd(year, 1, 1) {
                    if d.weekday() != Weekday::Sat {
                        days.insert(observed_us(d));
                    }
                }
                days.extend(nth_weekday(year, 1, Weekday::Mon, 3)); // MLK
                days.extend(nth_weekday(year, 2, Weekday::Mon, 3)); // Washington's Birthday
                days.insert(easter - Duration::days(2)); // Good Friday
                days.extend(last_weekday(year, 5, Weekday::Mon)); // Memorial Day
                if year >= 2022 {
                    days.extend(ymd(year, 6, 19).map(observed_us)); // Juneteenth
                }
                days.extend(ymd(year, 7, 4).map(observed_us));
                days.extend(nth_weekday(year, 9, Weekday::Mon, 1)); // Labor Day
                days.extend(nth_weekday(year, 11, Weekday::Thu, 4)); // Thanksgiving
                days.extend(ymd(year, 12, 25).map(observed_us));
            }
            HolidayRules::UnitedKingdom => {
                days.extend(ymd(year, 1, 1).map(next_weekday));
                days.insert(easter - Duration::days(2));
                days.insert(easter + Duration::days(1));
                days.extend(nth_weekday(year, 5, Weekday::Mon, 1)); // Early May
                days.extend(last_weekday(year, 5, Weekday::Mon)); // Spring
                days.extend(last_weekday(year, 8, Weekday::Mon)); // Summer
                if let (Some(christmas), Some(boxing)) = (ymd(year, 12, 25), ymd(year, 12, 26)) {
                    let christmas_observed = next_weekday(christmas);
                    let mut boxing_observed = next_weekday(boxing);
                    if boxing_observed <= christmas_observed {
                        boxing_observed = next_weekday(christmas_observed + Duration::days(1));
                    }
                    days.insert(christmas_observed);
                    days.insert(boxing_observed);
                }
            }
            HolidayRules::Germany => {
                days.extend(ymd(year, 1, 1));
                days.insert(easter - Duration::days(2));
                days.insert(easter + Duration::days(1));
                days.extend(ymd(year, 5, 1));
                days.insert(easter + Duration::days(39)); // Ascension
                days.insert(easter + Duration::days(50)); // Whit Monday
                days.extend(ymd(year, 10, 3));
                days.extend(ymd(year, 12, 25));
                days.extend(ymd(year, 12, 26));
            }
            HolidayRules::WeekendsOnly => {}
        }

        days
    }
}

fn ymd(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
}

fn nth_weekday(year: i32, month: u32, weekday: Weekday, n: u8) -> Option<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(year, month, weekday, n)
}

fn last_weekday(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    let first_of_next = if month == 12 {
        ymd(year + 1, 1, 1)?
    } else {
        ymd(year, month + 1, 1)?
    };
    let mut day = first_of_next - Duration::days(1);
    while day.weekday() != weekday {
        day -= Duration::days(1);
    }
    Some(day)
}

/// Saturday observed Friday, Sunday observed Monday
fn observed_us(date: NaiveDate) -> NaiveDate {
    match date.weekday() {
        Weekday::Sat => date - Duration::days(1),
        Weekday::Sun => date + Duration::days(1),
        _ => date,
    }
}

/// Weekend dates roll forward to Monday
fn next_weekday(date: NaiveDate) -> NaiveDate {
    match date.weekday() {
        Weekday::Sat => date + Duration::days(2),
        Weekday::Sun => date + Duration::days(1),
        _ => date,
    }
}

/// Gregorian Easter Sunday (anonymous algorithm)
fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    ymd(year, month as u32, day as u32)
}
