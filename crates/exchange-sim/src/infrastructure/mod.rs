pub mod calendar;
pub mod prices;

pub use calendar::{HolidayCalendar, HolidayRules};
pub use prices::ExchangePriceService;
