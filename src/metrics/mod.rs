//! Journal analytics and the monthly P&L calendar.

mod calculator;
pub mod calendar;

pub use calculator::{JournalStats, MetricsCalculator, WeekdayWinRate};
pub use calendar::{CalendarCell, DayData, DayTone, MonthKey, MonthSummary};
