//! Monthly P&L calendar: per-day aggregation and a Monday-first grid.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::JournalTrade;

/// A calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthKey {
    pub year: i32,
    /// 1 to 12
    pub month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(anyhow!("Month must be between 1 and 12, got {}", month));
        }
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            bail!("Year {} is out of range", year);
        }
        Ok(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn prev(&self) -> Self {
        if self.month == 1 {
            Self { year: self.year - 1, month: 12 }
        } else {
            Self { year: self.year, month: self.month - 1 }
        }
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self { year: self.year + 1, month: 1 }
        } else {
            Self { year: self.year, month: self.month + 1 }
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(&self) -> NaiveDate {
        self.next()
            .first_day()
            .pred_opt()
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn days_in_month(&self) -> u32 {
        self.last_day().day()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl FromStr for MonthKey {
    type Err = anyhow::Error;

    /// Parse `YYYY-MM`.
    fn from_str(s: &str) -> Result<Self> {
        let (year, month) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| anyhow!("Expected YYYY-MM, got {}", s))?;
        let year: i32 = year.parse().with_context(|| format!("Invalid year in {}", s))?;
        let month: u32 = month.parse().with_context(|| format!("Invalid month in {}", s))?;
        Self::new(year, month)
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Result shading of a calendar cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayTone {
    Profit,
    Loss,
    Empty,
}

/// Realized P&L and trade count for one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DayData {
    pub pnl: Decimal,
    pub trades: u32,
}

impl DayData {
    /// Breakeven days count as profit.
    pub fn tone(&self) -> DayTone {
        if self.pnl >= Decimal::ZERO {
            DayTone::Profit
        } else {
            DayTone::Loss
        }
    }
}

/// One cell of the month grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarCell {
    /// Padding before the first of the month
    Blank,
    Day {
        date: NaiveDate,
        data: Option<DayData>,
    },
}

impl CalendarCell {
    pub fn tone(&self) -> DayTone {
        match self {
            CalendarCell::Day { data: Some(d), .. } => d.tone(),
            _ => DayTone::Empty,
        }
    }
}

/// Totals for a month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MonthSummary {
    pub total_pnl: Decimal,
    pub trading_days: u32,
    pub trades: u32,
    pub green_days: u32,
    pub red_days: u32,
}

/// Realized P&L of `month`, keyed by trade date.
pub fn aggregate_month(trades: &[JournalTrade], month: MonthKey) -> BTreeMap<NaiveDate, DayData> {
    let mut days: BTreeMap<NaiveDate, DayData> = BTreeMap::new();

    for trade in trades {
        let Some(pnl) = trade.pnl.filter(|_| trade.is_realized()) else {
            continue;
        };
        if !month.contains(trade.date) {
            continue;
        }
        let day = days.entry(trade.date).or_default();
        day.pnl += pnl;
        day.trades += 1;
    }

    days
}

/// Monday-first offset of the first day of the month (Mon = 0 .. Sun = 6).
pub fn leading_blanks(month: MonthKey) -> u32 {
    month.first_day().weekday().num_days_from_monday()
}

/// Grid cells for the month: leading blanks then every date, each
/// carrying its aggregated data if any.
pub fn month_grid(month: MonthKey, days: &BTreeMap<NaiveDate, DayData>) -> Vec<CalendarCell> {
    let blanks = leading_blanks(month) as usize;
    let mut cells = vec![CalendarCell::Blank; blanks];

    let mut date = month.first_day();
    while month.contains(date) {
        cells.push(CalendarCell::Day {
            date,
            data: days.get(&date).copied(),
        });
        match date.succ_opt() {
            Some(next) => date = next,
            None => break,
        }
    }

    cells
}

pub fn summarize(days: &BTreeMap<NaiveDate, DayData>) -> MonthSummary {
    let mut summary = MonthSummary::default();
    for day in days.values() {
        summary.total_pnl += day.pnl;
        summary.trades += day.trades;
        summary.trading_days += 1;
        match day.tone() {
            DayTone::Profit => summary.green_days += 1,
            _ => summary.red_days += 1,
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Direction, TradingSession};
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn trade(on: NaiveDate, pnl: Option<Decimal>) -> JournalTrade {
        let mut t = JournalTrade::new(
            on,
            "EURUSD",
            Direction::Long,
            dec!(1.08),
            dec!(1),
            TradingSession::London,
        );
        if let Some(p) = pnl {
            t.close(p).unwrap();
        }
        t
    }

    #[test]
    fn test_month_navigation() {
        let jan = MonthKey::new(2024, 1).unwrap();
        assert_eq!(jan.prev(), MonthKey::new(2023, 12).unwrap());
        assert_eq!(jan.next().next(), MonthKey::new(2024, 3).unwrap());
        assert_eq!(MonthKey::new(2024, 12).unwrap().next(), MonthKey::new(2025, 1).unwrap());

        assert_eq!(MonthKey::new(2024, 2).unwrap().days_in_month(), 29);
        assert_eq!(MonthKey::new(2023, 2).unwrap().days_in_month(), 28);
        assert_eq!(MonthKey::new(2024, 12).unwrap().last_day(), date(2024, 12, 31));

        assert!(MonthKey::new(2024, 13).is_err());
        assert!(MonthKey::new(300000, 1).is_err());
        assert!(MonthKey::new(-300000, 1).is_err());
        assert!("300000-01".parse::<MonthKey>().is_err());
    }

    #[test]
    fn test_parse_month() {
        let m: MonthKey = "2024-06".parse().unwrap();
        assert_eq!(m, MonthKey { year: 2024, month: 6 });
        assert_eq!(m.to_string(), "2024-06");

        assert!("2024".parse::<MonthKey>().is_err());
        assert!("2024-00".parse::<MonthKey>().is_err());
        assert!("abcd-01".parse::<MonthKey>().is_err());
    }

    #[test]
    fn test_aggregate_month() {
        let june = MonthKey::new(2024, 6).unwrap();
        let trades = vec![
            trade(date(2024, 6, 3), Some(dec!(120))),
            trade(date(2024, 6, 3), Some(dec!(-20.5))),
            trade(date(2024, 6, 4), Some(dec!(-30))),
            // Open trades and other months are ignored
            trade(date(2024, 6, 5), None),
            trade(date(2024, 7, 1), Some(dec!(999))),
            trade(date(2024, 5, 31), Some(dec!(999))),
        ];

        let days = aggregate_month(&trades, june);
        assert_eq!(days.len(), 2);

        let monday = days[&date(2024, 6, 3)];
        assert_eq!(monday.pnl, dec!(99.5));
        assert_eq!(monday.trades, 2);
        assert_eq!(monday.tone(), DayTone::Profit);
        assert_eq!(days[&date(2024, 6, 4)].tone(), DayTone::Loss);

        let summary = summarize(&days);
        assert_eq!(summary.total_pnl, dec!(69.5));
        assert_eq!(summary.trades, 3);
        assert_eq!(summary.trading_days, 2);
        assert_eq!(summary.green_days, 1);
        assert_eq!(summary.red_days, 1);
    }

    #[test]
    fn test_month_grid_is_monday_first() {
        // June 2024 starts on a Saturday
        let june = MonthKey::new(2024, 6).unwrap();
        assert_eq!(leading_blanks(june), 5);

        // September 2024 starts on a Sunday
        assert_eq!(leading_blanks(MonthKey::new(2024, 9).unwrap()), 6);
        // July 2024 starts on a Monday
        assert_eq!(leading_blanks(MonthKey::new(2024, 7).unwrap()), 0);

        let mut days = BTreeMap::new();
        days.insert(date(2024, 6, 10), DayData { pnl: dec!(-5), trades: 1 });

        let cells = month_grid(june, &days);
        assert_eq!(cells.len(), 5 + 30);
        assert_eq!(cells[0], CalendarCell::Blank);
        assert_eq!(cells[4].tone(), DayTone::Empty);
        assert_eq!(
            cells[5],
            CalendarCell::Day { date: date(2024, 6, 1), data: None }
        );
        assert_eq!(cells[5 + 9].tone(), DayTone::Loss);
    }
}
