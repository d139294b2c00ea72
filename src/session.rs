//! New York session countdown.
//!
//! The session runs 09:30 to 11:00 New York time on weekdays. Outside of
//! it the clock counts down to the next weekday open; inside it counts
//! down to the close and reports how much of the session is left.

use std::fmt;

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset,
    TimeZone, Utc, Weekday,
};
use serde::{Deserialize, Serialize};

const EDT_OFFSET_SECS: i32 = -4 * 3600;
const EST_OFFSET_SECS: i32 = -5 * 3600;

/// Session open and close in New York local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl SessionWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> anyhow::Result<Self> {
        if end <= start {
            anyhow::bail!("Session end {} must be after start {}", end, start);
        }
        Ok(Self { start, end })
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

impl Default for SessionWindow {
    fn default() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(9, 30, 0).unwrap_or(NaiveTime::MIN),
            end: NaiveTime::from_hms_opt(11, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

/// Where the clock stands relative to the session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionStatus {
    /// Waiting for the next open
    PreSession {
        until_open: Duration,
        opens_at: DateTime<Utc>,
    },
    /// Session running
    InSession {
        remaining: Duration,
        /// Share of the session still ahead, 0 to 100
        progress: f64,
    },
}

impl SessionStatus {
    pub fn is_open(&self) -> bool {
        matches!(self, SessionStatus::InSession { .. })
    }

    pub fn countdown(&self) -> Duration {
        match self {
            SessionStatus::PreSession { until_open, .. } => *until_open,
            SessionStatus::InSession { remaining, .. } => *remaining,
        }
    }

    /// Ring fill level; full while waiting for the open.
    pub fn progress(&self) -> f64 {
        match self {
            SessionStatus::PreSession { .. } => 100.0,
            SessionStatus::InSession { progress, .. } => *progress,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            SessionStatus::PreSession { .. } => "Next session",
            SessionStatus::InSession { .. } => "Session in progress",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = if self.is_open() { "closes in" } else { "opens in" };
        write!(
            f,
            "NY session {} {} ({:.0}%)",
            verb,
            format_countdown(self.countdown()),
            self.progress()
        )
    }
}

/// Countdown against a fixed daily New York session window.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionClock {
    window: SessionWindow,
}

impl SessionClock {
    pub fn new(window: SessionWindow) -> Self {
        Self { window }
    }

    pub fn window(&self) -> SessionWindow {
        self.window
    }

    /// Status at the current wall-clock time.
    pub fn now(&self) -> SessionStatus {
        self.status(Utc::now())
    }

    /// Status at `now`. Session bounds are inclusive.
    pub fn status(&self, now: DateTime<Utc>) -> SessionStatus {
        let local = to_new_york(now).naive_local();
        let today = local.date();
        let time = local.time();

        if is_weekday(today) && time >= self.window.start && time <= self.window.end {
            let close = new_york_to_utc(today.and_time(self.window.end));
            let remaining = close - now;
            let total = self.window.duration().num_milliseconds() as f64;
            let progress = if total > 0.0 {
                remaining.num_milliseconds() as f64 / total * 100.0
            } else {
                0.0
            };
            return SessionStatus::InSession { remaining, progress };
        }

        let mut open_day = if is_weekday(today) && time < self.window.start {
            today
        } else {
            next_day(today)
        };
        while !is_weekday(open_day) {
            open_day = next_day(open_day);
        }

        let opens_at = new_york_to_utc(open_day.and_time(self.window.start));
        SessionStatus::PreSession {
            until_open: opens_at - now,
            opens_at,
        }
    }
}

/// `HH:MM:SS`; hours are not capped at 24. Negative durations show zero.
pub fn format_countdown(duration: Duration) -> String {
    if duration < Duration::zero() {
        return "00:00:00".to_string();
    }
    let total = duration.num_seconds();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// UTC offset in effect in New York at `utc`.
///
/// US daylight time runs from 02:00 local on the second Sunday of March to
/// 02:00 local on the first Sunday of November.
pub fn new_york_offset(utc: DateTime<Utc>) -> FixedOffset {
    let year = utc.year();
    // 02:00 EST and 02:00 EDT expressed in UTC
    let dst_start = nth_sunday(year, 3, 2).and_hms_opt(7, 0, 0);
    let dst_end = nth_sunday(year, 11, 1).and_hms_opt(6, 0, 0);

    let naive = utc.naive_utc();
    let in_dst = match (dst_start, dst_end) {
        (Some(start), Some(end)) => naive >= start && naive < end,
        _ => false,
    };

    let secs = if in_dst { EDT_OFFSET_SECS } else { EST_OFFSET_SECS };
    FixedOffset::east_opt(secs).unwrap_or_else(|| Utc.fix())
}

/// Convert a UTC instant to New York local time.
pub fn to_new_york(utc: DateTime<Utc>) -> DateTime<FixedOffset> {
    utc.with_timezone(&new_york_offset(utc))
}

/// Convert a New York wall-clock time to UTC, preferring daylight time
/// when the local time is ambiguous.
fn new_york_to_utc(local: NaiveDateTime) -> DateTime<Utc> {
    for secs in [EDT_OFFSET_SECS, EST_OFFSET_SECS] {
        let candidate = Utc.from_utc_datetime(&(local - Duration::seconds(secs as i64)));
        if new_york_offset(candidate).local_minus_utc() == secs {
            return candidate;
        }
    }
    Utc.from_utc_datetime(&(local - Duration::seconds(EST_OFFSET_SECS as i64)))
}

fn nth_sunday(year: i32, month: u32, n: u32) -> NaiveDate {
    let first = NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN);
    let to_sunday = (7 - first.weekday().num_days_from_sunday()) % 7;
    first + Duration::days((to_sunday + 7 * (n - 1)) as i64)
}

fn is_weekday(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

fn next_day(date: NaiveDate) -> NaiveDate {
    date.succ_opt().unwrap_or(date)
}
