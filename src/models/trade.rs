//! Journal trade record: a planned or manually logged trade and its outcome.

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Direction of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Direction {
    #[default]
    Long,
    Short,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Long => "Long",
            Direction::Short => "Short",
        }
    }
}

impl FromStr for Direction {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "long" | "buy" => Ok(Self::Long),
            "short" | "sell" => Ok(Self::Short),
            other => Err(anyhow!("Unknown direction: {}", other)),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a journal trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TradeStatus {
    #[default]
    Open,
    Closed,
}

/// Market session a trade was taken in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TradingSession {
    #[default]
    #[serde(rename = "New York")]
    NewYork,
    London,
    Asian,
}

impl TradingSession {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradingSession::NewYork => "New York",
            TradingSession::London => "London",
            TradingSession::Asian => "Asian",
        }
    }

    /// Short code used in compact listings.
    pub fn code(&self) -> &'static str {
        match self {
            TradingSession::NewYork => "NY",
            TradingSession::London => "LN",
            TradingSession::Asian => "AS",
        }
    }
}

impl FromStr for TradingSession {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace(['-', '_'], " ").as_str() {
            "new york" | "newyork" | "ny" => Ok(Self::NewYork),
            "london" | "ln" => Ok(Self::London),
            "asian" | "asia" | "as" => Ok(Self::Asian),
            other => Err(anyhow!("Unknown session: {}", other)),
        }
    }
}

impl fmt::Display for TradingSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strategy context attached to a trade. All fields are free-form labels
/// (e.g. strategy "BOS OB", timeframe "M15", trend "Bullish").
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeContext {
    #[serde(default)]
    pub strategy: Option<String>,

    #[serde(default)]
    pub timeframe: Option<String>,

    #[serde(default)]
    pub trend_h4: Option<String>,

    #[serde(default)]
    pub trend_m15: Option<String>,

    #[serde(default)]
    pub trend_m1: Option<String>,
}

/// A single journal entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalTrade {
    /// Unique trade identifier
    pub id: String,

    /// Trading day the trade belongs to
    pub date: NaiveDate,

    /// When the entry was recorded
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    /// Instrument symbol
    pub asset: String,

    pub direction: Direction,

    pub entry_price: Decimal,

    /// Position size in lots
    pub size: Decimal,

    /// Realized P&L, set when the trade is closed
    #[serde(default)]
    pub pnl: Option<Decimal>,

    #[serde(default)]
    pub status: TradeStatus,

    #[serde(default)]
    pub session: TradingSession,

    #[serde(flatten)]
    pub context: TradeContext,

    #[serde(default)]
    pub notes: Option<String>,
}

impl JournalTrade {
    /// Create an open trade dated `date`.
    pub fn new(
        date: NaiveDate,
        asset: &str,
        direction: Direction,
        entry_price: Decimal,
        size: Decimal,
        session: TradingSession,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            date,
            created_at: Utc::now(),
            asset: asset.to_uppercase(),
            direction,
            entry_price,
            size,
            pnl: None,
            status: TradeStatus::Open,
            session,
            context: TradeContext::default(),
            notes: None,
        }
    }

    /// Create an open trade from a sized position.
    ///
    /// Requires a positive entry price and a computed, non-zero lot size.
    pub fn planned(
        date: NaiveDate,
        asset: &str,
        direction: Direction,
        entry_price: Decimal,
        size: Decimal,
        session: TradingSession,
    ) -> Result<Self> {
        if entry_price <= Decimal::ZERO {
            bail!("Entry price must be set before saving a trade");
        }
        if size <= Decimal::ZERO {
            bail!("Position size has not been computed; fill in all sizing fields");
        }
        Ok(Self::new(date, asset, direction, entry_price, size, session))
    }

    pub fn with_context(mut self, context: TradeContext) -> Self {
        self.context = context;
        self
    }

    /// Record the realized P&L and mark the trade closed.
    pub fn close(&mut self, pnl: Decimal) -> Result<()> {
        if self.status == TradeStatus::Closed {
            bail!("Trade {} is already closed", self.id);
        }
        self.pnl = Some(pnl);
        self.status = TradeStatus::Closed;
        Ok(())
    }

    /// Closed with a recorded P&L; these are the trades statistics use.
    pub fn is_realized(&self) -> bool {
        self.status == TradeStatus::Closed && self.pnl.is_some()
    }

    pub fn is_win(&self) -> bool {
        self.pnl.is_some_and(|p| p > Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
    }

    #[test]
    fn test_close_trade() {
        let mut trade = JournalTrade::new(
            day(),
            "eurusd",
            Direction::Long,
            dec!(1.1000),
            dec!(0.20),
            TradingSession::London,
        );

        assert_eq!(trade.asset, "EURUSD");
        assert!(!trade.is_realized());

        trade.close(dec!(-45.5)).unwrap();
        assert!(trade.is_realized());
        assert!(!trade.is_win());
        assert_eq!(trade.pnl, Some(dec!(-45.5)));

        // Closing twice is rejected
        assert!(trade.close(dec!(10)).is_err());
    }

    #[test]
    fn test_planned_requires_size() {
        let result = JournalTrade::planned(
            day(),
            "GC",
            Direction::Short,
            dec!(1900),
            Decimal::ZERO,
            TradingSession::NewYork,
        );
        assert!(result.is_err());

        let trade = JournalTrade::planned(
            day(),
            "GC",
            Direction::Short,
            dec!(1900),
            dec!(0.5),
            TradingSession::NewYork,
        )
        .unwrap();
        assert_eq!(trade.status, TradeStatus::Open);
    }

    #[test]
    fn test_session_parsing() {
        assert_eq!("new-york".parse::<TradingSession>().unwrap(), TradingSession::NewYork);
        assert_eq!("LN".parse::<TradingSession>().unwrap(), TradingSession::London);
        assert!("tokyo".parse::<TradingSession>().is_err());
        assert_eq!("sell".parse::<Direction>().unwrap(), Direction::Short);
    }

    #[test]
    fn test_serde_shape() {
        let trade = JournalTrade::new(
            day(),
            "NQ",
            Direction::Long,
            dec!(18000),
            dec!(1),
            TradingSession::NewYork,
        )
        .with_context(TradeContext {
            strategy: Some("BOS OB".to_string()),
            timeframe: Some("M15".to_string()),
            ..Default::default()
        });

        let json = serde_json::to_value(&trade).unwrap();
        assert_eq!(json["session"], "New York");
        assert_eq!(json["strategy"], "BOS OB");
        assert_eq!(json["date"], "2024-06-03");

        let back: JournalTrade = serde_json::from_value(json).unwrap();
        assert_eq!(back, trade);
    }
}
