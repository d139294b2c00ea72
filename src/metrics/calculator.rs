//! Journal analytics: win rate, profit factor, P&L curve, weekday breakdown.

use chrono::{Datelike, Weekday};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::models::JournalTrade;

/// Aggregate statistics over realized journal trades.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct JournalStats {
    pub total_trades: u32,
    pub winning_trades: u32,
    pub losing_trades: u32,

    pub total_pnl: Decimal,

    /// Win rate in percent (0 to 100)
    pub win_rate: f64,

    /// Average profit on winning trades
    pub avg_win: Decimal,

    /// Average loss on losing trades (absolute value)
    pub avg_loss: Decimal,

    pub gross_profit: Decimal,

    /// Absolute value
    pub gross_loss: Decimal,

    /// Gross profit / gross loss; infinite with profits and no losses
    pub profit_factor: f64,

    /// Average P&L per trade
    pub expectancy: Decimal,

    /// Largest peak-to-trough fall of the cumulative P&L
    pub max_drawdown: Decimal,

    /// Sample standard deviation of per-trade P&L
    pub pnl_std_dev: f64,
}

/// Win rate for one weekday.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekdayWinRate {
    pub weekday: Weekday,
    pub trades: u32,
    pub wins: u32,
    /// Percent, 1 dp
    pub win_rate: f64,
}

/// Calculator for journal performance metrics.
pub struct MetricsCalculator;

impl MetricsCalculator {
    /// Compute statistics from realized trades. Open trades and trades
    /// without a P&L are skipped.
    pub fn calculate(trades: &[JournalTrade]) -> JournalStats {
        let pnls = realized_pnls(trades);
        Self::calculate_from_pnls(&pnls)
    }

    /// Compute statistics from a P&L series in trade order.
    pub fn calculate_from_pnls(pnls: &[Decimal]) -> JournalStats {
        let mut stats = JournalStats::default();

        if pnls.is_empty() {
            return stats;
        }

        let (wins, rest): (Vec<Decimal>, Vec<Decimal>) =
            pnls.iter().partition(|&&p| p > Decimal::ZERO);
        let losses: Vec<Decimal> = rest.into_iter().filter(|p| *p < Decimal::ZERO).collect();

        stats.total_trades = pnls.len() as u32;
        stats.winning_trades = wins.len() as u32;
        stats.losing_trades = losses.len() as u32;
        stats.total_pnl = pnls.iter().copied().sum();
        stats.win_rate = wins.len() as f64 / pnls.len() as f64 * 100.0;

        stats.gross_profit = wins.iter().copied().sum();
        stats.gross_loss = losses.iter().copied().sum::<Decimal>().abs();

        if !wins.is_empty() {
            stats.avg_win = stats.gross_profit / Decimal::from(wins.len() as u32);
        }
        if !losses.is_empty() {
            stats.avg_loss = stats.gross_loss / Decimal::from(losses.len() as u32);
        }

        stats.profit_factor = if stats.gross_loss > Decimal::ZERO {
            stats.gross_profit.to_f64().unwrap_or(0.0) / stats.gross_loss.to_f64().unwrap_or(1.0)
        } else if stats.gross_profit > Decimal::ZERO {
            f64::INFINITY
        } else {
            0.0
        };

        stats.expectancy = stats.total_pnl / Decimal::from(stats.total_trades);
        stats.max_drawdown = Self::max_drawdown(pnls);

        if pnls.len() >= 2 {
            let values: Vec<f64> = pnls.iter().filter_map(|p| p.to_f64()).collect();
            let std_dev = values.std_dev();
            if std_dev.is_finite() {
                stats.pnl_std_dev = std_dev;
            }
        }

        stats
    }

    /// Largest fall from a running peak of the equity curve (starting at 0).
    fn max_drawdown(pnls: &[Decimal]) -> Decimal {
        let mut equity = Decimal::ZERO;
        let mut peak = Decimal::ZERO;
        let mut max_dd = Decimal::ZERO;

        for pnl in pnls {
            equity += pnl;
            peak = peak.max(equity);
            max_dd = max_dd.max(peak - equity);
        }

        max_dd
    }

    /// Cumulative P&L after each realized trade, prefixed with 0.
    ///
    /// Trades are taken in date order. No trades gives an empty curve.
    pub fn pnl_curve(trades: &[JournalTrade]) -> Vec<Decimal> {
        let pnls = realized_pnls(trades);
        if pnls.is_empty() {
            return Vec::new();
        }

        let mut curve = Vec::with_capacity(pnls.len() + 1);
        let mut equity = Decimal::ZERO;
        curve.push(equity);
        for pnl in pnls {
            equity += pnl;
            curve.push(equity);
        }
        curve
    }

    /// Win rate per weekday, Monday to Friday. Weekend trades are ignored.
    pub fn weekday_win_rates(trades: &[JournalTrade]) -> Vec<WeekdayWinRate> {
        let mut days: Vec<WeekdayWinRate> = [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
        ]
        .into_iter()
        .map(|weekday| WeekdayWinRate {
            weekday,
            trades: 0,
            wins: 0,
            win_rate: 0.0,
        })
        .collect();

        for trade in trades.iter().filter(|t| t.is_realized()) {
            let index = trade.date.weekday().num_days_from_monday() as usize;
            let Some(day) = days.get_mut(index) else {
                continue;
            };
            day.trades += 1;
            if trade.is_win() {
                day.wins += 1;
            }
        }

        for day in &mut days {
            if day.trades > 0 {
                let pct = day.wins as f64 / day.trades as f64 * 100.0;
                day.win_rate = (pct * 10.0).round() / 10.0;
            }
        }

        days
    }
}

/// P&L of realized trades, in date order.
fn realized_pnls(trades: &[JournalTrade]) -> Vec<Decimal> {
    let mut realized: Vec<&JournalTrade> = trades.iter().filter(|t| t.is_realized()).collect();
    realized.sort_by_key(|t| (t.date, t.created_at));
    realized.iter().filter_map(|t| t.pnl).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Direction, TradingSession};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn closed(date: (i32, u32, u32), pnl: Decimal) -> JournalTrade {
        let mut trade = JournalTrade::new(
            NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            "GC",
            Direction::Long,
            dec!(1900),
            dec!(0.5),
            TradingSession::NewYork,
        );
        trade.close(pnl).unwrap();
        trade
    }

    #[test]
    fn test_calculate_pnl_metrics() {
        let pnls = vec![
            dec!(100),   // Win
            dec!(-50),   // Loss
            dec!(200),   // Win
            dec!(-30),   // Loss
            dec!(150),   // Win
        ];

        let stats = MetricsCalculator::calculate_from_pnls(&pnls);

        assert_eq!(stats.total_trades, 5);
        assert_eq!(stats.winning_trades, 3);
        assert_eq!(stats.losing_trades, 2);
        assert_eq!(stats.total_pnl, dec!(370));
        assert!((stats.win_rate - 60.0).abs() < 1e-9);
        assert_eq!(stats.avg_win, dec!(150));
        assert_eq!(stats.avg_loss, dec!(40));
        assert!((stats.profit_factor - 450.0 / 80.0).abs() < 1e-9);
        assert_eq!(stats.expectancy, dec!(74));
        assert!(stats.pnl_std_dev > 0.0);
    }

    #[test]
    fn test_profit_factor_without_losses() {
        let stats = MetricsCalculator::calculate_from_pnls(&[dec!(10), dec!(5)]);
        assert!(stats.profit_factor.is_infinite());

        let stats = MetricsCalculator::calculate_from_pnls(&[Decimal::ZERO]);
        assert_eq!(stats.profit_factor, 0.0);
        // Breakeven trades are neither wins nor losses
        assert_eq!(stats.winning_trades, 0);
        assert_eq!(stats.losing_trades, 0);
        assert_eq!(stats.pnl_std_dev, 0.0);
    }

    #[test]
    fn test_empty_journal() {
        let stats = MetricsCalculator::calculate(&[]);
        assert_eq!(stats, JournalStats::default());
        assert!(MetricsCalculator::pnl_curve(&[]).is_empty());
    }

    #[test]
    fn test_max_drawdown() {
        let pnls = vec![
            dec!(100),   // Equity: 100, Peak: 100
            dec!(50),    // Equity: 150, Peak: 150
            dec!(-80),   // Equity: 70,  DD: 80
            dec!(-20),   // Equity: 50,  DD: 100
            dec!(100),   // Equity: 150
            dec!(50),    // Equity: 200
        ];

        let stats = MetricsCalculator::calculate_from_pnls(&pnls);
        assert_eq!(stats.max_drawdown, dec!(100));
    }

    #[test]
    fn test_pnl_curve_orders_by_date_and_skips_open() {
        let mut trades = vec![
            closed((2024, 6, 5), dec!(-20)),
            closed((2024, 6, 3), dec!(50)),
        ];
        trades.push(JournalTrade::new(
            NaiveDate::from_ymd_opt(2024, 6, 4).unwrap(),
            "ES",
            Direction::Short,
            dec!(5300),
            dec!(1),
            TradingSession::NewYork,
        ));

        let curve = MetricsCalculator::pnl_curve(&trades);
        assert_eq!(curve, vec![dec!(0), dec!(50), dec!(30)]);

        let stats = MetricsCalculator::calculate(&trades);
        assert_eq!(stats.total_trades, 2);
    }

    #[test]
    fn test_weekday_win_rates() {
        // 2024-06-03 is a Monday
        let trades = vec![
            closed((2024, 6, 3), dec!(10)),
            closed((2024, 6, 3), dec!(-5)),
            closed((2024, 6, 10), dec!(7)),
            closed((2024, 6, 5), dec!(-1)),
            closed((2024, 6, 7), dec!(3)),
            // Saturday is ignored
            closed((2024, 6, 8), dec!(100)),
        ];

        let days = MetricsCalculator::weekday_win_rates(&trades);
        assert_eq!(days.len(), 5);

        assert_eq!(days[0].weekday, Weekday::Mon);
        assert_eq!(days[0].trades, 3);
        assert_eq!(days[0].win_rate, 66.7);

        assert_eq!(days[1].trades, 0);
        assert_eq!(days[1].win_rate, 0.0);

        assert_eq!(days[2].win_rate, 0.0);
        assert_eq!(days[2].trades, 1);

        assert_eq!(days[4].weekday, Weekday::Fri);
        assert_eq!(days[4].win_rate, 100.0);

        let total: u32 = days.iter().map(|d| d.trades).sum();
        assert_eq!(total, 5);
    }
}
