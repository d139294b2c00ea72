//! TradeCopilot
//!
//! Trading journal and position-sizing calculator: size trades against a
//! risk budget, log them, and review win rate, P&L curve and the monthly
//! calendar.

pub mod config;
pub mod journal;
pub mod metrics;
pub mod models;
pub mod session;
pub mod trading;
