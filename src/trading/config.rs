//! Calculator defaults applied when the trader has not filled a field in.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::RiskType;
use crate::models::{Direction, TradingSession};

/// Defaults for the position calculator form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingConfig {
    /// Account balance used when none is given
    pub account_balance: Decimal,

    /// Instrument selected by default
    pub asset: String,

    pub direction: Direction,

    /// How a bare risk figure is interpreted
    pub risk_type: RiskType,

    /// Session recorded on saved trades
    pub session: TradingSession,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            account_balance: dec!(10000),
            asset: "GC".to_string(),
            direction: Direction::Long,
            risk_type: RiskType::Amount,
            session: TradingSession::NewYork,
        }
    }
}
