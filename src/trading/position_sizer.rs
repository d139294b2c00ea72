//! Position sizing: risk-to-lot conversion, stop/target prices, R:R.

use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{Direction, Instrument, InstrumentTable};

/// Decimal places for lot size, risk/reward ratio and risk percentage.
pub const SIZE_DECIMALS: u32 = 2;

/// Decimal places for stop-loss and take-profit prices.
pub const PRICE_DECIMALS: u32 = 5;

/// How the risk amount of a request is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RiskType {
    /// Absolute amount in account currency
    #[default]
    Amount,
    /// Percentage of the account balance
    Percentage,
}

impl FromStr for RiskType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "amount" | "dollar" | "$" | "cash" => Ok(Self::Amount),
            "percentage" | "percent" | "pct" | "%" => Ok(Self::Percentage),
            other => Err(anyhow!("Unknown risk type: {}", other)),
        }
    }
}

/// Trade geometry and risk tolerance entered by the trader.
///
/// Zero means "not filled in yet" for every numeric field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PositionRequest {
    pub direction: Direction,
    pub entry_price: Decimal,
    pub stop_loss_pips: Decimal,
    /// 0 = no take-profit
    #[serde(default)]
    pub take_profit_pips: Decimal,
    pub account_balance: Decimal,
    pub risk_amount: Decimal,
    #[serde(default)]
    pub risk_type: RiskType,
}

impl PositionRequest {
    /// All required fields are filled with positive values.
    pub fn is_complete(&self) -> bool {
        self.entry_price > Decimal::ZERO
            && self.stop_loss_pips > Decimal::ZERO
            && self.risk_amount > Decimal::ZERO
            && self.account_balance > Decimal::ZERO
    }

    /// Risk expressed in account currency; `None` if it overflows.
    pub fn risk_in_currency(&self) -> Option<Decimal> {
        match self.risk_type {
            RiskType::Percentage => {
                (self.risk_amount / dec!(100)).checked_mul(self.account_balance)
            }
            RiskType::Amount => Some(self.risk_amount),
        }
    }
}

/// Sized position derived from a request and an instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PositionResult {
    /// Lots, 2 dp
    pub position_size: Decimal,
    /// 5 dp
    pub stop_loss_price: Decimal,
    /// 5 dp; 0 when no take-profit was given
    pub take_profit_price: Decimal,
    /// Take-profit pips / stop-loss pips, 2 dp
    pub risk_reward_ratio: Decimal,
    /// Risk as a percentage of the balance, 2 dp
    pub risk_percentage: Decimal,
}

impl PositionResult {
    /// The "not yet computable" result.
    pub fn zero() -> Self {
        Self::default()
    }

    /// A non-zero lot size came out. Complete input can still round to
    /// 0.00 lots when the risk is tiny next to the stop distance.
    pub fn is_computable(&self) -> bool {
        self.position_size > Decimal::ZERO
    }

    /// Amount at risk in account currency, 2 dp. Zero on overflow.
    pub fn risk_in_currency(&self, account_balance: Decimal) -> Decimal {
        (self.risk_percentage / dec!(100))
            .checked_mul(account_balance)
            .map(|v| round_half_up(v, SIZE_DECIMALS))
            .unwrap_or_default()
    }

    /// Potential reward in account currency, 2 dp. Zero on overflow.
    pub fn reward_in_currency(&self, account_balance: Decimal) -> Decimal {
        (self.risk_percentage / dec!(100))
            .checked_mul(account_balance)
            .and_then(|risk| risk.checked_mul(self.risk_reward_ratio))
            .map(|v| round_half_up(v, SIZE_DECIMALS))
            .unwrap_or_default()
    }

    /// Potential reward as a percentage of the balance, 2 dp.
    pub fn reward_percentage(&self) -> Decimal {
        self.risk_percentage
            .checked_mul(self.risk_reward_ratio)
            .map(|v| round_half_up(v, SIZE_DECIMALS))
            .unwrap_or_default()
    }
}

impl fmt::Display for PositionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Position Size:  {} lots", self.position_size)?;
        writeln!(f, "Stop Loss:      {}", self.stop_loss_price)?;
        if self.take_profit_price.is_zero() {
            writeln!(f, "Take Profit:    -")?;
        } else {
            writeln!(f, "Take Profit:    {}", self.take_profit_price)?;
        }
        writeln!(f, "Risk/Reward:    1:{}", self.risk_reward_ratio)?;
        write!(f, "Risk:           {}%", self.risk_percentage)
    }
}

/// Round to `dp` places, midpoints away from zero (0.125 -> 0.13).
pub fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Size a position.
///
/// Incomplete input (entry, stop-loss pips, risk amount or balance not
/// positive) yields [`PositionResult::zero`]. A negative take-profit
/// distance counts as no take-profit. Input whose arithmetic leaves the
/// `Decimal` range (a vanishing stop against a huge risk, a balance near
/// zero, prices at `Decimal::MAX`) also yields the zero result.
pub fn compute(request: &PositionRequest, instrument: &Instrument) -> PositionResult {
    if !request.is_complete() {
        return PositionResult::zero();
    }

    match try_compute(request, instrument) {
        Some(result) => result,
        None => {
            debug!(symbol = %instrument.symbol, "Position sizing overflowed, returning zero result");
            PositionResult::zero()
        }
    }
}

fn try_compute(request: &PositionRequest, instrument: &Instrument) -> Option<PositionResult> {
    let entry = request.entry_price;
    let sl_pips = request.stop_loss_pips;
    let tp_pips = request.take_profit_pips.max(Decimal::ZERO);

    let risk = request.risk_in_currency()?;

    let pip_cost = sl_pips.checked_mul(instrument.pip_value)?;
    let position_size = if pip_cost > Decimal::ZERO {
        risk.checked_div(pip_cost)?
    } else {
        Decimal::ZERO
    };

    let sl_distance = instrument.pips_to_price(sl_pips)?;
    let stop_loss_price = match request.direction {
        Direction::Long => entry.checked_sub(sl_distance)?,
        Direction::Short => entry.checked_add(sl_distance)?,
    };

    let take_profit_price = if tp_pips > Decimal::ZERO {
        let tp_distance = instrument.pips_to_price(tp_pips)?;
        match request.direction {
            Direction::Long => entry.checked_add(tp_distance)?,
            Direction::Short => entry.checked_sub(tp_distance)?,
        }
    } else {
        Decimal::ZERO
    };

    let risk_reward_ratio = tp_pips.checked_div(sl_pips)?;
    let risk_percentage = risk
        .checked_div(request.account_balance)?
        .checked_mul(dec!(100))?;

    Some(PositionResult {
        position_size: round_half_up(position_size, SIZE_DECIMALS),
        stop_loss_price: round_half_up(stop_loss_price, PRICE_DECIMALS),
        take_profit_price: round_half_up(take_profit_price, PRICE_DECIMALS),
        risk_reward_ratio: round_half_up(risk_reward_ratio, SIZE_DECIMALS),
        risk_percentage: round_half_up(risk_percentage, SIZE_DECIMALS),
    })
}

/// Sizes requests against an injected instrument table.
pub struct PositionSizer {
    instruments: InstrumentTable,
}

impl PositionSizer {
    pub fn new(instruments: InstrumentTable) -> Self {
        Self { instruments }
    }

    pub fn instruments(&self) -> &InstrumentTable {
        &self.instruments
    }

    /// Size `request` for `symbol`. Unknown symbols give the zero result.
    pub fn size(&self, symbol: &str, request: &PositionRequest) -> PositionResult {
        let Some(instrument) = self.instruments.get(symbol) else {
            debug!(symbol = %symbol, "Unknown instrument, nothing to size");
            return PositionResult::zero();
        };

        let result = compute(request, instrument);
        debug!(
            symbol = %instrument.symbol,
            direction = %request.direction,
            lots = %result.position_size,
            risk_pct = %result.risk_percentage,
            "Position recomputed"
        );
        result
    }
}

impl Default for PositionSizer {
    fn default() -> Self {
        Self::new(InstrumentTable::builtin())
    }
}
