//! Trading logic: position sizing and calculator defaults.

mod config;
mod position_sizer;

pub use config::TradingConfig;
pub use position_sizer::{
    compute, round_half_up, PositionRequest, PositionResult, PositionSizer, RiskType,
    PRICE_DECIMALS, SIZE_DECIMALS,
};
