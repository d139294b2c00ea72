//! Data models for instruments and journal trades.

mod instrument;
mod trade;

pub use instrument::{Instrument, InstrumentTable};
pub use trade::{Direction, JournalTrade, TradeContext, TradeStatus, TradingSession};
