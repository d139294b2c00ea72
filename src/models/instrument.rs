//! Instrument reference data used to convert pips into prices and currency.

use std::path::Path;

use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Static pip metadata for a tradable symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    /// Symbol identifier (e.g., "GC", "EURUSD")
    pub symbol: String,

    /// Human-readable name
    #[serde(default)]
    pub label: String,

    /// Currency gained or lost per pip per standard lot
    pub pip_value: Decimal,

    /// Price distance of one pip
    pub pip_size: Decimal,
}

impl Instrument {
    pub fn new(symbol: &str, label: &str, pip_value: Decimal, pip_size: Decimal) -> Self {
        Self {
            symbol: symbol.to_string(),
            label: label.to_string(),
            pip_value,
            pip_size,
        }
    }

    /// Convert a pip distance into a price distance.
    pub fn pips_to_price(&self, pips: Decimal) -> Option<Decimal> {
        pips.checked_mul(self.pip_size)
    }
}

/// Symbol lookup table injected into the position sizer.
///
/// Keeps insertion order so listings match the order instruments were
/// declared in.
#[derive(Debug, Clone, Default)]
pub struct InstrumentTable {
    instruments: Vec<Instrument>,
}

impl InstrumentTable {
    /// Create an empty table.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in futures and FX instruments.
    pub fn builtin() -> Self {
        let mut table = Self::empty();
        table.insert(Instrument::new("GC", "Gold", dec!(10), dec!(0.1)));
        table.insert(Instrument::new("ES", "S&P 500", dec!(12.50), dec!(0.25)));
        table.insert(Instrument::new("NQ", "Nasdaq", dec!(5), dec!(0.25)));
        table.insert(Instrument::new("EURUSD", "EUR/USD", dec!(10), dec!(0.0001)));
        table.insert(Instrument::new("GBPUSD", "GBP/USD", dec!(10), dec!(0.0001)));
        table.insert(Instrument::new("USDJPY", "USD/JPY", dec!(9.26), dec!(0.01)));
        table
    }

    /// Parse a JSON array of instruments.
    pub fn from_json(json: &str) -> Result<Self> {
        let instruments: Vec<Instrument> =
            serde_json::from_str(json).context("Invalid instrument list")?;

        let mut table = Self::empty();
        for instrument in instruments {
            if instrument.pip_value <= Decimal::ZERO || instrument.pip_size <= Decimal::ZERO {
                bail!(
                    "Instrument {} must have a positive pip value and pip size",
                    instrument.symbol
                );
            }
            table.insert(instrument);
        }

        if table.is_empty() {
            bail!("Instrument list is empty");
        }

        Ok(table)
    }

    /// Load an instrument list from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read instruments from {}", path.display()))?;
        Self::from_json(&content)
    }

    /// Insert or replace an instrument, matching symbols case-insensitively.
    pub fn insert(&mut self, instrument: Instrument) {
        match self
            .instruments
            .iter_mut()
            .find(|i| i.symbol.eq_ignore_ascii_case(&instrument.symbol))
        {
            Some(existing) => *existing = instrument,
            None => self.instruments.push(instrument),
        }
    }

    /// Look up an instrument by symbol (case-insensitive).
    pub fn get(&self, symbol: &str) -> Option<&Instrument> {
        self.instruments
            .iter()
            .find(|i| i.symbol.eq_ignore_ascii_case(symbol))
    }

    pub fn symbols(&self) -> Vec<&str> {
        self.instruments.iter().map(|i| i.symbol.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Instrument> {
        self.instruments.iter()
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        let table = InstrumentTable::builtin();

        let gold = table.get("gc").unwrap();
        assert_eq!(gold.pip_value, dec!(10));
        assert_eq!(gold.pip_size, dec!(0.1));
        assert_eq!(gold.pips_to_price(dec!(20)), Some(dec!(2)));
        let index = Instrument::new("DAX", "DAX 40", dec!(25), dec!(1.5));
        assert_eq!(index.pips_to_price(Decimal::MAX), None);

        assert_eq!(
            table.symbols(),
            vec!["GC", "ES", "NQ", "EURUSD", "GBPUSD", "USDJPY"]
        );
        assert!(table.get("BTCUSD").is_none());
    }

    #[test]
    fn test_insert_replaces_existing_symbol() {
        let mut table = InstrumentTable::builtin();
        table.insert(Instrument::new("eurusd", "Euro", dec!(11), dec!(0.0001)));

        assert_eq!(table.len(), 6);
        assert_eq!(table.get("EURUSD").unwrap().pip_value, dec!(11));
    }

    #[test]
    fn test_from_json() {
        let json = r#"[
            {"symbol": "XAUUSD", "label": "Gold spot", "pip_value": "1", "pip_size": "0.01"},
            {"symbol": "US30", "pip_value": 1, "pip_size": 1}
        ]"#;

        let table = InstrumentTable::from_json(json).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("xauusd").unwrap().pip_size, dec!(0.01));
        assert_eq!(table.get("US30").unwrap().label, "");
    }

    #[test]
    fn test_from_json_rejects_bad_pip_metadata() {
        let json = r#"[{"symbol": "BAD", "pip_value": "0", "pip_size": "0.1"}]"#;
        assert!(InstrumentTable::from_json(json).is_err());

        assert!(InstrumentTable::from_json("[]").is_err());
        assert!(InstrumentTable::from_json("not json").is_err());
    }
}
