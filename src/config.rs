//! Application configuration.

use std::path::PathBuf;

use anyhow::Result;
use tracing::info;

use crate::models::InstrumentTable;
use crate::session::SessionWindow;
use crate::trading::TradingConfig;

/// Default journal location, relative to the working directory.
pub const DEFAULT_JOURNAL_PATH: &str = "./tradecopilot-journal.json";

/// Effective configuration for a run.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Journal JSON file
    pub journal_path: PathBuf,

    /// Optional JSON instrument list replacing the built-in table
    pub instruments_path: Option<PathBuf>,

    /// Calculator defaults
    pub trading: TradingConfig,

    /// New York session window for the countdown
    pub session: SessionWindow,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            journal_path: PathBuf::from(DEFAULT_JOURNAL_PATH),
            instruments_path: None,
            trading: TradingConfig::default(),
            session: SessionWindow::default(),
        }
    }
}

impl AppConfig {
    /// Instrument table: the configured file if any, else the built-in list.
    pub fn instruments(&self) -> Result<InstrumentTable> {
        match &self.instruments_path {
            Some(path) => {
                let table = InstrumentTable::load(path)?;
                info!(path = %path.display(), count = table.len(), "Loaded instruments");
                Ok(table)
            }
            None => Ok(InstrumentTable::builtin()),
        }
    }
}
