//! JSON-file trade journal.
//!
//! The whole journal lives in one JSON document. It is read once on open
//! and rewritten after every mutation (temp file + rename, so a crash
//! never leaves a half-written journal behind).

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::models::JournalTrade;

#[derive(Debug, Default, Serialize, Deserialize)]
struct JournalFile {
    #[serde(default)]
    trades: Vec<JournalTrade>,
}

/// Trade journal backed by a JSON file.
pub struct JournalStore {
    path: PathBuf,
    trades: Vec<JournalTrade>,
}

impl JournalStore {
    /// Open the journal at `path`. A missing file is an empty journal.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let trades = match tokio::fs::read_to_string(&path).await {
            Ok(content) if content.trim().is_empty() => Vec::new(),
            Ok(content) => {
                let file: JournalFile = serde_json::from_str(&content)
                    .with_context(|| format!("Corrupt journal file {}", path.display()))?;
                file.trades
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No journal yet, starting empty");
                Vec::new()
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read journal {}", path.display()))
            }
        };

        debug!(path = %path.display(), trades = trades.len(), "Journal loaded");
        Ok(Self { path, trades })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All trades, newest date first.
    pub fn list(&self) -> Vec<JournalTrade> {
        let mut trades = self.trades.clone();
        trades.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
        trades
    }

    pub fn get(&self, id: &str) -> Option<&JournalTrade> {
        self.trades.iter().find(|t| t.id == id)
    }

    /// Closed trades with a P&L, oldest date first.
    pub fn realized(&self) -> Vec<JournalTrade> {
        let mut trades: Vec<JournalTrade> =
            self.trades.iter().filter(|t| t.is_realized()).cloned().collect();
        trades.sort_by(|a, b| a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)));
        trades
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    /// Append a trade and persist.
    pub async fn add(&mut self, trade: JournalTrade) -> Result<()> {
        if self.get(&trade.id).is_some() {
            return Err(anyhow!("Trade {} already exists", trade.id));
        }

        info!(
            id = %trade.id,
            asset = %trade.asset,
            direction = %trade.direction,
            size = %trade.size,
            "Trade logged"
        );
        self.trades.push(trade);
        self.save().await
    }

    /// Close a trade with its realized P&L and persist.
    pub async fn close(&mut self, id: &str, pnl: Decimal) -> Result<JournalTrade> {
        let trade = self
            .trades
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| anyhow!("Trade not found: {}", id))?;

        trade.close(pnl)?;
        let closed = trade.clone();

        info!(id = %id, pnl = %pnl, "Trade closed");
        self.save().await?;
        Ok(closed)
    }

    /// Delete a trade and persist.
    pub async fn remove(&mut self, id: &str) -> Result<JournalTrade> {
        let index = self
            .trades
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| anyhow!("Trade not found: {}", id))?;

        let removed = self.trades.remove(index);
        info!(id = %id, "Trade removed");
        self.save().await?;
        Ok(removed)
    }

    async fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let file = JournalFile {
            trades: self.trades.clone(),
        };
        let json = serde_json::to_string_pretty(&file)?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;

        debug!(path = %self.path.display(), trades = self.trades.len(), "Journal saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Direction, TradeStatus, TradingSession};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn trade(day: u32, asset: &str) -> JournalTrade {
        JournalTrade::new(
            NaiveDate::from_ymd_opt(2024, 6, day).unwrap(),
            asset,
            Direction::Long,
            dec!(100),
            dec!(1),
            TradingSession::NewYork,
        )
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.json");
        let store = JournalStore::open(&path).await.unwrap();
        assert_eq!(store.path(), path.as_path());
        assert!(store.is_empty());
        assert!(store.realized().is_empty());
    }

    #[tokio::test]
    async fn test_add_close_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("journal.json");

        let mut store = JournalStore::open(&path).await.unwrap();
        let first = trade(3, "GC");
        let second = trade(5, "NQ");
        let first_id = first.id.clone();

        store.add(first).await.unwrap();
        store.add(second).await.unwrap();

        let closed = store.close(&first_id, dec!(250)).await.unwrap();
        assert_eq!(closed.status, TradeStatus::Closed);

        // Closing again fails and does not change the stored trade
        assert!(store.close(&first_id, dec!(1)).await.is_err());
        assert!(store.close("missing", dec!(1)).await.is_err());

        let reopened = JournalStore::open(&path).await.unwrap();
        assert_eq!(reopened.len(), 2);

        let listed = reopened.list();
        assert_eq!(listed[0].asset, "NQ");
        assert_eq!(listed[1].asset, "GC");

        let realized = reopened.realized();
        assert_eq!(realized.len(), 1);
        assert_eq!(realized[0].pnl, Some(dec!(250)));

        assert!(!dir.path().join("nested").join("journal.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_remove() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.json");

        let mut store = JournalStore::open(&path).await.unwrap();
        let t = trade(4, "ES");
        let id = t.id.clone();
        store.add(t.clone()).await.unwrap();

        // Duplicate ids are rejected
        assert!(store.add(t).await.is_err());

        let removed = store.remove(&id).await.unwrap();
        assert_eq!(removed.asset, "ES");
        assert!(store.remove(&id).await.is_err());

        let reopened = JournalStore::open(&path).await.unwrap();
        assert!(reopened.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(JournalStore::open(&path).await.is_err());
    }
}
