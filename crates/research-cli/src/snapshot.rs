//! Market data read from JSON snapshot files.
//!
//! A snapshot directory holds one `<TICKER>.json` file per company; the file
//! stem is the ticker. Every field of a snapshot is optional so partial
//! exports still load.

use analysis_core::{
    AnalysisError, CompanyFundamentals, HistoryPeriod, MarketDataProvider, PricePoint, RevenueSeries,
};
use anyhow::Context;
use async_trait::async_trait;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketSnapshot {
    pub fundamentals: Option<CompanyFundamentals>,
    pub price_history: Vec<PricePoint>,
    pub revenue_series: RevenueSeries,
    pub insider_activity: Option<serde_json::Value>,
    pub institutional_holders: Option<serde_json::Value>,
}

/// In-memory provider keyed by uppercase ticker
#[derive(Debug, Clone, Default)]
pub struct SnapshotProvider {
    snapshots: HashMap<String, MarketSnapshot>,
}

impl SnapshotProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `*.json` file in `dir`
    pub fn from_dir(dir: &Path) -> anyhow::Result<Self> {
        let mut provider = Self::new();
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("cannot read snapshot directory {}", dir.display()))?;

        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(ticker) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("cannot read snapshot {}", path.display()))?;
            let snapshot: MarketSnapshot = serde_json::from_str(&raw)
                .with_context(|| format!("malformed snapshot {}", path.display()))?;

            tracing::debug!("Loaded snapshot for {} ({} price points)", ticker, snapshot.price_history.len());
            provider.insert(ticker, snapshot);
        }

        tracing::info!("Loaded {} snapshots from {}", provider.len(), dir.display());
        Ok(provider)
    }

    /// Price history is stored sorted; a fundamentals record without a symbol takes the ticker.
    pub fn insert(&mut self, ticker: &str, mut snapshot: MarketSnapshot) {
        let ticker = ticker.trim().to_uppercase();
        snapshot.price_history.sort_by_key(|p| p.date);
        if let Some(fundamentals) = snapshot.fundamentals.as_mut() {
            if fundamentals.symbol.trim().is_empty() {
                fundamentals.symbol = ticker.clone();
            }
        }
        self.snapshots.insert(ticker, snapshot);
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    fn get(&self, ticker: &str) -> Option<&MarketSnapshot> {
        self.snapshots.get(&ticker.trim().to_uppercase())
    }
}

#[async_trait]
impl MarketDataProvider for SnapshotProvider {
    async fn fetch_fundamentals(&self, ticker: &str) -> Result<Option<CompanyFundamentals>, AnalysisError> {
        Ok(self.get(ticker).and_then(|s| s.fundamentals.clone()))
    }

    /// The window is measured back from the most recent stored point.
    async fn fetch_price_history(&self, ticker: &str, period: HistoryPeriod) -> Result<Vec<PricePoint>, AnalysisError> {
        let history = match self.get(ticker) {
            Some(snapshot) => &snapshot.price_history,
            None => return Ok(Vec::new()),
        };
        let Some(last) = history.last() else {
            return Ok(Vec::new());
        };

        let cutoff = last.date - Duration::days(period.to_days());
        Ok(history.iter().filter(|p| p.date > cutoff).cloned().collect())
    }

    async fn fetch_revenue_series(&self, ticker: &str) -> Result<RevenueSeries, AnalysisError> {
        Ok(self.get(ticker).map(|s| s.revenue_series.clone()).unwrap_or_default())
    }

    async fn fetch_insider_activity(&self, ticker: &str) -> Result<Option<serde_json::Value>, AnalysisError> {
        Ok(self.get(ticker).and_then(|s| s.insider_activity.clone()))
    }

    async fn fetch_institutional_holders(&self, ticker: &str) -> Result<Option<serde_json::Value>, AnalysisError> {
        Ok(self.get(ticker).and_then(|s| s.institutional_holders.clone()))
    }
}
