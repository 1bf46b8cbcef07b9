use async_trait::async_trait;
use crate::{AnalysisError, CompanyFundamentals, HistoryPeriod, PricePoint, RevenueSeries};

/// Source of market and fundamental data
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// `Ok(None)` when the ticker is unknown to the provider.
    async fn fetch_fundamentals(&self, ticker: &str) -> Result<Option<CompanyFundamentals>, AnalysisError>;

    /// Ascending by date; empty when no history is available.
    async fn fetch_price_history(&self, ticker: &str, period: HistoryPeriod) -> Result<Vec<PricePoint>, AnalysisError>;

    async fn fetch_revenue_series(&self, ticker: &str) -> Result<RevenueSeries, AnalysisError>;

    /// Opaque table handed to narration untouched
    async fn fetch_insider_activity(&self, ticker: &str) -> Result<Option<serde_json::Value>, AnalysisError>;

    /// Opaque table handed to narration untouched
    async fn fetch_institutional_holders(&self, ticker: &str) -> Result<Option<serde_json::Value>, AnalysisError>;
}

/// Text-completion service used for narration
#[async_trait]
pub trait TextCompletion: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, AnalysisError>;
}
