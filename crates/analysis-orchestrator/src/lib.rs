use analysis_core::{
    AnalysisError, CompanyFundamentals, EngineConfig, HistoricalGrowth, HistoryPeriod, MarketDataProvider,
    TextCompletion, ValuationAssumptions, ValuationInputs, ValuationVerdict,
};
use chrono::Utc;
use fundamental_analysis::{
    project_cash_flows, valuation_verdict, GrowthEstimator, PeerMetricNormalizer, ReverseDcfSolver,
};
use futures_util::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use technical_analysis::IndicatorPipeline;

pub mod competitors;
pub mod narration;
pub mod report;

pub use competitors::parse_competitor_list;
pub use narration::{NarrationPrompt, NarrationTask, ValuationPayload};
pub use report::{
    OwnershipActivity, PeerSummary, ResearchReport, SectionOutcome, TechnicalSummary, ValuationSummary,
};

#[cfg(test)]
mod tests;

/// Where the peer set for a request comes from
#[derive(Debug, Clone, Default, PartialEq)]
pub enum PeerSource {
    /// Caller-supplied tickers
    Explicit(Vec<String>),
    /// Ask the completion service for direct competitors
    Discover,
    #[default]
    None,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResearchRequest {
    pub ticker: String,
    pub assumptions: ValuationAssumptions,
    pub period: HistoryPeriod,
    pub peers: PeerSource,
}

impl ResearchRequest {
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            assumptions: ValuationAssumptions::default(),
            period: HistoryPeriod::default(),
            peers: PeerSource::None,
        }
    }

    pub fn with_assumptions(mut self, assumptions: ValuationAssumptions) -> Self {
        self.assumptions = assumptions;
        self
    }

    pub fn with_period(mut self, period: HistoryPeriod) -> Self {
        self.period = period;
        self
    }

    pub fn with_peers(mut self, peers: PeerSource) -> Self {
        self.peers = peers;
        self
    }
}

/// Drives one research request: fetches data, runs every engine, assembles the report
pub struct ResearchOrchestrator {
    provider: Arc<dyn MarketDataProvider>,
    completion: Option<Arc<dyn TextCompletion>>,
    config: EngineConfig,
    pipeline: IndicatorPipeline,
    solver: ReverseDcfSolver,
    growth: GrowthEstimator,
    normalizer: PeerMetricNormalizer,
}

impl ResearchOrchestrator {
    pub fn new(provider: Arc<dyn MarketDataProvider>, config: EngineConfig) -> Self {
        Self {
            provider,
            completion: None,
            pipeline: IndicatorPipeline::new(config.indicators),
            solver: ReverseDcfSolver::new(config.dcf),
            growth: GrowthEstimator::new(),
            normalizer: PeerMetricNormalizer::new(config.peers),
            config,
        }
    }

    /// Attach a completion service for peer discovery and narration
    pub fn with_completion(mut self, completion: Arc<dyn TextCompletion>) -> Self {
        self.completion = Some(completion);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run every analysis for the request.
    ///
    /// Only a missing target fundamentals record fails the request; every
    /// other problem is recorded in the affected report section.
    pub async fn run(&self, request: &ResearchRequest) -> Result<ResearchReport, AnalysisError> {
        let ticker = request.ticker.trim().to_uppercase();
        if ticker.is_empty() {
            return Err(AnalysisError::MissingData("ticker".to_string()));
        }
        tracing::info!("Starting research for {} (period: {:?})", ticker, request.period);

        let fundamentals = self
            .provider
            .fetch_fundamentals(&ticker)
            .await?
            .ok_or_else(|| AnalysisError::MissingData(format!("no fundamentals for {ticker}")))?;

        let (history_result, revenue_result, insider_result, institutional_result) = tokio::join!(
            self.provider.fetch_price_history(&ticker, request.period),
            self.provider.fetch_revenue_series(&ticker),
            self.provider.fetch_insider_activity(&ticker),
            self.provider.fetch_institutional_holders(&ticker),
        );

        let technicals: SectionOutcome<TechnicalSummary> = history_result
            .and_then(|history| {
                let series = self.pipeline.compute(&history)?;
                let snapshot = series
                    .snapshot()
                    .ok_or_else(|| AnalysisError::MissingData("indicator series is empty".to_string()))?;
                Ok(TechnicalSummary { series, snapshot })
            })
            .into();
        log_unavailable(&ticker, "technicals", &technicals);

        let inputs = ValuationInputs::from_fundamentals(&fundamentals, request.assumptions);
        let valuation: SectionOutcome<ValuationSummary> = self
            .solver
            .solve(&inputs)
            .map(|implied| {
                // solve() has already rejected absent or non-positive FCF
                let projected_cash_flows = inputs
                    .free_cash_flow
                    .map(|fcf| project_cash_flows(fcf, implied.growth_rate, self.solver.config().projection_years))
                    .unwrap_or_default();
                ValuationSummary {
                    implied_growth_pct: implied.growth_pct(),
                    implied,
                    projected_cash_flows,
                }
            })
            .into();
        log_unavailable(&ticker, "valuation", &valuation);

        let historical_growth: SectionOutcome<HistoricalGrowth> = revenue_result
            .and_then(|series| self.growth.cagr(&series))
            .into();
        log_unavailable(&ticker, "historical growth", &historical_growth);

        let verdict = match valuation.ready() {
            Some(summary) => valuation_verdict(&summary.implied, historical_growth.ready()),
            None => ValuationVerdict::Undetermined,
        };

        let peer_tickers = self.resolve_peers(&ticker, &fundamentals, &request.peers).await;
        let peer_fundamentals = self.fetch_peer_fundamentals(&peer_tickers).await;
        let peers: SectionOutcome<PeerSummary> = self
            .normalizer
            .normalize(&fundamentals, &peer_fundamentals)
            .map(|comparison| PeerSummary {
                alternatives: comparison.better_alternatives(),
                comparison,
            })
            .into();
        log_unavailable(&ticker, "peers", &peers);

        let ownership = OwnershipActivity {
            insider: ownership_table(&ticker, "insider activity", insider_result),
            institutional: ownership_table(&ticker, "institutional holders", institutional_result),
        };

        let report = ResearchReport {
            ticker,
            generated_at: Utc::now(),
            assumptions: request.assumptions,
            fundamentals,
            valuation,
            historical_growth,
            verdict,
            technicals,
            peers,
            ownership,
        };

        tracing::info!(
            "Research complete for {}: verdict {}, {} peers",
            report.ticker,
            report.verdict.to_label(),
            report.peers.ready().map(|p| p.comparison.peers().len()).unwrap_or(0)
        );
        Ok(report)
    }

    /// Prompts for every narration the report has data for
    pub fn narration_prompts(&self, report: &ResearchReport) -> Result<Vec<NarrationPrompt>, AnalysisError> {
        narration::report_prompts(report)
    }

    pub async fn narrate(&self, prompt: &NarrationPrompt) -> Result<String, AnalysisError> {
        let completion = self
            .completion
            .as_ref()
            .ok_or_else(|| AnalysisError::Completion("no completion service configured".to_string()))?;
        tracing::debug!("Requesting narration: {}", prompt.task.to_label());
        completion.complete(&prompt.system, &prompt.user).await
    }

    /// Peer tickers for the request: uppercase, unique, never the target, at most `max_peers`
    async fn resolve_peers(&self, ticker: &str, fundamentals: &CompanyFundamentals, source: &PeerSource) -> Vec<String> {
        let max_peers = self.config.peers.max_peers;
        match source {
            PeerSource::Explicit(tickers) => clean_peer_tickers(tickers, ticker, max_peers),
            PeerSource::None => Vec::new(),
            PeerSource::Discover => match self.discover_competitors(ticker, fundamentals).await {
                Ok(tickers) => {
                    tracing::info!("Discovered {} competitors for {}: {:?}", tickers.len(), ticker, tickers);
                    clean_peer_tickers(&tickers, ticker, max_peers)
                }
                Err(e) => {
                    tracing::warn!("Competitor discovery failed for {}: {}", ticker, e);
                    Vec::new()
                }
            },
        }
    }

    async fn discover_competitors(
        &self,
        ticker: &str,
        fundamentals: &CompanyFundamentals,
    ) -> Result<Vec<String>, AnalysisError> {
        let max_peers = self.config.peers.max_peers;
        let prompt = narration::competitor_discovery_prompt(ticker, fundamentals.business_summary(), max_peers);
        let response = self.narrate(&prompt).await?;
        parse_competitor_list(&response, ticker, max_peers)
    }

    async fn fetch_peer_fundamentals(&self, tickers: &[String]) -> Vec<CompanyFundamentals> {
        let results = join_all(tickers.iter().map(|t| self.provider.fetch_fundamentals(t))).await;

        tickers
            .iter()
            .zip(results)
            .filter_map(|(ticker, result)| match result {
                Ok(Some(fundamentals)) => Some(fundamentals),
                Ok(None) => {
                    tracing::warn!("No fundamentals for peer {}, skipping", ticker);
                    None
                }
                Err(e) => {
                    tracing::warn!("Failed to fetch peer {}: {}", ticker, e);
                    None
                }
            })
            .collect()
    }
}

fn clean_peer_tickers(tickers: &[String], target: &str, max_peers: usize) -> Vec<String> {
    let target = target.trim().to_uppercase();
    let mut seen = HashSet::new();
    let cleaned: Vec<String> = tickers
        .iter()
        .map(|t| t.trim().to_uppercase())
        .filter(|t| !t.is_empty() && *t != target)
        .filter(|t| seen.insert(t.clone()))
        .collect();

    if cleaned.len() > max_peers {
        tracing::warn!(
            "{} peers requested for {}, keeping the first {}",
            cleaned.len(),
            target,
            max_peers
        );
    }
    cleaned.into_iter().take(max_peers).collect()
}

fn log_unavailable<T>(ticker: &str, section: &str, outcome: &SectionOutcome<T>) {
    if let Some(reason) = outcome.unavailable_reason() {
        tracing::warn!("{} section unavailable for {}: {}", section, ticker, reason);
    }
}

fn ownership_table(
    ticker: &str,
    label: &str,
    result: Result<Option<serde_json::Value>, AnalysisError>,
) -> Option<serde_json::Value> {
    match result {
        Ok(table) => table,
        Err(e) => {
            tracing::warn!("Failed to fetch {} for {}: {}", label, ticker, e);
            None
        }
    }
}
