use super::*;
use analysis_core::{InvalidAssumption, PricePoint, RevenuePoint, RevenueSeries};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
struct InMemoryProvider {
    fundamentals: HashMap<String, CompanyFundamentals>,
    history: HashMap<String, Vec<PricePoint>>,
    revenue: HashMap<String, RevenueSeries>,
    broken_tickers: Vec<String>,
}

impl InMemoryProvider {
    fn with_company(mut self, fundamentals: CompanyFundamentals) -> Self {
        self.fundamentals.insert(fundamentals.symbol.clone(), fundamentals);
        self
    }

    fn with_history(mut self, ticker: &str, history: Vec<PricePoint>) -> Self {
        self.history.insert(ticker.to_string(), history);
        self
    }

    fn with_revenue(mut self, ticker: &str, revenue: RevenueSeries) -> Self {
        self.revenue.insert(ticker.to_string(), revenue);
        self
    }

    fn broken(mut self, ticker: &str) -> Self {
        self.broken_tickers.push(ticker.to_string());
        self
    }

    fn check(&self, ticker: &str) -> Result<(), AnalysisError> {
        if self.broken_tickers.iter().any(|t| t == ticker) {
            return Err(AnalysisError::Provider(format!("upstream timeout for {ticker}")));
        }
        Ok(())
    }
}

#[async_trait]
impl MarketDataProvider for InMemoryProvider {
    async fn fetch_fundamentals(&self, ticker: &str) -> Result<Option<CompanyFundamentals>, AnalysisError> {
        self.check(ticker)?;
        Ok(self.fundamentals.get(ticker).cloned())
    }

    async fn fetch_price_history(&self, ticker: &str, _period: HistoryPeriod) -> Result<Vec<PricePoint>, AnalysisError> {
        Ok(self.history.get(ticker).cloned().unwrap_or_default())
    }

    async fn fetch_revenue_series(&self, ticker: &str) -> Result<RevenueSeries, AnalysisError> {
        self.check(ticker)?;
        Ok(self.revenue.get(ticker).cloned().unwrap_or_default())
    }

    async fn fetch_insider_activity(&self, ticker: &str) -> Result<Option<serde_json::Value>, AnalysisError> {
        Ok(self
            .fundamentals
            .contains_key(ticker)
            .then(|| serde_json::json!([{"insider": "CFO", "transaction": "Sale", "shares": 5000}])))
    }

    async fn fetch_institutional_holders(&self, _ticker: &str) -> Result<Option<serde_json::Value>, AnalysisError> {
        Ok(None)
    }
}

/// Replays a fixed answer and records every prompt it was given
struct ScriptedCompletion {
    answer: String,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedCompletion {
    fn new(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl TextCompletion for ScriptedCompletion {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, AnalysisError> {
        self.calls
            .lock()
            .unwrap()
            .push((system_prompt.to_string(), user_prompt.to_string()));
        Ok(self.answer.clone())
    }
}

const SHARES: f64 = 1_000.0;
const FCF: f64 = 50_000.0;

/// Price at which the default solver implies `growth` for the test company
fn price_implying(growth: f64) -> f64 {
    ReverseDcfSolver::default().dcf_value(FCF, growth, 0.10, 0.03) / SHARES
}

fn target_company() -> CompanyFundamentals {
    CompanyFundamentals {
        long_name: Some("Acme Widgets Inc.".to_string()),
        current_price: Some(price_implying(0.08)),
        free_cash_flow: Some(FCF),
        shares_outstanding: Some(SHARES),
        revenue_growth: Some(0.06),
        ev_to_ebitda: Some(18.0),
        profit_margins: Some(0.12),
        long_business_summary: Some("Acme makes industrial widgets.".to_string()),
        ..CompanyFundamentals::new("ACME")
    }
}

fn peer(symbol: &str, growth: f64, ev: f64, margin: f64) -> CompanyFundamentals {
    CompanyFundamentals {
        revenue_growth: Some(growth),
        ev_to_ebitda: Some(ev),
        profit_margins: Some(margin),
        ..CompanyFundamentals::new(symbol)
    }
}

fn rising_history(days: usize) -> Vec<PricePoint> {
    let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    (0..days)
        .map(|i| {
            let close = 100.0 + i as f64;
            PricePoint {
                date: start + Duration::days(i as i64),
                open: close - 0.5,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1_000_000.0,
            }
        })
        .collect()
}

fn revenue_growing_ten_percent() -> RevenueSeries {
    RevenueSeries::new(vec![
        RevenuePoint {
            period_end: NaiveDate::from_ymd_opt(2021, 12, 31).unwrap(),
            total_revenue: 1_000_000.0,
        },
        RevenuePoint {
            period_end: NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
            total_revenue: 1_210_000.0,
        },
    ])
}

fn full_provider() -> InMemoryProvider {
    InMemoryProvider::default()
        .with_company(target_company())
        .with_company(peer("BOLT", 0.15, 12.0, 0.20))
        .with_company(peer("GEAR", 0.02, 25.0, 0.05))
        .with_history("ACME", rising_history(300))
        .with_revenue("ACME", revenue_growing_ten_percent())
}

#[tokio::test]
async fn test_full_report() {
    let orchestrator = ResearchOrchestrator::new(Arc::new(full_provider()), EngineConfig::default());
    let request = ResearchRequest::new("acme").with_peers(PeerSource::Explicit(vec![
        "BOLT".to_string(),
        "GEAR".to_string(),
        "GHOST".to_string(),
    ]));

    let report = orchestrator.run(&request).await.unwrap();
    assert_eq!(report.ticker, "ACME");

    let valuation = report.valuation.ready().expect("valuation computed");
    assert!(valuation.implied.convergence.is_converged());
    assert!((valuation.implied_growth_pct - 8.0).abs() < 0.5);
    assert_eq!(valuation.projected_cash_flows.len(), 10);

    let history = report.historical_growth.ready().expect("cagr computed");
    assert!((history.cagr_pct - 10.0).abs() < 1e-9);
    assert_eq!(report.verdict, ValuationVerdict::Undervalued);

    let technicals = report.technicals.ready().expect("technicals computed");
    assert_eq!(technicals.series.len(), 300);
    assert!(technicals.snapshot.sma_slow.is_some());
    assert_eq!(technicals.snapshot.rsi, Some(100.0));

    // GHOST is unknown to the provider and silently skipped
    let peers = report.peers.ready().expect("peers computed");
    let tickers: Vec<&str> = peers.comparison.records().iter().map(|r| r.ticker.as_str()).collect();
    assert_eq!(tickers, vec!["ACME", "BOLT", "GEAR"]);
    assert_eq!(peers.alternatives.len(), 1);
    assert_eq!(peers.alternatives[0].ticker, "BOLT");

    assert!(report.ownership.insider.is_some());
    assert!(report.ownership.institutional.is_none());
}

#[tokio::test]
async fn test_unknown_ticker_fails_request() {
    let orchestrator = ResearchOrchestrator::new(Arc::new(full_provider()), EngineConfig::default());
    let err = orchestrator.run(&ResearchRequest::new("NOPE")).await.unwrap_err();
    assert!(matches!(err, AnalysisError::MissingData(_)));
}

#[tokio::test]
async fn test_blank_ticker_rejected() {
    let orchestrator = ResearchOrchestrator::new(Arc::new(full_provider()), EngineConfig::default());
    let err = orchestrator.run(&ResearchRequest::new("   ")).await.unwrap_err();
    assert!(matches!(err, AnalysisError::MissingData(_)));
}

#[tokio::test]
async fn test_missing_history_keeps_valuation() {
    let provider = InMemoryProvider::default()
        .with_company(target_company())
        .with_revenue("ACME", revenue_growing_ten_percent());
    let orchestrator = ResearchOrchestrator::new(Arc::new(provider), EngineConfig::default());

    let report = orchestrator.run(&ResearchRequest::new("ACME")).await.unwrap();
    assert!(!report.technicals.is_ready());
    assert!(matches!(report.technicals.error(), Some(AnalysisError::MissingData(_))));
    assert!(report.valuation.is_ready());
    assert_eq!(report.verdict, ValuationVerdict::Undervalued);
}

#[tokio::test]
async fn test_invalid_assumptions_leave_verdict_undetermined() {
    let orchestrator = ResearchOrchestrator::new(Arc::new(full_provider()), EngineConfig::default());
    let request = ResearchRequest::new("ACME").with_assumptions(ValuationAssumptions {
        discount_rate: 0.03,
        terminal_growth_rate: 0.03,
    });

    let report = orchestrator.run(&request).await.unwrap();
    assert!(matches!(
        report.valuation.error(),
        Some(AnalysisError::InvalidAssumption(
            InvalidAssumption::DiscountRateNotAboveTerminalGrowth { .. }
        ))
    ));
    assert!(report.historical_growth.is_ready());
    assert_eq!(report.verdict, ValuationVerdict::Undetermined);
}

#[tokio::test]
async fn test_revenue_provider_failure_isolated() {
    let mut company = target_company();
    company.symbol = "FLAKY".to_string();
    let provider = InMemoryProvider::default()
        .with_company(company)
        .with_history("FLAKY", rising_history(60));
    let provider = BrokenRevenue(provider);
    let orchestrator = ResearchOrchestrator::new(Arc::new(provider), EngineConfig::default());

    let report = orchestrator.run(&ResearchRequest::new("FLAKY")).await.unwrap();
    assert!(matches!(report.historical_growth.error(), Some(AnalysisError::Provider(_))));
    assert!(report
        .historical_growth
        .unavailable_reason()
        .unwrap()
        .contains("upstream timeout"));
    assert!(report.valuation.is_ready());
    assert_eq!(report.verdict, ValuationVerdict::Undetermined);

    let technicals = report.technicals.ready().unwrap();
    assert!(technicals.snapshot.sma_fast.is_some());
    assert!(technicals.snapshot.sma_slow.is_none());
}

struct BrokenRevenue(InMemoryProvider);

#[async_trait]
impl MarketDataProvider for BrokenRevenue {
    async fn fetch_fundamentals(&self, ticker: &str) -> Result<Option<CompanyFundamentals>, AnalysisError> {
        self.0.fetch_fundamentals(ticker).await
    }

    async fn fetch_price_history(&self, ticker: &str, period: HistoryPeriod) -> Result<Vec<PricePoint>, AnalysisError> {
        self.0.fetch_price_history(ticker, period).await
    }

    async fn fetch_revenue_series(&self, ticker: &str) -> Result<RevenueSeries, AnalysisError> {
        Err(AnalysisError::Provider(format!("upstream timeout for {ticker}")))
    }

    async fn fetch_insider_activity(&self, ticker: &str) -> Result<Option<serde_json::Value>, AnalysisError> {
        self.0.fetch_insider_activity(ticker).await
    }

    async fn fetch_institutional_holders(&self, ticker: &str) -> Result<Option<serde_json::Value>, AnalysisError> {
        self.0.fetch_institutional_holders(ticker).await
    }
}

#[tokio::test]
async fn test_failing_peer_skipped() {
    let provider = full_provider().with_company(peer("DOWN", 0.3, 5.0, 0.3)).broken("DOWN");
    let orchestrator = ResearchOrchestrator::new(Arc::new(provider), EngineConfig::default());
    let request = ResearchRequest::new("ACME")
        .with_peers(PeerSource::Explicit(vec!["DOWN".to_string(), "GEAR".to_string()]));

    let report = orchestrator.run(&request).await.unwrap();
    let peers = report.peers.ready().unwrap();
    let tickers: Vec<&str> = peers.comparison.peers().iter().map(|r| r.ticker.as_str()).collect();
    assert_eq!(tickers, vec!["GEAR"]);
}

#[tokio::test]
async fn test_explicit_peers_cleaned_before_limit() {
    let mut config = EngineConfig::default();
    config.peers.max_peers = 2;
    let orchestrator = ResearchOrchestrator::new(Arc::new(full_provider()), config);
    let request = ResearchRequest::new("ACME").with_peers(PeerSource::Explicit(vec![
        "ACME".to_string(),
        "acme".to_string(),
        "BOLT".to_string(),
        "bolt".to_string(),
        " gear ".to_string(),
    ]));

    let report = orchestrator.run(&request).await.unwrap();
    let tickers: Vec<&str> = report
        .peers
        .ready()
        .unwrap()
        .comparison
        .peers()
        .iter()
        .map(|r| r.ticker.as_str())
        .collect();
    assert_eq!(tickers, vec!["BOLT", "GEAR"]);
}

#[tokio::test]
async fn test_discovered_peers() {
    let completion = Arc::new(ScriptedCompletion::new("```json\n[\"bolt\", \"ACME\", \"GEAR\", \"bolt\"]\n```"));
    let orchestrator = ResearchOrchestrator::new(Arc::new(full_provider()), EngineConfig::default())
        .with_completion(completion.clone());
    let request = ResearchRequest::new("ACME").with_peers(PeerSource::Discover);

    let report = orchestrator.run(&request).await.unwrap();
    let tickers: Vec<String> = report
        .peers
        .ready()
        .unwrap()
        .comparison
        .peers()
        .iter()
        .map(|r| r.ticker.clone())
        .collect();
    assert_eq!(tickers, vec!["BOLT", "GEAR"]);

    assert_eq!(completion.call_count(), 1);
    let calls = completion.calls.lock().unwrap();
    assert!(calls[0].1.contains("Acme makes industrial widgets."));
}

#[tokio::test]
async fn test_discovery_without_completion_degrades_to_no_peers() {
    let orchestrator = ResearchOrchestrator::new(Arc::new(full_provider()), EngineConfig::default());
    let request = ResearchRequest::new("ACME").with_peers(PeerSource::Discover);

    let report = orchestrator.run(&request).await.unwrap();
    let peers = report.peers.ready().unwrap();
    assert!(!peers.comparison.has_peers());
    assert_eq!(peers.comparison.target().ticker, "ACME");
}

#[tokio::test]
async fn test_unparseable_discovery_degrades_to_no_peers() {
    let completion = Arc::new(ScriptedCompletion::new("Sorry, I am not sure."));
    let orchestrator = ResearchOrchestrator::new(Arc::new(full_provider()), EngineConfig::default())
        .with_completion(completion);
    let request = ResearchRequest::new("ACME").with_peers(PeerSource::Discover);

    let report = orchestrator.run(&request).await.unwrap();
    assert!(!report.peers.ready().unwrap().comparison.has_peers());
}

#[tokio::test]
async fn test_narration_prompts_and_narrate() {
    let completion = Arc::new(ScriptedCompletion::new("Acme looks fine."));
    let orchestrator = ResearchOrchestrator::new(Arc::new(full_provider()), EngineConfig::default())
        .with_completion(completion.clone());
    let request = ResearchRequest::new("ACME").with_peers(PeerSource::Explicit(vec!["BOLT".to_string()]));
    let report = orchestrator.run(&request).await.unwrap();

    let prompts = orchestrator.narration_prompts(&report).unwrap();
    let tasks: Vec<NarrationTask> = prompts.iter().map(|p| p.task).collect();
    assert_eq!(
        tasks,
        vec![
            NarrationTask::TechnicalMentor,
            NarrationTask::ValuationExplainer,
            NarrationTask::BetterAlternative,
            NarrationTask::RiskAnalysis,
            NarrationTask::OwnershipSummary,
        ]
    );

    let text = orchestrator.narrate(&prompts[0]).await.unwrap();
    assert_eq!(text, "Acme looks fine.");
    assert_eq!(completion.call_count(), 1);
}

#[tokio::test]
async fn test_narrate_without_completion() {
    let orchestrator = ResearchOrchestrator::new(Arc::new(full_provider()), EngineConfig::default());
    let report = orchestrator.run(&ResearchRequest::new("ACME")).await.unwrap();
    let prompts = orchestrator.narration_prompts(&report).unwrap();

    // no peers: the alternative pitch is skipped
    assert!(prompts.iter().all(|p| p.task != NarrationTask::BetterAlternative));

    let err = orchestrator.narrate(&prompts[0]).await.unwrap_err();
    assert!(matches!(err, AnalysisError::Completion(_)));
}
