//! Prompt construction for the narration service.
//!
//! Every prompt embeds fully computed numbers; the completion service only
//! turns them into prose. Nothing it returns is parsed except the
//! competitor list (see `competitors`).

use analysis_core::{AnalysisError, HistoricalGrowth, IndicatorConfig, ValuationAssumptions, ValuationVerdict};
use fundamental_analysis::{AlternativeCandidate, PeerComparison};
use serde::Serialize;
use technical_analysis::TechnicalSnapshot;

use crate::report::{ResearchReport, ValuationSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NarrationTask {
    CompetitorDiscovery,
    TechnicalMentor,
    ValuationExplainer,
    BetterAlternative,
    RiskAnalysis,
    OwnershipSummary,
}

impl NarrationTask {
    pub fn to_label(&self) -> &'static str {
        match self {
            NarrationTask::CompetitorDiscovery => "Competitor Discovery",
            NarrationTask::TechnicalMentor => "Technical Mentor",
            NarrationTask::ValuationExplainer => "Valuation Explainer",
            NarrationTask::BetterAlternative => "Better Alternative",
            NarrationTask::RiskAnalysis => "Risk Analysis",
            NarrationTask::OwnershipSummary => "Ownership Summary",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NarrationPrompt {
    pub task: NarrationTask,
    pub system: String,
    pub user: String,
}

/// Structured valuation numbers handed to the narrator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValuationPayload {
    pub ticker: String,
    pub implied_growth_pct: f64,
    pub converged: bool,
    pub iterations: u32,
    pub historical_cagr_pct: Option<f64>,
    pub verdict: ValuationVerdict,
    pub discount_rate_pct: f64,
    pub terminal_growth_pct: f64,
}

impl ValuationPayload {
    pub fn new(
        ticker: &str,
        summary: &ValuationSummary,
        historical: Option<&HistoricalGrowth>,
        verdict: ValuationVerdict,
        assumptions: ValuationAssumptions,
    ) -> Self {
        Self {
            ticker: ticker.to_string(),
            implied_growth_pct: summary.implied_growth_pct,
            converged: summary.implied.convergence.is_converged(),
            iterations: summary.implied.iterations,
            historical_cagr_pct: historical.map(|h| h.cagr_pct),
            verdict,
            discount_rate_pct: assumptions.discount_rate * 100.0,
            terminal_growth_pct: assumptions.terminal_growth_rate * 100.0,
        }
    }
}

pub fn competitor_discovery_prompt(ticker: &str, business_summary: &str, max_peers: usize) -> NarrationPrompt {
    NarrationPrompt {
        task: NarrationTask::CompetitorDiscovery,
        system: "You are an equity research analyst who identifies the publicly traded companies \
                 that compete most directly with a given business."
            .to_string(),
        user: format!(
            "Business summary for {ticker}:\n\"{business_summary}\"\n\n\
             List up to {max_peers} publicly traded direct competitors in the same niche, \
             with a similar business model rather than merely the same sector.\n\
             Answer with a JSON array of ticker symbols only, for example [\"AAA\", \"BBB\"]. \
             No markdown, no commentary."
        ),
    }
}

/// Window labels come from the config the snapshot was computed with
pub fn technical_mentor_prompt(ticker: &str, snapshot: &TechnicalSnapshot, windows: &IndicatorConfig) -> NarrationPrompt {
    NarrationPrompt {
        task: NarrationTask::TechnicalMentor,
        system: "You are a patient trading mentor. Explain chart indicators to a beginner in plain English."
            .to_string(),
        user: format!(
            "Technical readings for {ticker} as of {date}:\n\
             - Price: {price:.2}\n\
             - {fast_window}-day SMA: {fast}\n\
             - {slow_window}-day SMA: {slow}\n\
             - {rsi_period}-day RSI: {rsi}\n\
             - Trend: {trend:?}\n\
             - Momentum: {momentum:?}\n\n\
             Explain what these readings say about trend (price versus the averages) and \
             momentum (RSI above 70 is overbought, below 30 oversold), and what a beginner \
             should watch next. Stay under 100 words.",
            date = snapshot.date,
            price = snapshot.price,
            fast_window = windows.sma_fast_window,
            slow_window = windows.sma_slow_window,
            rsi_period = windows.rsi_period,
            fast = fmt_optional(snapshot.sma_fast),
            slow = fmt_optional(snapshot.sma_slow),
            rsi = fmt_optional(snapshot.rsi),
            trend = snapshot.trend,
            momentum = snapshot.momentum,
        ),
    }
}

pub fn valuation_explainer_prompt(payload: &ValuationPayload) -> Result<NarrationPrompt, AnalysisError> {
    let data = serde_json::to_string_pretty(payload)?;
    Ok(NarrationPrompt {
        task: NarrationTask::ValuationExplainer,
        system: "You are a valuation coach who explains reverse discounted-cash-flow results to retail investors."
            .to_string(),
        user: format!(
            "Reverse DCF results for {ticker}:\n{data}\n\n\
             Explain what growth the market price implies over the next ten years, how it \
             compares with the company's historical revenue growth, and what the verdict \
             means. If `converged` is false, say the estimate is low-confidence. \
             Stay under 120 words.",
            ticker = payload.ticker,
        ),
    })
}

pub fn better_alternative_prompt(
    ticker: &str,
    comparison: &PeerComparison,
    candidates: &[AlternativeCandidate],
) -> Result<NarrationPrompt, AnalysisError> {
    let target = serde_json::to_string_pretty(comparison.target())?;
    let peers = serde_json::to_string_pretty(comparison.peers())?;
    let ranked = serde_json::to_string_pretty(candidates)?;

    Ok(NarrationPrompt {
        task: NarrationTask::BetterAlternative,
        system: "You are a portfolio manager hunting for better risk-adjusted ideas.".to_string(),
        user: format!(
            "I hold {ticker}. Its metrics:\n{target}\n\n\
             Peer metrics:\n{peers}\n\n\
             Peers that beat {ticker} on at least two of growth, EV/EBITDA and net margin, \
             strongest first:\n{ranked}\n\n\
             Fields flagged as not reported in `completeness` were defaulted and must not be \
             treated as real values. If a clearly superior alternative exists, pitch the \
             switch in under 100 words, then add a section \"Why this matters for beginners:\" \
             explaining the deciding metric simply. If none exists, answer \
             \"HOLD: {ticker} remains the best in class.\" and explain why."
        ),
    })
}

pub fn risk_analysis_prompt(ticker: &str, business_summary: &str) -> NarrationPrompt {
    NarrationPrompt {
        task: NarrationTask::RiskAnalysis,
        system: "You are a risk manager. Identify the three most material risks for a business.".to_string(),
        user: format!(
            "Business summary for {ticker}:\n\"{business_summary}\"\n\n\
             List the three biggest company-specific risks an investor should know about \
             (for example regulation, competition, supply chain)."
        ),
    }
}

pub fn ownership_summary_prompt(
    ticker: &str,
    insider: Option<&serde_json::Value>,
    institutional: Option<&serde_json::Value>,
) -> Result<NarrationPrompt, AnalysisError> {
    let insider = match insider {
        Some(table) => serde_json::to_string_pretty(table)?,
        None => "No data".to_string(),
    };
    let institutional = match institutional {
        Some(table) => serde_json::to_string_pretty(table)?,
        None => "No data".to_string(),
    };

    Ok(NarrationPrompt {
        task: NarrationTask::OwnershipSummary,
        system: "You are a concise financial news editor. Summarize in three bullet points, 50 words at most."
            .to_string(),
        user: format!(
            "Ticker: {ticker}\n\nRecent insider transactions:\n{insider}\n\n\
             Top institutional holders:\n{institutional}\n\n\
             Is insider sentiment buying or selling, and who are the key holders?"
        ),
    })
}

/// Every prompt the report has enough data for
pub fn report_prompts(report: &ResearchReport) -> Result<Vec<NarrationPrompt>, AnalysisError> {
    let ticker = report.ticker.as_str();
    let summary = report.fundamentals.business_summary();
    let mut prompts = Vec::new();

    if let Some(technicals) = report.technicals.ready() {
        prompts.push(technical_mentor_prompt(ticker, &technicals.snapshot, &technicals.series.config));
    }

    if let Some(valuation) = report.valuation.ready() {
        let payload = ValuationPayload::new(
            ticker,
            valuation,
            report.historical_growth.ready(),
            report.verdict,
            report.assumptions,
        );
        prompts.push(valuation_explainer_prompt(&payload)?);
    }

    if let Some(peers) = report.peers.ready() {
        if peers.comparison.has_peers() {
            prompts.push(better_alternative_prompt(ticker, &peers.comparison, &peers.alternatives)?);
        }
    }

    prompts.push(risk_analysis_prompt(ticker, summary));
    prompts.push(ownership_summary_prompt(
        ticker,
        report.ownership.insider.as_ref(),
        report.ownership.institutional.as_ref(),
    )?);

    Ok(prompts)
}

fn fmt_optional(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a (not enough history)".to_string(), |v| format!("{v:.2}"))
}
