use analysis_core::{
    AnalysisError, CompanyFundamentals, HistoricalGrowth, ImpliedGrowthResult, ValuationAssumptions,
    ValuationVerdict,
};
use chrono::{DateTime, Utc};
use fundamental_analysis::{AlternativeCandidate, PeerComparison};
use serde::Serialize;
use technical_analysis::{IndicatorSeries, TechnicalSnapshot};

/// One section of a research report: either computed, or the error that prevented it.
///
/// `reason` is the display form of `error`, kept alongside it for renderers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum SectionOutcome<T> {
    Ready(T),
    Unavailable { reason: String, error: AnalysisError },
}

impl<T> SectionOutcome<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            SectionOutcome::Ready(value) => Some(value),
            SectionOutcome::Unavailable { .. } => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, SectionOutcome::Ready(_))
    }

    pub fn unavailable_reason(&self) -> Option<&str> {
        match self {
            SectionOutcome::Ready(_) => None,
            SectionOutcome::Unavailable { reason, .. } => Some(reason),
        }
    }

    pub fn error(&self) -> Option<&AnalysisError> {
        match self {
            SectionOutcome::Ready(_) => None,
            SectionOutcome::Unavailable { error, .. } => Some(error),
        }
    }
}

impl<T> From<Result<T, AnalysisError>> for SectionOutcome<T> {
    fn from(result: Result<T, AnalysisError>) -> Self {
        match result {
            Ok(value) => SectionOutcome::Ready(value),
            Err(error) => SectionOutcome::Unavailable {
                reason: error.to_string(),
                error,
            },
        }
    }
}

/// Reverse-DCF outcome plus the cash flows it implies
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValuationSummary {
    pub implied: ImpliedGrowthResult,
    pub implied_growth_pct: f64,
    /// Yearly free cash flow projected at the implied growth rate
    pub projected_cash_flows: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TechnicalSummary {
    pub series: IndicatorSeries,
    pub snapshot: TechnicalSnapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeerSummary {
    pub comparison: PeerComparison,
    pub alternatives: Vec<AlternativeCandidate>,
}

/// Opaque ownership tables passed through to narration
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OwnershipActivity {
    pub insider: Option<serde_json::Value>,
    pub institutional: Option<serde_json::Value>,
}

/// Everything one analysis request produces
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResearchReport {
    pub ticker: String,
    pub generated_at: DateTime<Utc>,
    pub assumptions: ValuationAssumptions,
    pub fundamentals: CompanyFundamentals,
    pub valuation: SectionOutcome<ValuationSummary>,
    pub historical_growth: SectionOutcome<HistoricalGrowth>,
    pub verdict: ValuationVerdict,
    pub technicals: SectionOutcome<TechnicalSummary>,
    pub peers: SectionOutcome<PeerSummary>,
    pub ownership: OwnershipActivity,
}
