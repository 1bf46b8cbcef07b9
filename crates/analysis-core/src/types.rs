use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily OHLCV price point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Lookback window requested from the market-data provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HistoryPeriod {
    SixMonths,
    #[default]
    OneYear,
    TwoYears,
    FiveYears,
}

impl HistoryPeriod {
    pub fn to_days(&self) -> i64 {
        match self {
            HistoryPeriod::SixMonths => 182,
            HistoryPeriod::OneYear => 365,
            HistoryPeriod::TwoYears => 730,
            HistoryPeriod::FiveYears => 1826,
        }
    }
}

/// Point-in-time company fundamentals as reported by the market-data provider.
///
/// Every numeric field is optional: providers routinely omit metrics for
/// young companies, ADRs and funds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyFundamentals {
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub long_name: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub trailing_pe: Option<f64>,
    #[serde(default)]
    pub forward_pe: Option<f64>,
    #[serde(default)]
    pub ev_to_ebitda: Option<f64>,
    #[serde(default)]
    pub beta: Option<f64>,
    #[serde(default)]
    pub fifty_two_week_high: Option<f64>,
    #[serde(default)]
    pub fifty_two_week_low: Option<f64>,
    #[serde(default)]
    pub average_volume: Option<f64>,
    /// Net profit margin as a fraction (0.25 = 25%)
    #[serde(default)]
    pub profit_margins: Option<f64>,
    #[serde(default)]
    pub operating_margins: Option<f64>,
    /// Year-over-year revenue growth as a fraction
    #[serde(default)]
    pub revenue_growth: Option<f64>,
    #[serde(default)]
    pub earnings_growth: Option<f64>,
    #[serde(default)]
    pub debt_to_equity: Option<f64>,
    #[serde(default)]
    pub free_cash_flow: Option<f64>,
    #[serde(default)]
    pub shares_outstanding: Option<f64>,
    #[serde(default)]
    pub long_business_summary: Option<String>,
}

impl CompanyFundamentals {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Default::default()
        }
    }

    /// Display name, falling back to the ticker
    pub fn display_name(&self) -> &str {
        self.long_name.as_deref().unwrap_or(&self.symbol)
    }

    pub fn business_summary(&self) -> &str {
        self.long_business_summary
            .as_deref()
            .unwrap_or("No description available.")
    }
}

/// One reported revenue figure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenuePoint {
    pub period_end: NaiveDate,
    pub total_revenue: f64,
}

/// Multi-period revenue history, one point per fiscal period
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RevenueSeries {
    pub points: Vec<RevenuePoint>,
}

impl RevenueSeries {
    pub fn new(points: Vec<RevenuePoint>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// User-adjustable valuation assumptions for a single request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValuationAssumptions {
    pub discount_rate: f64,
    pub terminal_growth_rate: f64,
}

impl Default for ValuationAssumptions {
    fn default() -> Self {
        Self {
            discount_rate: 0.10,
            terminal_growth_rate: 0.03,
        }
    }
}

/// Inputs to the reverse-DCF solver
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValuationInputs {
    pub current_price: Option<f64>,
    pub free_cash_flow: Option<f64>,
    pub shares_outstanding: Option<f64>,
    pub discount_rate: f64,
    pub terminal_growth_rate: f64,
}

impl ValuationInputs {
    pub fn from_fundamentals(fundamentals: &CompanyFundamentals, assumptions: ValuationAssumptions) -> Self {
        Self {
            current_price: fundamentals.current_price,
            free_cash_flow: fundamentals.free_cash_flow,
            shares_outstanding: fundamentals.shares_outstanding,
            discount_rate: assumptions.discount_rate,
            terminal_growth_rate: assumptions.terminal_growth_rate,
        }
    }
}

/// Whether the solver met its tolerance before running out of iterations
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConvergenceStatus {
    Converged,
    /// Iteration budget exhausted; the best midpoint is still returned.
    IterationLimit { relative_gap: f64 },
}

impl ConvergenceStatus {
    pub fn is_converged(&self) -> bool {
        matches!(self, ConvergenceStatus::Converged)
    }
}

/// Growth rate the market is implicitly pricing in
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpliedGrowthResult {
    /// Fractional annual growth rate (0.08 = 8%)
    pub growth_rate: f64,
    pub iterations: u32,
    pub convergence: ConvergenceStatus,
}

impl ImpliedGrowthResult {
    pub fn growth_pct(&self) -> f64 {
        self.growth_rate * 100.0
    }
}

/// Historical compound annual revenue growth
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoricalGrowth {
    pub cagr_pct: f64,
    pub periods: u32,
}

/// Implied growth compared against the company's own track record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValuationVerdict {
    /// Market expects less growth than the company has delivered
    Undervalued,
    /// Market expects at least as much growth as the company has delivered
    Overvalued,
    Undetermined,
}

impl ValuationVerdict {
    pub fn to_label(&self) -> &'static str {
        match self {
            ValuationVerdict::Undervalued => "Undervalued",
            ValuationVerdict::Overvalued => "Overvalued",
            ValuationVerdict::Undetermined => "Undetermined",
        }
    }
}

/// Role of an entity in the peer comparison table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeerRole {
    Target,
    Peer,
}

/// Which metrics were actually reported, as opposed to defaulted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataCompleteness {
    pub revenue_growth_reported: bool,
    pub ev_to_ebitda_reported: bool,
    pub net_margin_reported: bool,
}

impl DataCompleteness {
    pub fn is_complete(&self) -> bool {
        self.revenue_growth_reported && self.ev_to_ebitda_reported && self.net_margin_reported
    }
}

/// Uniform comparison record for the target or one of its peers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerMetricRecord {
    pub ticker: String,
    pub revenue_growth_pct: f64,
    pub ev_to_ebitda: Option<f64>,
    /// Signed net margin as a fraction
    pub net_margin: f64,
    /// Non-negative marker size for charts; never used for ranking
    pub magnitude: f64,
    pub role: PeerRole,
    pub completeness: DataCompleteness,
}
