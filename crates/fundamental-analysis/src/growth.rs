use analysis_core::{AnalysisError, HistoricalGrowth, ImpliedGrowthResult, RevenueSeries, ValuationVerdict};

/// Average length of one reporting period (a fiscal year)
const DAYS_PER_PERIOD: f64 = 365.25;

/// Historical revenue CAGR from a multi-period revenue series
#[derive(Debug, Clone, Copy, Default)]
pub struct GrowthEstimator;

impl GrowthEstimator {
    pub fn new() -> Self {
        Self
    }

    /// Compound annual growth between the earliest and latest revenue figure.
    ///
    /// The span is measured in whole periods between the two period-end
    /// dates, so a gap year counts even when its figure is not reported.
    pub fn cagr(&self, series: &RevenueSeries) -> Result<HistoricalGrowth, AnalysisError> {
        if series.len() < 2 {
            return Err(AnalysisError::InsufficientData(format!(
                "CAGR needs at least 2 revenue points, got {}",
                series.len()
            )));
        }

        let mut points = series.points.clone();
        points.sort_by_key(|p| p.period_end);

        if points.windows(2).any(|w| w[0].period_end == w[1].period_end) {
            return Err(AnalysisError::InvalidData(
                "duplicate revenue period end dates".to_string(),
            ));
        }
        if let Some(bad) = points.iter().find(|p| !p.total_revenue.is_finite()) {
            return Err(AnalysisError::InvalidData(format!(
                "non-finite revenue for period ending {}",
                bad.period_end
            )));
        }

        let (first, last) = match (points.first(), points.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(AnalysisError::InsufficientData("empty revenue series".to_string())),
        };

        if first.total_revenue <= 0.0 {
            return Err(AnalysisError::InvalidData(format!(
                "starting revenue must be positive, got {}",
                first.total_revenue
            )));
        }
        if last.total_revenue < 0.0 {
            return Err(AnalysisError::InvalidData(format!(
                "ending revenue is negative: {}",
                last.total_revenue
            )));
        }

        let days = (last.period_end - first.period_end).num_days() as f64;
        let periods = (days / DAYS_PER_PERIOD).round();
        if periods <= 0.0 {
            return Err(AnalysisError::InvalidData(format!(
                "revenue series spans less than one period ({} to {})",
                first.period_end, last.period_end
            )));
        }

        let cagr = (last.total_revenue / first.total_revenue).powf(1.0 / periods) - 1.0;

        Ok(HistoricalGrowth {
            cagr_pct: cagr * 100.0,
            periods: periods as u32,
        })
    }
}

/// Compares the growth the market implies with what the company has delivered.
pub fn valuation_verdict(implied: &ImpliedGrowthResult, historical: Option<&HistoricalGrowth>) -> ValuationVerdict {
    match historical {
        Some(h) if implied.growth_pct() < h.cagr_pct => ValuationVerdict::Undervalued,
        Some(_) => ValuationVerdict::Overvalued,
        None => ValuationVerdict::Undetermined,
    }
}
