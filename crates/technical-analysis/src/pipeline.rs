use analysis_core::{AnalysisError, IndicatorConfig, PricePoint};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::indicators::{rsi, sma};
use crate::snapshot::TechnicalSnapshot;

/// Indicator values for one price point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub close: f64,
    pub sma_fast: Option<f64>,
    pub sma_slow: Option<f64>,
    pub rsi: Option<f64>,
}

/// Indicator values aligned one-to-one with a price history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSeries {
    pub config: IndicatorConfig,
    pub points: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn latest(&self) -> Option<&IndicatorPoint> {
        self.points.last()
    }

    /// Latest values in the shape the narration layer consumes
    pub fn snapshot(&self) -> Option<TechnicalSnapshot> {
        self.latest().map(TechnicalSnapshot::from_point)
    }
}

/// Computes moving averages and RSI from a daily price history
#[derive(Debug, Clone, Default)]
pub struct IndicatorPipeline {
    config: IndicatorConfig,
}

impl IndicatorPipeline {
    pub fn new(config: IndicatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &IndicatorConfig {
        &self.config
    }

    pub fn compute(&self, history: &[PricePoint]) -> Result<IndicatorSeries, AnalysisError> {
        if history.is_empty() {
            return Err(AnalysisError::MissingData("price history is empty".to_string()));
        }
        if self.config.sma_fast_window == 0 || self.config.sma_slow_window == 0 || self.config.rsi_period == 0 {
            return Err(AnalysisError::InvalidData(
                "indicator windows must be at least 1".to_string(),
            ));
        }
        validate_history(history)?;

        let closes: Vec<f64> = history.iter().map(|p| p.close).collect();
        let sma_fast = sma(&closes, self.config.sma_fast_window);
        let sma_slow = sma(&closes, self.config.sma_slow_window);
        let rsi_values = rsi(&closes, self.config.rsi_period);

        let points = history
            .iter()
            .enumerate()
            .map(|(i, p)| IndicatorPoint {
                date: p.date,
                close: p.close,
                sma_fast: sma_fast[i],
                sma_slow: sma_slow[i],
                rsi: rsi_values[i],
            })
            .collect();

        Ok(IndicatorSeries {
            config: self.config,
            points,
        })
    }
}

fn validate_history(history: &[PricePoint]) -> Result<(), AnalysisError> {
    if let Some(bad) = history.iter().find(|p| !p.close.is_finite()) {
        return Err(AnalysisError::InvalidData(format!(
            "non-finite close on {}",
            bad.date
        )));
    }
    if let Some(w) = history.windows(2).find(|w| w[1].date <= w[0].date) {
        return Err(AnalysisError::InvalidData(format!(
            "price history not strictly ascending at {} -> {}",
            w[0].date, w[1].date
        )));
    }
    Ok(())
}
