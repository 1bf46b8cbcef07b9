use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::pipeline::IndicatorPoint;

const OVERBOUGHT_RSI: f64 = 70.0;
const OVERSOLD_RSI: f64 = 30.0;

/// Price position relative to the moving averages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    /// Above every available moving average
    Bullish,
    /// Below every available moving average
    Bearish,
    Mixed,
    Undetermined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Momentum {
    Overbought,
    Oversold,
    Neutral,
    Undetermined,
}

/// Latest indicator readings, as handed to the technical narration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalSnapshot {
    pub date: NaiveDate,
    pub price: f64,
    pub sma_fast: Option<f64>,
    pub sma_slow: Option<f64>,
    pub rsi: Option<f64>,
    pub trend: Trend,
    pub momentum: Momentum,
}

impl TechnicalSnapshot {
    pub fn from_point(point: &IndicatorPoint) -> Self {
        Self {
            date: point.date,
            price: point.close,
            sma_fast: point.sma_fast,
            sma_slow: point.sma_slow,
            rsi: point.rsi,
            trend: classify_trend(point.close, point.sma_fast, point.sma_slow),
            momentum: classify_momentum(point.rsi),
        }
    }
}

fn classify_trend(price: f64, sma_fast: Option<f64>, sma_slow: Option<f64>) -> Trend {
    let averages: Vec<f64> = [sma_fast, sma_slow].into_iter().flatten().collect();
    if averages.is_empty() {
        return Trend::Undetermined;
    }
    if averages.iter().all(|&ma| price > ma) {
        Trend::Bullish
    } else if averages.iter().all(|&ma| price < ma) {
        Trend::Bearish
    } else {
        Trend::Mixed
    }
}

fn classify_momentum(rsi: Option<f64>) -> Momentum {
    match rsi {
        Some(r) if r > OVERBOUGHT_RSI => Momentum::Overbought,
        Some(r) if r < OVERSOLD_RSI => Momentum::Oversold,
        Some(_) => Momentum::Neutral,
        None => Momentum::Undetermined,
    }
}
