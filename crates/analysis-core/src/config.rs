use crate::AnalysisError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Rolling-window sizes for the indicator pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorConfig {
    pub sma_fast_window: usize,  // 50
    pub sma_slow_window: usize,  // 200
    pub rsi_period: usize,       // 14
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            sma_fast_window: 50,
            sma_slow_window: 200,
            rsi_period: 14,
        }
    }
}

/// Projection and root-finding parameters for the reverse DCF
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DcfConfig {
    pub projection_years: u32,    // 10
    pub growth_lower_bound: f64,  // -50%
    pub growth_upper_bound: f64,  // +100%
    pub max_iterations: u32,      // 100
    /// Relative tolerance on the valuation gap
    pub tolerance: f64,           // 0.1%
}

impl Default for DcfConfig {
    fn default() -> Self {
        Self {
            projection_years: 10,
            growth_lower_bound: -0.50,
            growth_upper_bound: 1.00,
            max_iterations: 100,
            tolerance: 0.001,
        }
    }
}

/// Peer table construction parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeerConfig {
    /// Marker size used when a net margin is exactly zero
    pub magnitude_floor: f64,
    pub max_peers: usize,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            magnitude_floor: 0.01,
            max_peers: 7,
        }
    }
}

/// Engine-wide configuration, passed explicitly into every component
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub indicators: IndicatorConfig,
    pub dcf: DcfConfig,
    pub peers: PeerConfig,
}

impl EngineConfig {
    /// Build from process environment variables, defaulting anything unset.
    pub fn from_env() -> Result<Self, AnalysisError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (environment, test map, ...).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AnalysisError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            indicators: IndicatorConfig {
                sma_fast_window: parse_or(&lookup, "SMA_FAST_WINDOW", defaults.indicators.sma_fast_window)?,
                sma_slow_window: parse_or(&lookup, "SMA_SLOW_WINDOW", defaults.indicators.sma_slow_window)?,
                rsi_period: parse_or(&lookup, "RSI_PERIOD", defaults.indicators.rsi_period)?,
            },
            dcf: DcfConfig {
                max_iterations: parse_or(&lookup, "DCF_MAX_ITERATIONS", defaults.dcf.max_iterations)?,
                tolerance: parse_or(&lookup, "DCF_TOLERANCE", defaults.dcf.tolerance)?,
                ..defaults.dcf
            },
            peers: PeerConfig {
                magnitude_floor: parse_or(&lookup, "PEER_MAGNITUDE_FLOOR", defaults.peers.magnitude_floor)?,
                max_peers: parse_or(&lookup, "MAX_PEERS", defaults.peers.max_peers)?,
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        let ind = &self.indicators;
        if ind.sma_fast_window == 0 || ind.sma_slow_window == 0 || ind.rsi_period == 0 {
            return Err(AnalysisError::InvalidData(
                "indicator windows must be at least 1".to_string(),
            ));
        }

        let dcf = &self.dcf;
        if dcf.projection_years == 0 || dcf.max_iterations == 0 {
            return Err(AnalysisError::InvalidData(
                "DCF horizon and iteration budget must be at least 1".to_string(),
            ));
        }
        if !(dcf.growth_lower_bound < dcf.growth_upper_bound) || dcf.growth_lower_bound <= -1.0 {
            return Err(AnalysisError::InvalidData(format!(
                "invalid growth bracket [{}, {}]",
                dcf.growth_lower_bound, dcf.growth_upper_bound
            )));
        }
        if !(dcf.tolerance > 0.0 && dcf.tolerance.is_finite()) {
            return Err(AnalysisError::InvalidData(format!(
                "DCF tolerance must be positive, got {}",
                dcf.tolerance
            )));
        }

        if !(self.peers.magnitude_floor > 0.0 && self.peers.magnitude_floor.is_finite()) {
            return Err(AnalysisError::InvalidData(format!(
                "magnitude floor must be positive, got {}",
                self.peers.magnitude_floor
            )));
        }
        Ok(())
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T, AnalysisError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AnalysisError::InvalidData(format!("{key}: cannot parse {raw:?}"))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = EngineConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.indicators.sma_fast_window, 50);
        assert_eq!(config.indicators.sma_slow_window, 200);
        assert_eq!(config.dcf.max_iterations, 100);
    }

    #[test]
    fn test_overrides() {
        let config = EngineConfig::from_lookup(lookup_from(&[
            ("SMA_FAST_WINDOW", "20"),
            ("RSI_PERIOD", " 9 "),
            ("DCF_TOLERANCE", "0.0005"),
            ("MAX_PEERS", "3"),
        ]))
        .unwrap();
        assert_eq!(config.indicators.sma_fast_window, 20);
        assert_eq!(config.indicators.rsi_period, 9);
        assert!((config.dcf.tolerance - 0.0005).abs() < 1e-12);
        assert_eq!(config.peers.max_peers, 3);
    }

    #[test]
    fn test_unparseable_value_rejected() {
        let err = EngineConfig::from_lookup(lookup_from(&[("RSI_PERIOD", "fourteen")])).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidData(_)));
    }

    #[test]
    fn test_zero_window_rejected() {
        let err = EngineConfig::from_lookup(lookup_from(&[("SMA_SLOW_WINDOW", "0")])).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidData(_)));
    }

    #[test]
    fn test_inverted_bracket_rejected() {
        let mut config = EngineConfig::default();
        config.dcf.growth_lower_bound = 0.5;
        config.dcf.growth_upper_bound = 0.1;
        assert!(config.validate().is_err());
    }
}
