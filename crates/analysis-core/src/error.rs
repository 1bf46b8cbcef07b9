use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Assumption combinations that make the DCF model mathematically undefined
#[derive(Error, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InvalidAssumption {
    #[error("discount rate {discount_rate} must exceed terminal growth rate {terminal_growth_rate}")]
    DiscountRateNotAboveTerminalGrowth {
        discount_rate: f64,
        terminal_growth_rate: f64,
    },

    #[error("free cash flow must be positive, got {free_cash_flow}")]
    NonPositiveFreeCashFlow { free_cash_flow: f64 },
}

/// Serialized as `{"kind": ..., "detail": ...}` so report consumers can branch on the kind
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum AnalysisError {
    #[error("Missing data: {0}")]
    MissingData(String),

    #[error("Invalid assumption: {0}")]
    InvalidAssumption(#[from] InvalidAssumption),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Market data provider error: {0}")]
    Provider(String),

    #[error("Text completion error: {0}")]
    Completion(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for AnalysisError {
    fn from(err: serde_json::Error) -> Self {
        AnalysisError::Serialization(err.to_string())
    }
}

/// Treats absent, non-finite and zero values as missing.
pub fn require_present(value: Option<f64>, field: &str) -> Result<f64, AnalysisError> {
    match value {
        Some(v) if v.is_finite() && v != 0.0 => Ok(v),
        _ => Err(AnalysisError::MissingData(field.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_present() {
        assert_eq!(require_present(Some(2.5), "price"), Ok(2.5));
        assert_eq!(
            require_present(None, "price"),
            Err(AnalysisError::MissingData("price".to_string()))
        );
        assert!(require_present(Some(f64::NAN), "price").is_err());
        assert!(require_present(Some(0.0), "price").is_err());
        assert_eq!(require_present(Some(-1.0), "price"), Ok(-1.0));
    }

    #[test]
    fn test_invalid_assumption_converts() {
        let err: AnalysisError = InvalidAssumption::NonPositiveFreeCashFlow { free_cash_flow: -5.0 }.into();
        assert!(matches!(
            err,
            AnalysisError::InvalidAssumption(InvalidAssumption::NonPositiveFreeCashFlow { .. })
        ));
        assert!(err.to_string().contains("free cash flow"));
    }

    #[test]
    fn test_error_serializes_with_kind() {
        let missing = AnalysisError::MissingData("current_price".to_string());
        assert_eq!(
            serde_json::to_value(&missing).unwrap(),
            serde_json::json!({"kind": "missing_data", "detail": "current_price"})
        );

        let assumption: AnalysisError = InvalidAssumption::DiscountRateNotAboveTerminalGrowth {
            discount_rate: 0.03,
            terminal_growth_rate: 0.05,
        }
        .into();
        let value = serde_json::to_value(&assumption).unwrap();
        assert_eq!(value["kind"], "invalid_assumption");
        assert_eq!(value["detail"]["kind"], "discount_rate_not_above_terminal_growth");
        assert_eq!(value["detail"]["terminal_growth_rate"], 0.05);

        let back: AnalysisError = serde_json::from_value(value).unwrap();
        assert_eq!(back, assumption);
    }
}
