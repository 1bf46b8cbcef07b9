use analysis_core::{
    require_present, AnalysisError, ConvergenceStatus, DcfConfig, ImpliedGrowthResult, InvalidAssumption,
    ValuationInputs,
};
use tracing::{debug, trace, warn};

/// Back-solves the growth rate implied by the current market price.
///
/// The model projects free cash flow for `projection_years` at a constant
/// growth rate, discounts each year, and adds a Gordon-growth terminal value
/// discounted from the final year. Bisection over the configured growth
/// bracket finds the rate whose total value matches market capitalisation.
#[derive(Debug, Clone, Default)]
pub struct ReverseDcfSolver {
    config: DcfConfig,
}

impl ReverseDcfSolver {
    pub fn new(config: DcfConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DcfConfig {
        &self.config
    }

    /// Total (not per-share) present value of the firm's free cash flows
    /// growing at `growth_rate` over the projection horizon.
    pub fn dcf_value(&self, free_cash_flow: f64, growth_rate: f64, discount_rate: f64, terminal_growth_rate: f64) -> f64 {
        let years = self.config.projection_years as i32;
        let mut total_value = 0.0;
        let mut current_fcf = free_cash_flow;

        for year in 1..=years {
            current_fcf *= 1.0 + growth_rate;
            total_value += current_fcf / (1.0 + discount_rate).powi(year);
        }

        let terminal_value = current_fcf * (1.0 + terminal_growth_rate) / (discount_rate - terminal_growth_rate);
        total_value + terminal_value / (1.0 + discount_rate).powi(years)
    }

    pub fn solve(&self, inputs: &ValuationInputs) -> Result<ImpliedGrowthResult, AnalysisError> {
        let (free_cash_flow, target_value) = self.check_preconditions(inputs)?;
        let discount_rate = inputs.discount_rate;
        let terminal_growth_rate = inputs.terminal_growth_rate;

        let mut low = self.config.growth_lower_bound;
        let mut high = self.config.growth_upper_bound;
        let mut best_mid = (low + high) / 2.0;
        let mut best_gap = f64::INFINITY;

        for iteration in 1..=self.config.max_iterations {
            let mid = (low + high) / 2.0;
            let value = self.dcf_value(free_cash_flow, mid, discount_rate, terminal_growth_rate);
            let gap = (value - target_value).abs();
            trace!(iteration, growth = mid, gap, "reverse DCF step");

            if gap < best_gap {
                best_gap = gap;
                best_mid = mid;
            }

            if gap < target_value * self.config.tolerance {
                debug!(iterations = iteration, growth = mid, "reverse DCF converged");
                return Ok(ImpliedGrowthResult {
                    growth_rate: mid,
                    iterations: iteration,
                    convergence: ConvergenceStatus::Converged,
                });
            }

            if value > target_value {
                high = mid;
            } else {
                low = mid;
            }
        }

        let relative_gap = best_gap / target_value;
        warn!(
            growth = best_mid,
            relative_gap,
            max_iterations = self.config.max_iterations,
            "reverse DCF did not reach tolerance, returning best midpoint"
        );
        Ok(ImpliedGrowthResult {
            growth_rate: best_mid,
            iterations: self.config.max_iterations,
            convergence: ConvergenceStatus::IterationLimit { relative_gap },
        })
    }

    /// Returns `(free_cash_flow, market_cap)` once every input is usable.
    fn check_preconditions(&self, inputs: &ValuationInputs) -> Result<(f64, f64), AnalysisError> {
        let price = require_present(inputs.current_price, "current_price")?;
        let free_cash_flow = match inputs.free_cash_flow {
            Some(v) if v.is_finite() => v,
            _ => return Err(AnalysisError::MissingData("free_cash_flow".to_string())),
        };
        let shares = require_present(inputs.shares_outstanding, "shares_outstanding")?;

        if price < 0.0 {
            return Err(AnalysisError::InvalidData(format!("current price is negative: {price}")));
        }
        if shares < 0.0 {
            return Err(AnalysisError::InvalidData(format!("shares outstanding is negative: {shares}")));
        }
        if !inputs.discount_rate.is_finite() || !inputs.terminal_growth_rate.is_finite() {
            return Err(AnalysisError::InvalidData("valuation rates must be finite".to_string()));
        }
        if inputs.discount_rate <= -1.0 {
            return Err(AnalysisError::InvalidData(format!(
                "discount rate {} would discount by a non-positive factor",
                inputs.discount_rate
            )));
        }

        if free_cash_flow <= 0.0 {
            return Err(InvalidAssumption::NonPositiveFreeCashFlow { free_cash_flow }.into());
        }
        if inputs.discount_rate <= inputs.terminal_growth_rate {
            return Err(InvalidAssumption::DiscountRateNotAboveTerminalGrowth {
                discount_rate: inputs.discount_rate,
                terminal_growth_rate: inputs.terminal_growth_rate,
            }
            .into());
        }

        let market_cap = price * shares;
        if !market_cap.is_finite() {
            return Err(AnalysisError::InvalidData(format!(
                "market capitalisation overflows: {price} x {shares}"
            )));
        }

        Ok((free_cash_flow, market_cap))
    }
}

/// Yearly free cash flows for `years` years compounding at `growth_rate`
pub fn project_cash_flows(free_cash_flow: f64, growth_rate: f64, years: u32) -> Vec<f64> {
    (1..=years as i32)
        .map(|year| free_cash_flow * (1.0 + growth_rate).powi(year))
        .collect()
}
