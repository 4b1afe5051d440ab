use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use super::constraints;
use super::estimator;
use super::selection;
use super::selector;
use super::solver::{self, DEFAULT_RISK_FREE_RATE};
use super::types::{OptimizationRequest, OptimizationResult, RISK_MEASURE};
use crate::universe::{Currency, Fund, FundUniverse};

/// Run one portfolio optimization with the default 3% risk-free rate.
pub fn optimize(request: &OptimizationRequest, universe: &FundUniverse) -> OptimizationResult {
    optimize_with_rate(request, universe, DEFAULT_RISK_FREE_RATE)
}

/// Run one portfolio optimization.
///
/// This is the terminal error boundary: every failure mode (no funds, thin
/// data, solver trouble) is converted into a well-formed result; nothing
/// escapes as an error.
pub fn optimize_with_rate(
    request: &OptimizationRequest,
    universe: &FundUniverse,
    risk_free_rate: f64,
) -> OptimizationResult {
    info!(
        currency = %request.currency,
        primary = %request.primary_risk_bucket,
        sub = %request.sub_risk_bucket,
        volatility_target = ?request.volatility_target_pct,
        drawdown_target = ?request.drawdown_target_pct,
        "Starting portfolio optimization"
    );

    let selected = selection::resolve_funds(request, universe);

    if selected.is_empty() {
        warn!("No funds resolved from request criteria");
        return OptimizationResult {
            weights: BTreeMap::new(),
            funds: Vec::new(),
            model_used: "none".to_string(),
            risk_measure: RISK_MEASURE.to_string(),
            optimization_success: false,
            error: Some("No funds found matching criteria".to_string()),
            total_weight: 0.0,
        };
    }

    if selected.len() == 1 {
        // Cannot diversify a single asset; skip the solver entirely.
        let fund = &selected[0];
        info!(fund = %fund.name, "Single fund resolved, assigning full allocation");
        let mut weights = BTreeMap::new();
        weights.insert(fund.name.clone(), 100.0);
        return OptimizationResult {
            weights,
            funds: vec![fund.summary()],
            model_used: "single_fund".to_string(),
            risk_measure: RISK_MEASURE.to_string(),
            optimization_success: false,
            error: Some(
                "Only one fund selected - cannot optimize. Using 100% allocation.".to_string(),
            ),
            total_weight: 100.0,
        };
    }

    let (objective, risk_measure) =
        selector::select_model(request.primary_risk_bucket, &request.sub_risk_bucket);
    debug!(objective = %objective, risk_measure, "Optimization model selected");

    let estimates = match estimator::estimate(&selected) {
        Ok(estimates) => estimates,
        Err(e) => {
            warn!(err = %e, "Return estimation failed, falling back to equal weights");
            return equal_weight_fallback(&selected, e.to_string());
        }
    };

    let raw_weights = match solver::solve_weights(&estimates, objective, risk_free_rate) {
        Ok(weights) => weights,
        Err(e) => {
            warn!(err = %e, "Weight solve failed, falling back to equal weights");
            return equal_weight_fallback(&selected, e.to_string());
        }
    };

    let mut weights: BTreeMap<String, f64> = estimates
        .fund_names
        .iter()
        .zip(raw_weights.iter())
        .map(|(name, &w)| (name.clone(), w * 100.0))
        .collect();
    constraints::renormalize(&mut weights);

    if !request.asset_split_targets.is_empty() {
        constraints::apply_asset_split(&mut weights, &selected, &request.asset_split_targets);
    }
    if request.currency == Currency::USD && !request.geography_constraints.is_empty() {
        constraints::apply_geography_split(&mut weights, &selected, &request.geography_constraints);
    }
    if request.currency == Currency::INR {
        if let Some(target) = request.tax_saver_target_pct {
            if target > 0.0 {
                constraints::apply_tax_saver(&mut weights, &selected, target);
            }
        }
    }

    let total_weight = OptimizationResult::total_of(&weights);
    info!(
        model = %objective,
        funds = weights.len(),
        total_weight,
        "Optimization complete"
    );

    OptimizationResult {
        weights,
        funds: selected.iter().map(Fund::summary).collect(),
        model_used: objective.name().to_string(),
        risk_measure: risk_measure.to_string(),
        optimization_success: true,
        error: None,
        total_weight,
    }
}

fn equal_weight_fallback(selected: &[Fund], reason: String) -> OptimizationResult {
    let equal = 100.0 / selected.len() as f64;
    let mut weights: BTreeMap<String, f64> = selected
        .iter()
        .map(|f| (f.name.clone(), equal))
        .collect();
    constraints::renormalize(&mut weights);
    let total_weight = OptimizationResult::total_of(&weights);

    OptimizationResult {
        weights,
        funds: selected.iter().map(Fund::summary).collect(),
        model_used: "equal_weight_fallback".to_string(),
        risk_measure: RISK_MEASURE.to_string(),
        optimization_success: false,
        error: Some(reason),
        total_weight,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::types::RiskBucket;
    use crate::universe::generator::{business_days_ending_today, synthetic_series};
    use crate::universe::{AssetType, Category, Geography};
    use approx::assert_abs_diff_eq;

    fn series_fund(
        name: &str,
        seed: u64,
        category: Category,
        asset_type: AssetType,
        annual_return_pct: f64,
        annual_vol_pct: f64,
        days: usize,
    ) -> Fund {
        let dates = business_days_ending_today(days);
        Fund {
            name: name.to_string(),
            category,
            asset_type,
            currency: Currency::INR,
            geography: Geography::India,
            annualized_return_pct: annual_return_pct,
            annualized_volatility_pct: annual_vol_pct,
            max_drawdown_pct: 0.0,
            sharpe_ratio: 0.0,
            return_series: synthetic_series(
                seed,
                annual_return_pct / 100.0,
                annual_vol_pct / 100.0,
                &dates,
            ),
        }
    }

    fn request_for(names: &[&str]) -> OptimizationRequest {
        OptimizationRequest {
            currency: Currency::INR,
            primary_risk_bucket: RiskBucket::Low,
            sub_risk_bucket: "LOW_LOW".to_string(),
            volatility_target_pct: None,
            drawdown_target_pct: None,
            fund_counts: BTreeMap::new(),
            asset_split_targets: BTreeMap::new(),
            geography_constraints: BTreeMap::new(),
            tax_saver_target_pct: None,
            preselected_funds: Some(
                [(Category::LargeCap, names.iter().map(|n| n.to_string()).collect())].into(),
            ),
        }
    }

    #[test]
    fn thin_history_degrades_to_equal_weights() {
        let universe = FundUniverse::new(vec![
            series_fund("a", 1, Category::LargeCap, AssetType::Equity, 14.0, 18.0, 5),
            series_fund("b", 2, Category::LargeCap, AssetType::Equity, 13.0, 17.0, 5),
        ]);
        let result = optimize(&request_for(&["a", "b"]), &universe);

        assert!(!result.optimization_success);
        assert_eq!(result.model_used, "equal_weight_fallback");
        assert!(result.error.is_some());
        assert_abs_diff_eq!(result.total_weight, 100.0, epsilon = 0.1);
        assert_abs_diff_eq!(result.weights["a"], 50.0, epsilon = 0.1);
    }

    #[test]
    fn solver_failure_degrades_to_equal_weights() {
        // Zero-volatility series produce a zero covariance matrix; the Sharpe
        // objective then never leaves the degenerate-cost plateau and both
        // solve attempts report non-convergence.
        let universe = FundUniverse::new(vec![
            series_fund("a", 1, Category::LargeCap, AssetType::Equity, 10.0, 0.0, 252),
            series_fund("b", 2, Category::LargeCap, AssetType::Equity, 8.0, 0.0, 252),
        ]);
        let mut request = request_for(&["a", "b"]);
        request.primary_risk_bucket = RiskBucket::Medium;
        request.sub_risk_bucket = "MEDIUM_HIGH".to_string();

        let result = optimize(&request, &universe);

        assert!(!result.optimization_success);
        assert_eq!(result.model_used, "equal_weight_fallback");
        assert!(result.error.is_some());
        assert_abs_diff_eq!(result.weights["a"], 50.0, epsilon = 0.1);
        assert_abs_diff_eq!(result.total_weight, 100.0, epsilon = 0.1);
    }

    #[test]
    fn single_fund_shortcut_skips_the_solver() {
        let universe = FundUniverse::new(vec![series_fund(
            "F",
            1,
            Category::LargeCap,
            AssetType::Equity,
            14.0,
            18.0,
            252,
        )]);
        let result = optimize(&request_for(&["F"]), &universe);

        assert!(!result.optimization_success);
        assert_eq!(result.model_used, "single_fund");
        assert_eq!(result.weights.len(), 1);
        assert_abs_diff_eq!(result.weights["F"], 100.0, epsilon = 1e-9);
    }

    #[test]
    fn zero_funds_is_a_hard_failure() {
        let universe = FundUniverse::new(Vec::new());
        let result = optimize(&request_for(&["missing"]), &universe);

        assert!(!result.optimization_success);
        assert!(result.weights.is_empty());
        assert_eq!(result.error.as_deref(), Some("No funds found matching criteria"));
    }
}
