use argmin::core::{CostFunction, Executor, Gradient, State};
use argmin::solver::gradientdescent::SteepestDescent;
use argmin::solver::linesearch::{condition::ArmijoCondition, BacktrackingLineSearch};
use ndarray::{Array1, Array2};
use tracing::{debug, warn};

use super::error::OptimizerError;
use super::estimator::ReturnEstimates;
use super::types::Objective;

/// Annual risk-free rate used by the Sharpe-style objectives.
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.03;

/// 1% floor per asset for diversification.
const MIN_WEIGHT: f64 = 0.01;
/// 95% ceiling to avoid degenerate single-asset solutions.
const MAX_WEIGHT: f64 = 0.95;
/// Relaxed floor used by the retry pass and the post-solve clamp.
const RELAXED_MIN_WEIGHT: f64 = 0.005;

/// Quadratic penalty weight for the sum-to-one and bounds constraints.
const CONSTRAINT_PENALTY: f64 = 1000.0;
/// Cost returned when portfolio volatility collapses below `VOL_EPSILON`.
const DEGENERATE_COST: f64 = 1000.0;
const VOL_EPSILON: f64 = 1e-6;

const MAX_ITERS: u64 = 500;
const FD_STEP: f64 = 1e-6;

/// Penalized formulation of one objective over the weight simplex.
struct WeightProblem {
    expected_returns: Array1<f64>,
    covariance: Array2<f64>,
    objective: Objective,
    risk_free_rate: f64,
    min_weight: f64,
    max_weight: f64,
}

impl WeightProblem {
    fn objective_value(&self, w: &Array1<f64>) -> f64 {
        let n = w.len() as f64;
        let portfolio_return = w.dot(&self.expected_returns);
        let sigma_w = self.covariance.dot(w);
        let portfolio_vol = w.dot(&sigma_w).max(0.0).sqrt();

        match self.objective {
            Objective::MaxSharpe => {
                if portfolio_vol < VOL_EPSILON {
                    return DEGENERATE_COST;
                }
                -((portfolio_return - self.risk_free_rate) / portfolio_vol)
            }
            Objective::MinVolatility => portfolio_vol,
            Objective::MaxReturn => -portfolio_return,
            Objective::RiskParity => {
                if portfolio_vol < VOL_EPSILON {
                    return DEGENERATE_COST;
                }
                let target_share = 1.0 / n;
                w.iter()
                    .zip(sigma_w.iter())
                    .map(|(&wi, &swi)| {
                        let risk_contribution = wi * swi / portfolio_vol;
                        (risk_contribution - target_share * portfolio_vol / n).powi(2)
                    })
                    .sum()
            }
            Objective::MaxAlpha => {
                if portfolio_vol < VOL_EPSILON {
                    return DEGENERATE_COST;
                }
                // Deliberately not the Sharpe denominator: the added constant
                // keeps the ratio bounded near zero volatility.
                -((portfolio_return - self.risk_free_rate) / (portfolio_vol + 0.01))
            }
        }
    }

    fn penalized_cost(&self, weights: &[f64]) -> f64 {
        let w = Array1::from_vec(weights.to_vec());

        let sum_violation = (w.sum() - 1.0).powi(2);
        let bound_violation: f64 = w
            .iter()
            .map(|&wi| {
                if wi < self.min_weight {
                    (self.min_weight - wi).powi(2)
                } else if wi > self.max_weight {
                    (wi - self.max_weight).powi(2)
                } else {
                    0.0
                }
            })
            .sum();

        let cost = self.objective_value(&w)
            + CONSTRAINT_PENALTY * sum_violation
            + CONSTRAINT_PENALTY * bound_violation;

        if cost.is_finite() { cost } else { DEGENERATE_COST * 10.0 }
    }
}

impl CostFunction for WeightProblem {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, weights: &Self::Param) -> Result<Self::Output, argmin::core::Error> {
        Ok(self.penalized_cost(weights))
    }
}

impl Gradient for WeightProblem {
    type Param = Vec<f64>;
    type Gradient = Vec<f64>;

    fn gradient(&self, weights: &Self::Param) -> Result<Self::Gradient, argmin::core::Error> {
        // Central finite differences over the penalized cost; cheap at the
        // asset counts this optimizer sees.
        let mut gradient = vec![0.0; weights.len()];
        let mut probe = weights.clone();

        for i in 0..weights.len() {
            probe[i] = weights[i] + FD_STEP;
            let up = self.penalized_cost(&probe);
            probe[i] = weights[i] - FD_STEP;
            let down = self.penalized_cost(&probe);
            probe[i] = weights[i];
            gradient[i] = (up - down) / (2.0 * FD_STEP);
        }

        Ok(gradient)
    }
}

/// Solve for raw portfolio weights under the selected objective.
///
/// Retry policy: a non-converging solve is retried once with the floor
/// relaxed to 0.5% under the `max_sharpe` objective. A failure of the retry
/// as well propagates to the caller, which degrades to equal weights with
/// the failure recorded. Successful weights come back floored at 0.5% and
/// normalized to sum to one.
pub fn solve_weights(
    estimates: &ReturnEstimates,
    objective: Objective,
    risk_free_rate: f64,
) -> Result<Array1<f64>, OptimizerError> {
    let n = estimates.fund_names.len();
    let x0 = vec![1.0 / n as f64; n];

    let raw = match run_solver(estimates, objective, risk_free_rate, MIN_WEIGHT, &x0) {
        Ok(weights) => weights,
        Err(e) => {
            warn!(objective = %objective, err = %e, "Solver did not converge, retrying with relaxed bounds");
            run_solver(estimates, Objective::MaxSharpe, risk_free_rate, RELAXED_MIN_WEIGHT, &x0)?
        }
    };

    debug!(objective = %objective, assets = n, "Raw weights solved");
    Ok(finalize_weights(raw))
}

fn run_solver(
    estimates: &ReturnEstimates,
    objective: Objective,
    risk_free_rate: f64,
    min_weight: f64,
    x0: &[f64],
) -> Result<Vec<f64>, OptimizerError> {
    let problem = WeightProblem {
        expected_returns: estimates.expected_returns.clone(),
        covariance: estimates.covariance.clone(),
        objective,
        risk_free_rate,
        min_weight,
        max_weight: MAX_WEIGHT,
    };

    let condition = ArmijoCondition::new(1e-4)
        .map_err(|e| OptimizerError::SolverNonConvergence(e.to_string()))?;
    let solver = SteepestDescent::new(BacktrackingLineSearch::new(condition));

    let result = Executor::new(problem, solver)
        .configure(|state| state.param(x0.to_vec()).max_iters(MAX_ITERS))
        .run()
        .map_err(|e| OptimizerError::SolverNonConvergence(e.to_string()))?;

    let state = result.state();
    let best = state
        .get_best_param()
        .cloned()
        .ok_or_else(|| {
            OptimizerError::SolverNonConvergence("no parameter vector produced".to_string())
        })?;

    // Hitting `max_iters` terminates the run without an argmin error, so a
    // solve stalled on the degenerate-cost plateau has to be caught here for
    // the retry to fire.
    let best_cost = state.get_best_cost();
    if !best_cost.is_finite() || best_cost >= DEGENERATE_COST {
        return Err(OptimizerError::SolverNonConvergence(format!(
            "best cost {best_cost} never left the penalty plateau"
        )));
    }

    if best.iter().any(|v| !v.is_finite()) {
        return Err(OptimizerError::SolverNonConvergence(
            "non-finite weights in solver output".to_string(),
        ));
    }

    Ok(best)
}

/// Floor every weight at 0.5% and rescale the vector to sum to one.
fn finalize_weights(mut weights: Vec<f64>) -> Array1<f64> {
    let n = weights.len();
    for w in &mut weights {
        *w = w.max(RELAXED_MIN_WEIGHT);
    }

    let total: f64 = weights.iter().sum();
    if total > 0.0 {
        for w in &mut weights {
            *w /= total;
        }
    } else {
        weights = vec![1.0 / n as f64; n];
    }

    Array1::from_vec(weights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn estimates(returns: Array1<f64>, covariance: Array2<f64>) -> ReturnEstimates {
        let names = (0..returns.len()).map(|i| format!("fund-{i}")).collect();
        ReturnEstimates { fund_names: names, expected_returns: returns, covariance, days: 252 }
    }

    fn two_asset() -> ReturnEstimates {
        // A volatile equity-like asset and a quiet debt-like asset with a
        // touch of positive correlation.
        estimates(
            array![0.14, 0.075],
            array![[0.0324, 0.0014], [0.0014, 0.0016]],
        )
    }

    #[test]
    fn sharpe_cost_matches_hand_computation() {
        let est = two_asset();
        let problem = WeightProblem {
            expected_returns: est.expected_returns.clone(),
            covariance: est.covariance.clone(),
            objective: Objective::MaxSharpe,
            risk_free_rate: 0.03,
            min_weight: MIN_WEIGHT,
            max_weight: MAX_WEIGHT,
        };

        let w = array![0.5, 0.5];
        let ret = w.dot(&est.expected_returns);
        let vol = w.dot(&est.covariance.dot(&w)).sqrt();
        assert_relative_eq!(
            problem.objective_value(&w),
            -((ret - 0.03) / vol),
            max_relative = 1e-12
        );
    }

    #[test]
    fn degenerate_volatility_is_penalized_not_divided() {
        let est = estimates(array![0.1, 0.1], array![[0.0, 0.0], [0.0, 0.0]]);
        let problem = WeightProblem {
            expected_returns: est.expected_returns,
            covariance: est.covariance,
            objective: Objective::MaxSharpe,
            risk_free_rate: 0.03,
            min_weight: MIN_WEIGHT,
            max_weight: MAX_WEIGHT,
        };
        assert_eq!(problem.objective_value(&array![0.5, 0.5]), DEGENERATE_COST);
    }

    #[test]
    fn penalty_punishes_constraint_violations() {
        let est = two_asset();
        let problem = WeightProblem {
            expected_returns: est.expected_returns,
            covariance: est.covariance,
            objective: Objective::MinVolatility,
            risk_free_rate: 0.03,
            min_weight: MIN_WEIGHT,
            max_weight: MAX_WEIGHT,
        };

        let feasible = problem.penalized_cost(&[0.5, 0.5]);
        let infeasible_sum = problem.penalized_cost(&[0.9, 0.9]);
        let infeasible_bound = problem.penalized_cost(&[0.999, 0.001]);
        assert!(infeasible_sum > feasible);
        assert!(infeasible_bound > feasible);
    }

    #[test]
    fn min_volatility_tilts_toward_the_quiet_asset() {
        let est = two_asset();
        let weights = solve_weights(&est, Objective::MinVolatility, DEFAULT_RISK_FREE_RATE).unwrap();

        assert_relative_eq!(weights.sum(), 1.0, max_relative = 1e-9);
        assert!(weights[1] > weights[0], "debt-like asset should dominate: {weights:?}");
    }

    #[test]
    fn max_return_tilts_toward_the_high_return_asset() {
        let est = two_asset();
        let weights = solve_weights(&est, Objective::MaxReturn, DEFAULT_RISK_FREE_RATE).unwrap();

        assert_relative_eq!(weights.sum(), 1.0, max_relative = 1e-9);
        assert!(weights[0] > weights[1], "high-return asset should dominate: {weights:?}");
    }

    #[test]
    fn solved_weights_respect_the_floor() {
        let est = two_asset();
        for objective in [
            Objective::MaxSharpe,
            Objective::MinVolatility,
            Objective::MaxReturn,
            Objective::RiskParity,
            Objective::MaxAlpha,
        ] {
            let weights = solve_weights(&est, objective, DEFAULT_RISK_FREE_RATE).unwrap();
            assert_relative_eq!(weights.sum(), 1.0, max_relative = 1e-9);
            assert!(
                weights.iter().all(|&w| w >= RELAXED_MIN_WEIGHT / 2.0),
                "{objective}: {weights:?}"
            );
        }
    }

    #[test]
    fn degenerate_problem_surfaces_non_convergence() {
        // A zero covariance matrix pins every Sharpe-style cost at the
        // degenerate plateau, so neither solve attempt can report progress.
        let est = estimates(array![0.1, 0.1], array![[0.0, 0.0], [0.0, 0.0]]);
        assert!(matches!(
            solve_weights(&est, Objective::MaxSharpe, DEFAULT_RISK_FREE_RATE),
            Err(OptimizerError::SolverNonConvergence(_))
        ));
    }

    #[test]
    fn finalize_floors_and_normalizes() {
        let weights = finalize_weights(vec![0.0, 0.001, 0.999]);
        assert_relative_eq!(weights.sum(), 1.0, max_relative = 1e-12);
        assert!(weights.iter().all(|&w| w > 0.0));
    }
}
