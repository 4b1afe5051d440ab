use chrono::NaiveDate;
use ndarray::{Array1, Array2, Axis};
use ndarray_stats::CorrelationExt;
use rayon::prelude::*;
use tracing::debug;

use super::error::OptimizerError;
use crate::universe::generator::TRADING_DAYS_PER_YEAR;
use crate::universe::{DailyReturn, Fund};

/// Minimum number of funds the mean-variance machinery can work with.
pub const MIN_FUNDS: usize = 2;
/// Minimum number of aligned observation days.
pub const MIN_DAYS: usize = 10;

/// Annualized statistical inputs for the weight solver, with fund ordering
/// fixed by `fund_names`.
#[derive(Debug, Clone)]
pub struct ReturnEstimates {
    pub fund_names: Vec<String>,
    pub expected_returns: Array1<f64>,
    pub covariance: Array2<f64>,
    pub days: usize,
}

/// Turn the selected funds' daily return series into an annualized expected
/// return vector and covariance matrix.
///
/// Series need not have equal length: the shortest one wins, and every series
/// is aligned to the first fund's date index (forward-fill, then zero-fill
/// for dates preceding a fund's history).
pub fn estimate(funds: &[Fund]) -> Result<ReturnEstimates, OptimizerError> {
    if funds.len() < MIN_FUNDS {
        return Err(OptimizerError::InsufficientData(format!(
            "need at least {MIN_FUNDS} funds for optimization, got {}",
            funds.len()
        )));
    }

    let min_len = funds
        .iter()
        .map(|f| f.return_series.len())
        .min()
        .unwrap_or(0);
    if min_len < MIN_DAYS {
        return Err(OptimizerError::InsufficientData(format!(
            "insufficient historical data: {min_len} days (need at least {MIN_DAYS})"
        )));
    }

    let base_index: Vec<NaiveDate> = funds[0]
        .return_series
        .iter()
        .take(min_len)
        .map(|r| r.date)
        .collect();

    let columns: Vec<Vec<f64>> = funds
        .par_iter()
        .map(|f| align_series(&f.return_series, &base_index))
        .collect();

    let n_funds = funds.len();
    let mut matrix = Array2::<f64>::zeros((min_len, n_funds));
    for (j, column) in columns.iter().enumerate() {
        for (i, &value) in column.iter().enumerate() {
            matrix[[i, j]] = if value.is_finite() { value } else { 0.0 };
        }
    }

    let expected_returns = matrix
        .mean_axis(Axis(0))
        .ok_or_else(|| OptimizerError::InsufficientData("empty returns matrix".to_string()))?
        * TRADING_DAYS_PER_YEAR;

    // Sample covariance across funds (rows of the transposed matrix are the
    // variables), annualized by the 252-day convention.
    let covariance = matrix
        .t()
        .cov(1.0)
        .map_err(|e| OptimizerError::InsufficientData(format!("covariance estimation failed: {e}")))?
        * TRADING_DAYS_PER_YEAR;

    if expected_returns.iter().any(|v| !v.is_finite())
        || covariance.iter().any(|v| !v.is_finite())
    {
        return Err(OptimizerError::InsufficientData(
            "non-finite values in return statistics".to_string(),
        ));
    }

    debug!(funds = n_funds, days = min_len, "Return statistics estimated");

    Ok(ReturnEstimates {
        fund_names: funds.iter().map(|f| f.name.clone()).collect(),
        expected_returns,
        covariance,
        days: min_len,
    })
}

/// Forward-fill a series onto the reference date index; dates before the
/// series starts are zero-filled.
fn align_series(series: &[DailyReturn], base_index: &[NaiveDate]) -> Vec<f64> {
    let mut aligned = Vec::with_capacity(base_index.len());
    let mut cursor = 0;
    let mut last_seen: Option<f64> = None;

    for &date in base_index {
        while cursor < series.len() && series[cursor].date <= date {
            last_seen = Some(series[cursor].value);
            cursor += 1;
        }
        aligned.push(last_seen.unwrap_or(0.0));
    }

    aligned
}
