use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::universe::{AssetType, Category, Currency, FundSummary, Geography};

/// Coarse risk tier captured by the dialogue layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskBucket {
    Low,
    Medium,
    High,
}

impl FromStr for RiskBucket {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "LOW" => Ok(RiskBucket::Low),
            "MEDIUM" => Ok(RiskBucket::Medium),
            "HIGH" => Ok(RiskBucket::High),
            _ => Err(()),
        }
    }
}

impl fmt::Display for RiskBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskBucket::Low => write!(f, "LOW"),
            RiskBucket::Medium => write!(f, "MEDIUM"),
            RiskBucket::High => write!(f, "HIGH"),
        }
    }
}

/// Optimization goal picked by the model selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    MaxReturn,
    MaxAlpha,
    MaxSharpe,
    RiskParity,
    MinVolatility,
}

impl Objective {
    pub fn name(&self) -> &'static str {
        match self {
            Objective::MaxReturn => "max_return",
            Objective::MaxAlpha => "max_alpha",
            Objective::MaxSharpe => "max_sharpe",
            Objective::RiskParity => "risk_parity",
            Objective::MinVolatility => "min_volatility",
        }
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Risk measure tag reported alongside the chosen model. The mean-variance
/// framework is the only one supported, so this is always `Variance`.
pub const RISK_MEASURE: &str = "Variance";

/// Everything the optimizer needs for one call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationRequest {
    pub currency: Currency,
    pub primary_risk_bucket: RiskBucket,
    /// Sub-risk token, e.g. `"HIGH_LOW"`.
    pub sub_risk_bucket: String,
    /// Informational pass-through; does not constrain the solver.
    #[serde(default)]
    pub volatility_target_pct: Option<f64>,
    /// Informational pass-through; does not constrain the solver.
    #[serde(default)]
    pub drawdown_target_pct: Option<f64>,
    /// Desired fund count per category, used when no funds are preselected.
    #[serde(default)]
    pub fund_counts: BTreeMap<Category, usize>,
    /// Target percent per asset type (need not sum to 100).
    #[serde(default)]
    pub asset_split_targets: BTreeMap<AssetType, f64>,
    /// Target percent per geography; only meaningful for USD portfolios.
    #[serde(default)]
    pub geography_constraints: BTreeMap<Geography, f64>,
    /// Tax-saver minimum percent; INR only.
    #[serde(default)]
    pub tax_saver_target_pct: Option<f64>,
    /// Fund names per category; when present these are used verbatim instead
    /// of re-selecting from the universe.
    #[serde(default)]
    pub preselected_funds: Option<BTreeMap<Category, Vec<String>>>,
}

/// Terminal output of every optimizer call, degraded paths included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationResult {
    /// Fund name -> percent; sums to 100 within rounding tolerance, or empty
    /// on the zero-funds hard failure.
    pub weights: BTreeMap<String, f64>,
    pub funds: Vec<FundSummary>,
    pub model_used: String,
    pub risk_measure: String,
    pub optimization_success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub total_weight: f64,
}

impl OptimizationResult {
    pub fn total_of(weights: &BTreeMap<String, f64>) -> f64 {
        weights.values().sum()
    }
}
