use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fund category used for selection counts (finer-grained than `AssetType`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Debt,
    LargeCap,
    MidCap,
    SmallCap,
    Balanced,
    TaxSaver,
}

/// Coarse asset type used by the asset-split constraint pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    Debt,
    Equity,
    Balanced,
    #[serde(rename = "taxsaver")]
    TaxSaver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Currency {
    INR,
    USD,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Geography {
    India,
    #[serde(rename = "USA")]
    Usa,
    Japan,
    Europe,
    #[serde(rename = "UK")]
    Uk,
    China,
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Currency::INR => write!(f, "INR"),
            Currency::USD => write!(f, "USD"),
        }
    }
}

impl fmt::Display for Geography {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Geography::India => "India",
            Geography::Usa => "USA",
            Geography::Japan => "Japan",
            Geography::Europe => "Europe",
            Geography::Uk => "UK",
            Geography::China => "China",
        };
        write!(f, "{}", name)
    }
}

/// One observation of a fund's daily return series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyReturn {
    pub date: NaiveDate,
    pub value: f64,
}

/// Immutable reference entity supplied by the fund universe provider.
///
/// Summary statistics are precomputed from the return series at construction
/// time; the optimizer never mutates a fund.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fund {
    pub name: String,
    pub category: Category,
    pub asset_type: AssetType,
    pub currency: Currency,
    pub geography: Geography,
    /// Annualized return, percent (e.g. 14.2 for 14.2%).
    pub annualized_return_pct: f64,
    /// Annualized volatility, percent.
    pub annualized_volatility_pct: f64,
    /// Maximum peak-to-trough drawdown, percent (positive number).
    pub max_drawdown_pct: f64,
    pub sharpe_ratio: f64,
    pub return_series: Vec<DailyReturn>,
}

impl Fund {
    /// Series-stripped view used in serialized results.
    pub fn summary(&self) -> FundSummary {
        FundSummary {
            name: self.name.clone(),
            category: self.category,
            asset_type: self.asset_type,
            currency: self.currency,
            geography: self.geography,
            annualized_return_pct: self.annualized_return_pct,
            annualized_volatility_pct: self.annualized_volatility_pct,
            max_drawdown_pct: self.max_drawdown_pct,
            sharpe_ratio: self.sharpe_ratio,
            returns_count: self.return_series.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundSummary {
    pub name: String,
    pub category: Category,
    pub asset_type: AssetType,
    pub currency: Currency,
    pub geography: Geography,
    pub annualized_return_pct: f64,
    pub annualized_volatility_pct: f64,
    pub max_drawdown_pct: f64,
    pub sharpe_ratio: f64,
    pub returns_count: usize,
}
