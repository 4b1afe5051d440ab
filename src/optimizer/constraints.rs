use std::collections::BTreeMap;
use tracing::debug;

use crate::universe::{AssetType, Fund, Geography};

/// Weights below this percent are pruned by the geography pass.
const PRUNE_THRESHOLD_PCT: f64 = 0.01;

/// Pass A: rescale each asset type's funds toward its target percent.
///
/// A type whose current weight sum is zero is left alone: this pass never
/// injects allocation into funds the solver zeroed out. Ends with a global
/// renormalization to 100.
pub fn apply_asset_split(
    weights: &mut BTreeMap<String, f64>,
    funds: &[Fund],
    targets: &BTreeMap<AssetType, f64>,
) {
    for (&asset_type, &target) in targets {
        let members: Vec<&str> = funds
            .iter()
            .filter(|f| f.asset_type == asset_type)
            .map(|f| f.name.as_str())
            .collect();
        if members.is_empty() {
            continue;
        }

        let current: f64 = members.iter().filter_map(|n| weights.get(*n)).sum();
        if current > 0.0 {
            let scale = target / current;
            for name in &members {
                if let Some(w) = weights.get_mut(*name) {
                    *w *= scale;
                }
            }
        }
    }

    renormalize(weights);
    debug!(targets = targets.len(), "Asset split constraints applied");
}

/// Pass B: rescale each geography toward its target percent, guaranteeing
/// that every geography with a positive target ends up represented.
pub fn apply_geography_split(
    weights: &mut BTreeMap<String, f64>,
    funds: &[Fund],
    targets: &BTreeMap<Geography, f64>,
) {
    let members_of = |geo: Geography| -> Vec<&str> {
        funds
            .iter()
            .filter(|f| f.geography == geo)
            .map(|f| f.name.as_str())
            .collect()
    };

    // Step 1: seed geographies the solver left at exactly zero.
    for (&geo, &target) in targets {
        let members = members_of(geo);
        if target <= 0.0 || members.is_empty() {
            continue;
        }
        let current: f64 = members.iter().filter_map(|n| weights.get(*n)).sum();
        if current == 0.0 {
            let per_fund = target / members.len() as f64;
            for name in members {
                *weights.entry(name.to_string()).or_insert(0.0) += per_fund;
            }
        }
    }

    // Step 2: scale every constrained geography to its target.
    for (&geo, &target) in targets {
        let members = members_of(geo);
        if members.is_empty() {
            continue;
        }
        let current: f64 = members.iter().filter_map(|n| weights.get(*n)).sum();
        if current > 0.0 {
            let scale = target / current;
            for name in &members {
                if let Some(w) = weights.get_mut(*name) {
                    *w *= scale;
                }
            }
        } else {
            let per_fund = target / members.len() as f64;
            for name in members {
                weights.insert(name.to_string(), per_fund);
            }
        }
    }

    // Step 3: every geography with a positive target must keep a visible fund.
    for (&geo, &target) in targets {
        if target <= 0.0 {
            continue;
        }
        let members = members_of(geo);
        if members.is_empty() {
            continue;
        }
        let visible = members
            .iter()
            .any(|n| weights.get(*n).copied().unwrap_or(0.0) > PRUNE_THRESHOLD_PCT);
        if !visible {
            weights.insert(
                members[0].to_string(),
                (target / members.len() as f64).max(0.1),
            );
        }
    }

    // Step 4: prune dust, sparing a geography's sole remaining representative.
    let dust: Vec<String> = weights
        .iter()
        .filter(|&(_, &w)| w < PRUNE_THRESHOLD_PCT)
        .map(|(name, _)| name.clone())
        .collect();
    for name in dust {
        let Some(fund) = funds.iter().find(|f| f.name == name) else {
            weights.remove(&name);
            continue;
        };
        let geo_target = targets.get(&fund.geography).copied().unwrap_or(0.0);
        let others_visible = funds.iter().any(|other| {
            other.geography == fund.geography
                && other.name != name
                && weights.get(&other.name).copied().unwrap_or(0.0) > PRUNE_THRESHOLD_PCT
        });
        if others_visible || geo_target <= 0.0 {
            weights.remove(&name);
        }
    }

    renormalize(weights);
    debug!(targets = targets.len(), "Geography constraints applied");
}

/// Pass C: rescale tax-saver funds toward the target percent.
///
/// Mirrors the geography pass's injection guarantee: a positive target with
/// zero current tax-saver weight is first distributed equally across the
/// tax-saver funds, then the normal scale-to-target applies.
pub fn apply_tax_saver(weights: &mut BTreeMap<String, f64>, funds: &[Fund], target: f64) {
    let members: Vec<&str> = funds
        .iter()
        .filter(|f| f.asset_type == AssetType::TaxSaver)
        .map(|f| f.name.as_str())
        .collect();
    if members.is_empty() || target <= 0.0 {
        return;
    }

    let current: f64 = members.iter().filter_map(|n| weights.get(*n)).sum();
    if current > 0.0 {
        let scale = target / current;
        for name in &members {
            if let Some(w) = weights.get_mut(*name) {
                *w *= scale;
            }
        }
    } else {
        let per_fund = target / members.len() as f64;
        for name in members {
            weights.insert(name.to_string(), per_fund);
        }
    }

    renormalize(weights);
    debug!(target, "Tax-saver constraint applied");
}

/// Rescale the whole map to sum to 100 and round to two decimals. A no-op
/// (within rounding) on a map that already sums to 100.
pub fn renormalize(weights: &mut BTreeMap<String, f64>) {
    let total: f64 = weights.values().sum();
    if total > 0.0 {
        for w in weights.values_mut() {
            *w = round2(*w * 100.0 / total);
        }
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::universe::{Category, Currency};
    use approx::assert_abs_diff_eq;

    fn fund(name: &str, asset_type: AssetType, geography: Geography) -> Fund {
        let category = match asset_type {
            AssetType::Debt => Category::Debt,
            AssetType::Balanced => Category::Balanced,
            AssetType::TaxSaver => Category::TaxSaver,
            AssetType::Equity => Category::LargeCap,
        };
        Fund {
            name: name.to_string(),
            category,
            asset_type,
            currency: Currency::USD,
            geography,
            annualized_return_pct: 10.0,
            annualized_volatility_pct: 15.0,
            max_drawdown_pct: 20.0,
            sharpe_ratio: 0.5,
            return_series: Vec::new(),
        }
    }

    fn weights_of(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(n, w)| (n.to_string(), *w)).collect()
    }

    fn total(weights: &BTreeMap<String, f64>) -> f64 {
        weights.values().sum()
    }

    #[test]
    fn asset_split_scales_toward_targets() {
        let funds = vec![
            fund("eq1", AssetType::Equity, Geography::India),
            fund("eq2", AssetType::Equity, Geography::India),
            fund("debt1", AssetType::Debt, Geography::India),
        ];
        let mut weights = weights_of(&[("eq1", 40.0), ("eq2", 40.0), ("debt1", 20.0)]);
        let targets = [(AssetType::Equity, 50.0), (AssetType::Debt, 50.0)].into();

        apply_asset_split(&mut weights, &funds, &targets);

        assert_abs_diff_eq!(total(&weights), 100.0, epsilon = 0.1);
        assert_abs_diff_eq!(weights["eq1"] + weights["eq2"], 50.0, epsilon = 0.1);
        assert_abs_diff_eq!(weights["debt1"], 50.0, epsilon = 0.1);
    }

    #[test]
    fn asset_split_does_not_resurrect_zeroed_types() {
        let funds = vec![
            fund("eq1", AssetType::Equity, Geography::India),
            fund("debt1", AssetType::Debt, Geography::India),
        ];
        let mut weights = weights_of(&[("eq1", 100.0), ("debt1", 0.0)]);
        let targets = [(AssetType::Equity, 60.0), (AssetType::Debt, 40.0)].into();

        apply_asset_split(&mut weights, &funds, &targets);

        assert_abs_diff_eq!(weights["debt1"], 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(weights["eq1"], 100.0, epsilon = 0.1);
    }

    #[test]
    fn geography_split_seeds_empty_geographies() {
        let funds = vec![
            fund("us1", AssetType::Equity, Geography::Usa),
            fund("us2", AssetType::Equity, Geography::Usa),
            fund("in1", AssetType::Equity, Geography::India),
            fund("in2", AssetType::Equity, Geography::India),
        ];
        // Solver gave India nothing.
        let mut weights = weights_of(&[("us1", 60.0), ("us2", 40.0)]);
        let targets = [(Geography::Usa, 60.0), (Geography::India, 40.0)].into();

        apply_geography_split(&mut weights, &funds, &targets);

        assert_abs_diff_eq!(total(&weights), 100.0, epsilon = 0.1);
        let india: f64 = weights.get("in1").copied().unwrap_or(0.0)
            + weights.get("in2").copied().unwrap_or(0.0);
        assert!(india > 0.0, "India must receive allocation: {weights:?}");
        assert_abs_diff_eq!(india, 40.0, epsilon = 0.5);
    }

    #[test]
    fn geography_split_prunes_dust_but_keeps_sole_representative() {
        let funds = vec![
            fund("us1", AssetType::Equity, Geography::Usa),
            fund("us2", AssetType::Equity, Geography::Usa),
            fund("jp1", AssetType::Equity, Geography::Japan),
        ];
        let mut weights = weights_of(&[("us1", 99.0), ("us2", 0.005), ("jp1", 0.005)]);
        let targets = [(Geography::Usa, 95.0), (Geography::Japan, 5.0)].into();

        apply_geography_split(&mut weights, &funds, &targets);

        // us2 is dust with a visible sibling; jp1 is Japan's only fund.
        assert!(weights.contains_key("jp1"), "{weights:?}");
        assert!(weights.get("jp1").copied().unwrap_or(0.0) > 0.0);
        assert_abs_diff_eq!(total(&weights), 100.0, epsilon = 0.1);
    }

    #[test]
    fn geography_split_drops_dust_in_untargeted_geographies() {
        let funds = vec![
            fund("us1", AssetType::Equity, Geography::Usa),
            fund("uk1", AssetType::Equity, Geography::Uk),
        ];
        let mut weights = weights_of(&[("us1", 99.995), ("uk1", 0.005)]);
        let targets = [(Geography::Usa, 100.0)].into();

        apply_geography_split(&mut weights, &funds, &targets);

        assert!(!weights.contains_key("uk1"), "{weights:?}");
        assert_abs_diff_eq!(total(&weights), 100.0, epsilon = 0.1);
    }

    #[test]
    fn tax_saver_scales_existing_allocation() {
        let funds = vec![
            fund("elss1", AssetType::TaxSaver, Geography::India),
            fund("eq1", AssetType::Equity, Geography::India),
        ];
        let mut weights = weights_of(&[("elss1", 10.0), ("eq1", 90.0)]);

        apply_tax_saver(&mut weights, &funds, 30.0);

        assert_abs_diff_eq!(total(&weights), 100.0, epsilon = 0.1);
        assert_abs_diff_eq!(weights["elss1"], 25.0, epsilon = 0.1); // 30 / 120 * 100
    }

    #[test]
    fn tax_saver_injects_when_starting_from_zero() {
        let funds = vec![
            fund("elss1", AssetType::TaxSaver, Geography::India),
            fund("eq1", AssetType::Equity, Geography::India),
        ];
        let mut weights = weights_of(&[("elss1", 0.0), ("eq1", 100.0)]);

        apply_tax_saver(&mut weights, &funds, 20.0);

        assert!(weights["elss1"] > 0.0, "{weights:?}");
        assert_abs_diff_eq!(total(&weights), 100.0, epsilon = 0.1);
    }

    #[test]
    fn renormalize_is_idempotent_on_a_full_map() {
        let mut weights = weights_of(&[("a", 62.5), ("b", 25.0), ("c", 12.5)]);
        renormalize(&mut weights);
        let once = weights.clone();
        renormalize(&mut weights);

        for (name, w) in &once {
            assert_abs_diff_eq!(weights[name], *w, epsilon = 0.02);
        }
        assert_abs_diff_eq!(total(&weights), 100.0, epsilon = 0.1);
    }
}
