use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use super::types::OptimizationRequest;
use crate::universe::{Category, Currency, Fund, FundUniverse, Geography};

/// Resolve the candidate fund set for a request: preselected names verbatim
/// when present, otherwise per-category selection from the universe.
pub fn resolve_funds(request: &OptimizationRequest, universe: &FundUniverse) -> Vec<Fund> {
    if let Some(preselected) = &request.preselected_funds {
        if preselected.values().any(|names| !names.is_empty()) {
            return resolve_preselected(preselected, universe);
        }
    }

    select_from_universe(request, universe)
}

fn resolve_preselected(
    preselected: &BTreeMap<Category, Vec<String>>,
    universe: &FundUniverse,
) -> Vec<Fund> {
    let mut selected: Vec<Fund> = Vec::new();

    for names in preselected.values() {
        for name in names {
            match universe.find_by_name(name) {
                Some(fund) if !selected.iter().any(|f| f.name == fund.name) => {
                    selected.push(fund.clone());
                }
                Some(_) => {}
                None => warn!(fund = %name, "Preselected fund not found in universe"),
            }
        }
    }

    debug!(count = selected.len(), "Resolved preselected funds");
    selected
}

fn select_from_universe(request: &OptimizationRequest, universe: &FundUniverse) -> Vec<Fund> {
    let mut available: Vec<&Fund> = universe.by_currency(request.currency);

    // USD with geography constraints restricts the pool up front.
    let constrained_geographies: Vec<Geography> = if request.currency == Currency::USD {
        request.geography_constraints.keys().copied().collect()
    } else {
        Vec::new()
    };
    if !constrained_geographies.is_empty() {
        available.retain(|f| constrained_geographies.contains(&f.geography));
    }

    let mut selected: Vec<Fund> = Vec::new();

    for (&category, &count) in &request.fund_counts {
        if count == 0 {
            continue;
        }

        let mut category_funds: Vec<&Fund> = available
            .iter()
            .copied()
            .filter(|f| f.category == category)
            .collect();
        sort_by_return_desc(&mut category_funds);

        let picks = if constrained_geographies.is_empty() {
            category_funds.iter().take(count).copied().collect::<Vec<_>>()
        } else {
            pick_across_geographies(&category_funds, &request.geography_constraints, count)
        };

        for fund in picks {
            if !selected.iter().any(|f| f.name == fund.name) {
                selected.push(fund.clone());
            }
        }
    }

    debug!(
        currency = %request.currency,
        count = selected.len(),
        "Selected funds from universe"
    );
    selected
}

/// Distribute a category's picks across the constrained geographies in
/// proportion to their targets (at least one per geography), topping up with
/// the best remaining funds if the proportional picks fall short.
fn pick_across_geographies<'a>(
    category_funds: &[&'a Fund],
    geography_constraints: &BTreeMap<Geography, f64>,
    count: usize,
) -> Vec<&'a Fund> {
    let mut picks: Vec<&Fund> = Vec::new();

    for (&geo, &pct) in geography_constraints {
        let geo_count = ((count as f64 * pct / 100.0) as usize).max(1);
        let mut geo_funds: Vec<&Fund> = category_funds
            .iter()
            .copied()
            .filter(|f| f.geography == geo)
            .collect();
        sort_by_return_desc(&mut geo_funds);
        for fund in geo_funds.into_iter().take(geo_count) {
            if !picks.iter().any(|f| f.name == fund.name) {
                picks.push(fund);
            }
        }
    }

    // Top up from any geography, best returns first.
    for fund in category_funds {
        if picks.len() >= count {
            break;
        }
        if !picks.iter().any(|f| f.name == fund.name) {
            picks.push(fund);
        }
    }

    picks.truncate(count);
    picks
}

fn sort_by_return_desc(funds: &mut [&Fund]) {
    funds.sort_by(|a, b| {
        b.annualized_return_pct
            .partial_cmp(&a.annualized_return_pct)
            .unwrap_or(Ordering::Equal)
    });
}
