use std::str::FromStr;

use super::types::{Objective, RiskBucket, RISK_MEASURE};

/// Map the risk profile to an optimization objective.
///
/// The sub-risk token encodes `PRIMARY_SECONDARY` (e.g. `"HIGH_LOW"`); only
/// the secondary half participates in the lookup. A malformed token falls
/// back to the MEDIUM/MEDIUM row (risk parity).
pub fn select_model(primary: RiskBucket, sub_risk_bucket: &str) -> (Objective, &'static str) {
    let Some(secondary) = secondary_bucket(sub_risk_bucket) else {
        return (Objective::RiskParity, RISK_MEASURE);
    };

    let objective = match (primary, secondary) {
        (RiskBucket::High, RiskBucket::High) => Objective::MaxReturn,
        (RiskBucket::High, RiskBucket::Medium) => Objective::MaxAlpha,
        (RiskBucket::High, RiskBucket::Low) => Objective::MaxSharpe,
        (RiskBucket::Medium, RiskBucket::High) => Objective::MaxSharpe,
        (RiskBucket::Medium, RiskBucket::Medium) => Objective::RiskParity,
        (RiskBucket::Medium, RiskBucket::Low) => Objective::RiskParity,
        (RiskBucket::Low, RiskBucket::High) => Objective::RiskParity,
        (RiskBucket::Low, RiskBucket::Medium) => Objective::MinVolatility,
        (RiskBucket::Low, RiskBucket::Low) => Objective::MinVolatility,
    };

    (objective, RISK_MEASURE)
}

fn secondary_bucket(token: &str) -> Option<RiskBucket> {
    token
        .split_once('_')
        .and_then(|(_, second)| RiskBucket::from_str(second).ok())
}
