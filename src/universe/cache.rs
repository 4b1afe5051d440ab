use std::sync::OnceLock;
use tracing::info;

use super::FundUniverse;

static UNIVERSE: OnceLock<FundUniverse> = OnceLock::new();

/// Process-wide fund universe, built on first access and read-only after.
///
/// The `OnceLock` guard means concurrent first callers race to a single
/// construction; the seed of the winning call sticks for the process
/// lifetime. Callers that need an independent universe (tests, multiple
/// seeds) should hold their own [`FundUniverse`] and pass it to the optimizer
/// directly.
pub fn global(seed: u64) -> &'static FundUniverse {
    UNIVERSE.get_or_init(|| {
        let universe = FundUniverse::generate(seed);
        info!(seed, funds = universe.len(), "Fund universe initialized");
        universe
    })
}
