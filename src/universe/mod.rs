pub mod cache;
pub mod fund;
pub mod generator;

pub use fund::{AssetType, Category, Currency, DailyReturn, Fund, FundSummary, Geography};

/// Read-only collection of all candidate funds.
///
/// Built once (see [`cache`]) and shared by reference; never mutated after
/// construction, so concurrent optimizations can borrow it freely.
#[derive(Debug, Clone)]
pub struct FundUniverse {
    funds: Vec<Fund>,
}

impl FundUniverse {
    pub fn new(funds: Vec<Fund>) -> Self {
        Self { funds }
    }

    /// Generate the synthetic universe with the given base seed.
    pub fn generate(seed: u64) -> Self {
        Self::new(generator::generate_funds(seed))
    }

    pub fn len(&self) -> usize {
        self.funds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.funds.is_empty()
    }

    pub fn funds(&self) -> &[Fund] {
        &self.funds
    }

    pub fn by_currency(&self, currency: Currency) -> Vec<&Fund> {
        self.funds.iter().filter(|f| f.currency == currency).collect()
    }

    /// Resolve a fund by name: trimmed exact match first, then
    /// case-insensitive.
    pub fn find_by_name(&self, name: &str) -> Option<&Fund> {
        let wanted = name.trim();
        self.funds
            .iter()
            .find(|f| f.name.trim() == wanted)
            .or_else(|| {
                let lowered = wanted.to_lowercase();
                self.funds.iter().find(|f| f.name.trim().to_lowercase() == lowered)
            })
    }
}
