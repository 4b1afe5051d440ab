use chrono::{Datelike, NaiveDate, Utc, Weekday};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use super::fund::{AssetType, Category, Currency, DailyReturn, Fund, Geography};

/// Trading days per year, used for annualization throughout the crate.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Length of each synthetic return series (three trading years).
pub const SERIES_LEN: usize = 756;

const RISK_FREE_RATE: f64 = 0.03;

struct FundSpec {
    name: &'static str,
    category: Category,
    asset_type: AssetType,
    currency: Currency,
    geography: Geography,
    annual_return_pct: f64,
    annual_vol_pct: f64,
}

const fn spec(
    name: &'static str,
    category: Category,
    asset_type: AssetType,
    currency: Currency,
    geography: Geography,
    annual_return_pct: f64,
    annual_vol_pct: f64,
) -> FundSpec {
    FundSpec { name, category, asset_type, currency, geography, annual_return_pct, annual_vol_pct }
}

#[rustfmt::skip]
static FUND_TABLE: &[FundSpec] = &[
    // INR large cap
    spec("HDFC Top 100 Fund", Category::LargeCap, AssetType::Equity, Currency::INR, Geography::India, 14.2, 18.5),
    spec("ICICI Prudential Bluechip Fund", Category::LargeCap, AssetType::Equity, Currency::INR, Geography::India, 13.9, 17.8),
    spec("SBI Bluechip Fund", Category::LargeCap, AssetType::Equity, Currency::INR, Geography::India, 14.5, 19.2),
    spec("Axis Bluechip Fund", Category::LargeCap, AssetType::Equity, Currency::INR, Geography::India, 14.0, 18.0),
    // INR mid cap
    spec("HDFC Mid-Cap Opportunities Fund", Category::MidCap, AssetType::Equity, Currency::INR, Geography::India, 16.8, 22.5),
    spec("SBI Magnum Midcap Fund", Category::MidCap, AssetType::Equity, Currency::INR, Geography::India, 17.2, 23.1),
    spec("Kotak Emerging Equity Fund", Category::MidCap, AssetType::Equity, Currency::INR, Geography::India, 16.5, 21.8),
    spec("DSP Midcap Fund", Category::MidCap, AssetType::Equity, Currency::INR, Geography::India, 17.0, 22.9),
    // INR small cap
    spec("Nippon India Small Cap Fund", Category::SmallCap, AssetType::Equity, Currency::INR, Geography::India, 19.5, 28.5),
    spec("HDFC Small Cap Fund", Category::SmallCap, AssetType::Equity, Currency::INR, Geography::India, 20.1, 29.2),
    spec("SBI Small Cap Fund", Category::SmallCap, AssetType::Equity, Currency::INR, Geography::India, 19.0, 27.8),
    spec("Axis Small Cap Fund", Category::SmallCap, AssetType::Equity, Currency::INR, Geography::India, 19.8, 28.9),
    // INR debt
    spec("HDFC Corporate Bond Fund", Category::Debt, AssetType::Debt, Currency::INR, Geography::India, 7.5, 4.2),
    spec("ICICI Prudential Corporate Bond Fund", Category::Debt, AssetType::Debt, Currency::INR, Geography::India, 7.8, 4.5),
    spec("SBI Corporate Bond Fund", Category::Debt, AssetType::Debt, Currency::INR, Geography::India, 7.3, 4.0),
    spec("Axis Corporate Debt Fund", Category::Debt, AssetType::Debt, Currency::INR, Geography::India, 7.6, 4.3),
    // INR balanced
    spec("HDFC Balanced Advantage Fund", Category::Balanced, AssetType::Balanced, Currency::INR, Geography::India, 11.8, 12.5),
    spec("ICICI Prudential Balanced Advantage Fund", Category::Balanced, AssetType::Balanced, Currency::INR, Geography::India, 12.0, 13.0),
    spec("SBI Balanced Advantage Fund", Category::Balanced, AssetType::Balanced, Currency::INR, Geography::India, 11.9, 12.8),
    spec("Axis Balanced Advantage Fund", Category::Balanced, AssetType::Balanced, Currency::INR, Geography::India, 11.7, 12.6),
    // INR tax saver (ELSS)
    spec("HDFC TaxSaver Fund", Category::TaxSaver, AssetType::TaxSaver, Currency::INR, Geography::India, 15.5, 20.5),
    spec("ICICI Prudential Tax Plan", Category::TaxSaver, AssetType::TaxSaver, Currency::INR, Geography::India, 15.8, 21.0),
    spec("SBI Long Term Equity Fund", Category::TaxSaver, AssetType::TaxSaver, Currency::INR, Geography::India, 15.6, 20.8),
    spec("Axis Long Term Equity Fund", Category::TaxSaver, AssetType::TaxSaver, Currency::INR, Geography::India, 15.4, 20.3),
    // USD / USA
    spec("Vanguard S&P 500 Index Fund", Category::LargeCap, AssetType::Equity, Currency::USD, Geography::Usa, 12.5, 16.5),
    spec("Fidelity 500 Index Fund", Category::LargeCap, AssetType::Equity, Currency::USD, Geography::Usa, 12.7, 16.8),
    spec("Schwab Total Stock Market Index", Category::LargeCap, AssetType::Equity, Currency::USD, Geography::Usa, 12.6, 17.0),
    spec("Vanguard Mid-Cap Index Fund", Category::MidCap, AssetType::Equity, Currency::USD, Geography::Usa, 14.2, 19.5),
    spec("Fidelity Mid Cap Index Fund", Category::MidCap, AssetType::Equity, Currency::USD, Geography::Usa, 14.4, 19.8),
    spec("Vanguard Small-Cap Index Fund", Category::SmallCap, AssetType::Equity, Currency::USD, Geography::Usa, 16.8, 24.5),
    spec("Fidelity Small Cap Index Fund", Category::SmallCap, AssetType::Equity, Currency::USD, Geography::Usa, 17.0, 24.8),
    spec("Vanguard Total Bond Market Index", Category::Debt, AssetType::Debt, Currency::USD, Geography::Usa, 4.2, 3.5),
    spec("Fidelity U.S. Bond Index Fund", Category::Debt, AssetType::Debt, Currency::USD, Geography::Usa, 4.3, 3.6),
    spec("Vanguard Balanced Index Fund", Category::Balanced, AssetType::Balanced, Currency::USD, Geography::Usa, 9.5, 10.5),
    spec("Fidelity Balanced Fund", Category::Balanced, AssetType::Balanced, Currency::USD, Geography::Usa, 9.7, 10.8),
    // USD / Japan
    spec("Nikko AM Japan Equity Fund", Category::LargeCap, AssetType::Equity, Currency::USD, Geography::Japan, 8.5, 18.5),
    spec("Nomura Japan Equity Fund", Category::LargeCap, AssetType::Equity, Currency::USD, Geography::Japan, 8.7, 18.8),
    spec("Daiwa Japan Mid-Cap Fund", Category::MidCap, AssetType::Equity, Currency::USD, Geography::Japan, 10.2, 21.5),
    spec("Nomura Japan Bond Fund", Category::Debt, AssetType::Debt, Currency::USD, Geography::Japan, 1.5, 2.8),
    spec("Mitsubishi Balanced Fund", Category::Balanced, AssetType::Balanced, Currency::USD, Geography::Japan, 6.5, 11.5),
    // USD / India
    spec("Franklin India Bluechip Fund (USD)", Category::LargeCap, AssetType::Equity, Currency::USD, Geography::India, 13.5, 19.5),
    spec("Templeton India Growth Fund (USD)", Category::LargeCap, AssetType::Equity, Currency::USD, Geography::India, 13.7, 19.8),
    spec("Franklin India Mid-Cap Fund (USD)", Category::MidCap, AssetType::Equity, Currency::USD, Geography::India, 16.2, 23.5),
    spec("Franklin India Corporate Bond Fund (USD)", Category::Debt, AssetType::Debt, Currency::USD, Geography::India, 7.2, 4.5),
    spec("Templeton India Balanced Fund (USD)", Category::Balanced, AssetType::Balanced, Currency::USD, Geography::India, 11.5, 13.5),
];

/// Build the full synthetic universe. Each fund's RNG seed is derived from the
/// base seed and the fund's position in the table, so a given seed reproduces
/// the same universe in every process.
pub fn generate_funds(seed: u64) -> Vec<Fund> {
    let dates = business_days_ending_today(SERIES_LEN);

    FUND_TABLE
        .iter()
        .enumerate()
        .map(|(i, spec)| build_fund(spec, &dates, splitmix64(seed.wrapping_add(i as u64 + 1))))
        .collect()
}

fn build_fund(spec: &FundSpec, dates: &[NaiveDate], seed: u64) -> Fund {
    let annual_return = spec.annual_return_pct / 100.0;
    let annual_vol = spec.annual_vol_pct / 100.0;

    let series = synthetic_series(seed, annual_return, annual_vol, dates);
    let max_drawdown_pct = max_drawdown(series.iter().map(|r| r.value)) * 100.0;
    let sharpe_ratio = if annual_vol > 0.0 { (annual_return - RISK_FREE_RATE) / annual_vol } else { 0.0 };

    Fund {
        name: spec.name.to_string(),
        category: spec.category,
        asset_type: spec.asset_type,
        currency: spec.currency,
        geography: spec.geography,
        annualized_return_pct: spec.annual_return_pct,
        annualized_volatility_pct: spec.annual_vol_pct,
        max_drawdown_pct,
        sharpe_ratio,
        return_series: series,
    }
}

/// Normally distributed daily returns matching the given annual return and
/// volatility (fractions, not percent).
pub fn synthetic_series(seed: u64, annual_return: f64, annual_vol: f64, dates: &[NaiveDate]) -> Vec<DailyReturn> {
    let daily_return = annual_return / TRADING_DAYS_PER_YEAR;
    let daily_vol = annual_vol / TRADING_DAYS_PER_YEAR.sqrt();
    let mut rng = StdRng::seed_from_u64(seed);

    match Normal::new(daily_return, daily_vol) {
        Ok(dist) => dates
            .iter()
            .map(|&date| DailyReturn { date, value: dist.sample(&mut rng) })
            .collect(),
        // Zero volatility: the series is just the constant drift.
        Err(_) => dates.iter().map(|&date| DailyReturn { date, value: daily_return }).collect(),
    }
}

/// Largest peak-to-trough decline of the cumulative growth path, as a
/// positive fraction.
pub fn max_drawdown(returns: impl Iterator<Item = f64>) -> f64 {
    let mut cumulative = 1.0_f64;
    let mut running_max = 1.0_f64;
    let mut worst = 0.0_f64;

    for r in returns {
        cumulative *= 1.0 + r;
        running_max = running_max.max(cumulative);
        let drawdown = (cumulative - running_max) / running_max;
        worst = worst.min(drawdown);
    }

    worst.abs()
}

/// The most recent `n` business days (Mon-Fri), oldest first.
pub fn business_days_ending_today(n: usize) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(n);
    let mut day = Utc::now().date_naive();

    while dates.len() < n {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            dates.push(day);
        }
        day = day.pred_opt().unwrap_or(day);
    }

    dates.reverse();
    dates
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9e37_79b9_7f4a_7c15);
    x = (x ^ (x >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^ (x >> 31)
}
