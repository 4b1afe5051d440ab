use dotenvy::dotenv;
use std::collections::BTreeMap;
use std::fs;
use tracing::info;

use fund_portfolio_advisor::config;
use fund_portfolio_advisor::logging;
use fund_portfolio_advisor::optimizer::engine;
use fund_portfolio_advisor::optimizer::types::{OptimizationRequest, RiskBucket};
use fund_portfolio_advisor::universe::cache;
use fund_portfolio_advisor::universe::{AssetType, Category, Currency};

fn main() -> eyre::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    // Initialize logging
    if let Err(e) = logging::init_logging(env!("CARGO_BIN_NAME").to_string()) {
        eprintln!("Failed to initialize logging: {}", e);
        return Err(e);
    }

    let cfg = config::Config::load();
    info!(
        risk_free_rate = cfg.risk_free_rate,
        universe_seed = cfg.universe_seed,
        "Configuration loaded and logging initialized"
    );

    let universe = cache::global(cfg.universe_seed);
    info!(funds = universe.len(), "Fund universe ready");

    // A request JSON file may be passed as the first argument; otherwise run
    // the built-in demo request.
    let request = match std::env::args().nth(1) {
        Some(path) => {
            info!(path = %path, "Loading optimization request from file");
            serde_json::from_str(&fs::read_to_string(&path)?)?
        }
        None => demo_request(),
    };

    let result = engine::optimize_with_rate(&request, universe, cfg.risk_free_rate);
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}

/// Conservative INR portfolio: a spread of equity, debt, balanced and ELSS
/// funds with a debt-heavy asset split and a 20% tax-saver floor.
fn demo_request() -> OptimizationRequest {
    let mut fund_counts = BTreeMap::new();
    fund_counts.insert(Category::LargeCap, 2);
    fund_counts.insert(Category::Debt, 2);
    fund_counts.insert(Category::Balanced, 1);
    fund_counts.insert(Category::TaxSaver, 1);

    let mut asset_split_targets = BTreeMap::new();
    asset_split_targets.insert(AssetType::Equity, 30.0);
    asset_split_targets.insert(AssetType::Debt, 40.0);
    asset_split_targets.insert(AssetType::Balanced, 10.0);
    asset_split_targets.insert(AssetType::TaxSaver, 20.0);

    OptimizationRequest {
        currency: Currency::INR,
        primary_risk_bucket: RiskBucket::Low,
        sub_risk_bucket: "LOW_MEDIUM".to_string(),
        volatility_target_pct: Some(12.0),
        drawdown_target_pct: None,
        fund_counts,
        asset_split_targets,
        geography_constraints: BTreeMap::new(),
        tax_saver_target_pct: Some(20.0),
        preselected_funds: None,
    }
}
