use dotenvy::dotenv;
use std::env;

/// Runtime configuration, loaded from the environment (with `.env` support).
pub struct Config {
    /// Annual risk-free rate used by the Sharpe-style objectives.
    pub risk_free_rate: f64,
    /// Base seed for the synthetic fund universe.
    pub universe_seed: u64,
}

impl Config {
    pub fn load() -> Self {
        dotenv().ok();

        let risk_free_rate = env::var("RISK_FREE_RATE")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(0.03);

        let universe_seed = env::var("UNIVERSE_SEED")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(42);

        Config { risk_free_rate, universe_seed }
    }
}
