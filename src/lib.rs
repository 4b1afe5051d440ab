pub mod config;
pub mod logging;
pub mod optimizer;
pub mod universe;

pub use optimizer::engine::optimize;
pub use optimizer::types::{OptimizationRequest, OptimizationResult};
pub use universe::FundUniverse;
