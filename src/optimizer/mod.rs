pub mod constraints;
pub mod engine;
pub mod error;
pub mod estimator;
pub mod selection;
pub mod selector;
pub mod solver;
pub mod types;
