pub mod analyzer;
pub mod classifier;
pub mod indicator_set;
pub mod indicators;
pub mod scoring;

#[cfg(test)]
mod indicators_tests;

pub use analyzer::*;
pub use classifier::*;
pub use indicator_set::*;
pub use indicators::*;
pub use scoring::*;
