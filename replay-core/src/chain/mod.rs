//! Fallback-chain construction at capture time (spec §4.4, §5.3):
//! candidate production, confidence scoring, and final chain assembly.

pub mod builder;
pub mod generator;
pub mod scorer;

pub use builder::StrategyChainBuilder;
pub use generator::produce_candidates;
pub use scorer::StrategyScorer;
