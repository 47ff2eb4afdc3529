//! Strategy
//!
//! Maps the number of related logs to an analysis strategy.

pub mod selector;

pub use selector::{Strategy, StrategyDecision, StrategySelector};
