//! Services
//!
//! Business logic services for the application.

pub mod analysis;
pub mod cache;
pub mod embedding;
pub mod ingest;
pub mod orchestrator;
pub mod strategy;

pub use analysis::AnalysisExecutor;
pub use cache::CacheResolver;
pub use embedding::EmbeddingService;
pub use orchestrator::{AnalysisOutcome, LogAnalysisOrchestrator};
pub use strategy::{Strategy, StrategySelector};
