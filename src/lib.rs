//! Log Triage - Rust Backend Library
//!
//! Cache-first root-cause analysis of application error logs:
//! - Multi-tier analysis cache (direct, trace, similarity)
//! - Strategy selection and LLM analysis (single, direct, map-reduce)
//! - Draft validation with bounded, feedback-driven retries
//! - Storage layer (SQLite log store, JSON config)
//! - Data models and utilities

pub mod models;
pub mod services;
pub mod state;
pub mod storage;
pub mod utils;

pub use models::settings::{AnalyzerSettings, AppConfig};
pub use services::orchestrator::{AnalysisOutcome, LogAnalysisOrchestrator, RetryCounts};
pub use services::strategy::Strategy;
pub use state::AppState;
pub use utils::error::{AppError, AppResult};
