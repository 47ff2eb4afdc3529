//! Log Triage Core
//!
//! Foundational data model, error taxonomy, and collaborator traits for the
//! Log Triage workspace. This crate has zero dependencies on application-level
//! code (SQLite, LLM providers, HTTP clients, etc.).
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `models` - Log entries, analysis results, cache hits
//! - `store` - Storage and vector-index collaborator traits
//!
//! ## Design Principles
//!
//! 1. **Minimal dependencies** - serde/async-trait/thiserror/chrono only
//! 2. **Trait-based collaborators** - enables fakes in tests and swappable backends
//! 3. **Unidirectional dependency** - this crate depends on nothing else in the workspace

pub mod error;
pub mod models;
pub mod store;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult};

// ── Data Model ─────────────────────────────────────────────────────────
pub use models::{
    AnalysisResult, AnalysisType, CacheHit, CacheTier, LogEntry, LogLevel, TargetType,
};

// ── Collaborators ──────────────────────────────────────────────────────
pub use store::{LogStore, NeighborFilter, VectorIndex};
