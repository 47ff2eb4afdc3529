//! Analysis
//!
//! Turns a strategy decision and a set of logs into a draft `AnalysisResult`
//! through typed LLM calls.

pub mod draft;
pub mod executor;
pub mod prompts;

pub use draft::{AnalysisDraft, ChunkDigest};
pub use executor::{raw_excerpt, AnalysisExecutor, AnalysisRequest};
