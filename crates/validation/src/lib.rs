//! Log Triage Validation
//!
//! Validators that judge a draft `AnalysisResult` against its source log,
//! and the pipeline that aggregates their verdicts:
//!
//! - `models` - Verdicts, failure kinds, settings
//! - `classification` - User vs system consistency
//! - `structural` - Field presence, lengths, sections, severity tag
//! - `content` - Target language, evidence alignment, action density
//! - `pipeline` - Ordered validator list and aggregation
//!
//! Validators are pure functions of `(draft, source_log)`; they do no I/O.

pub mod classification;
pub mod content;
pub mod models;
pub mod pipeline;
pub mod structural;

/// Classification tag for conditions caused by the caller
pub const TAG_USER_ERROR: &str = "USER_ERROR";
/// Classification tag for conditions caused by the service or its infrastructure
pub const TAG_SYSTEM_ERROR: &str = "SYSTEM_ERROR";
/// Accepted severity tags, most severe first
pub const SEVERITY_TAGS: &[&str] = &["CRITICAL", "HIGH", "MEDIUM", "LOW"];

// Re-export model types
pub use models::{
    AggregatedVerdict, FailureKind, LengthBounds, TargetLanguage, ValidationSettings,
    ValidationVerdict, ValidatorWeights,
};

// Re-export validators
pub use classification::{classify, Classification, ClassificationBasis, ClassificationCheck, ErrorClass};
pub use content::ContentCheck;
pub use pipeline::{ValidationPipeline, Validator};
pub use structural::StructuralCheck;
