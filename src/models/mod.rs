//! Data Models
//!
//! Application-level configuration models. The log and analysis data model
//! lives in `log_triage_core`.

pub mod settings;

pub use settings::*;
