//! Log Analysis Orchestrator
//!
//! Composes the cache tiers, strategy selector, analysis executor and
//! validation pipeline into one bounded state machine per request.

pub mod inflight;
pub mod outcome;
pub mod service;
pub mod session;

pub use inflight::{request_key, InFlightGuard, InFlightLocks};
pub use outcome::{AnalysisOutcome, PhaseTimings, RetryCounts};
pub use service::LogAnalysisOrchestrator;
pub use session::{route, AnalysisSession, RetryDecision, RetryLimits};
