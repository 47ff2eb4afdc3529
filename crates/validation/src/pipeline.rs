//! Validation Pipeline
//!
//! Runs the validators in a fixed order and folds their verdicts into one
//! `AggregatedVerdict`:
//! 1. Classification - user vs system consistency
//! 2. Structural - fields, lengths, sections, severity
//! 3. Content - language, evidence, actionability
//!
//! Every validator runs on every draft; there is no short-circuit, so the
//! retry prompt receives the suggestions of all three.

use log_triage_core::{AnalysisResult, LogEntry};

use crate::classification::{self, ClassificationCheck};
use crate::content::{self, ContentCheck};
use crate::models::{AggregatedVerdict, ValidationSettings, ValidationVerdict, ValidatorWeights};
use crate::structural::{self, StructuralCheck};

// ============================================================================
// Validator
// ============================================================================

/// Closed set of validators sharing one `validate` capability.
#[derive(Debug, Clone)]
pub enum Validator {
    Classification(ClassificationCheck),
    Structural(StructuralCheck),
    Content(ContentCheck),
}

impl Validator {
    /// Stable validator name (also the verdict's `validator_name`)
    pub fn name(&self) -> &'static str {
        match self {
            Validator::Classification(_) => classification::VALIDATOR_NAME,
            Validator::Structural(_) => structural::VALIDATOR_NAME,
            Validator::Content(_) => content::VALIDATOR_NAME,
        }
    }

    /// Validate `draft` against its `source` log.
    pub fn validate(&self, draft: &AnalysisResult, source: &LogEntry) -> ValidationVerdict {
        match self {
            Validator::Classification(check) => check.validate(draft, source),
            Validator::Structural(check) => check.validate(draft, source),
            Validator::Content(check) => check.validate(draft, source),
        }
    }

    fn weight(&self, weights: &ValidatorWeights) -> f64 {
        match self {
            Validator::Classification(_) => weights.classification,
            Validator::Structural(_) => weights.structural,
            Validator::Content(_) => weights.content,
        }
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// Ordered validator list plus aggregation settings.
#[derive(Debug, Clone)]
pub struct ValidationPipeline {
    validators: Vec<Validator>,
    weights: ValidatorWeights,
    overall_threshold: f64,
}

impl ValidationPipeline {
    /// Standard pipeline: classification, structural, content.
    pub fn new(settings: &ValidationSettings) -> Self {
        Self::with_validators(
            settings,
            vec![
                Validator::Classification(ClassificationCheck::new()),
                Validator::Structural(StructuralCheck::new(settings)),
                Validator::Content(ContentCheck::new(settings)),
            ],
        )
    }

    /// Pipeline over an explicit validator list (order is preserved).
    pub fn with_validators(settings: &ValidationSettings, validators: Vec<Validator>) -> Self {
        Self {
            validators,
            weights: settings.weights.clone(),
            overall_threshold: settings.overall_threshold,
        }
    }

    /// Names of the configured validators, in execution order
    pub fn validator_names(&self) -> Vec<&'static str> {
        self.validators.iter().map(Validator::name).collect()
    }

    /// Validate a draft and aggregate the verdicts.
    ///
    /// `passed = all(v.passed) && weighted_average(v.score) >= overall_threshold`.
    /// An empty pipeline passes with a score of 1.0.
    pub fn validate(&self, draft: &AnalysisResult, source: &LogEntry) -> AggregatedVerdict {
        let mut verdicts = Vec::with_capacity(self.validators.len());
        let mut weighted = 0.0;
        let mut total_weight = 0.0;

        for validator in &self.validators {
            let verdict = validator.validate(draft, source);
            let weight = validator.weight(&self.weights);
            weighted += weight * verdict.score;
            total_weight += weight;

            tracing::debug!(
                validator = validator.name(),
                passed = verdict.passed,
                score = verdict.score,
                "validation: validator finished"
            );
            verdicts.push(verdict);
        }

        let overall_score = if total_weight > 0.0 {
            weighted / total_weight
        } else {
            1.0
        };
        let passed =
            verdicts.iter().all(|v| v.passed) && overall_score >= self.overall_threshold;
        let suggestions = verdicts
            .iter()
            .flat_map(|v| v.suggestions.iter().cloned())
            .collect();

        tracing::info!(
            log_id = %source.id,
            passed,
            overall_score,
            "validation: draft verdict"
        );

        AggregatedVerdict {
            passed,
            overall_score,
            suggestions,
            verdicts,
        }
    }
}
