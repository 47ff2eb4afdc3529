//! Validation Models
//!
//! Verdict types produced by the validators and the settings that tune them.

use serde::{Deserialize, Serialize};

/// Which concern a failing validator check belongs to.
///
/// The orchestrator's retry router uses this to decide which retry counter
/// a failed attempt consumes: `Language` failures use the language budget,
/// everything else uses the validation budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Draft contradicts the user/system classification of the log
    Classification,
    /// Missing fields, bad lengths, missing sections or tags
    Structure,
    /// Draft is not written in the target language
    Language,
    /// Cause text does not reference facts from the source log
    Evidence,
    /// Remediation lacks concrete actions
    Actionability,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Classification => write!(f, "classification"),
            FailureKind::Structure => write!(f, "structure"),
            FailureKind::Language => write!(f, "language"),
            FailureKind::Evidence => write!(f, "evidence"),
            FailureKind::Actionability => write!(f, "actionability"),
        }
    }
}

/// Outcome of one validator on one draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationVerdict {
    /// Validator that produced the verdict
    pub validator_name: String,
    /// Whether the validator's checks passed
    pub passed: bool,
    /// Score in `[0, 1]`
    pub score: f64,
    /// Ordered, human-readable improvement hints
    pub suggestions: Vec<String>,
    /// Concerns that failed (empty when passed)
    #[serde(default)]
    pub failures: Vec<FailureKind>,
}

impl ValidationVerdict {
    /// Create a passing verdict.
    pub fn pass(validator_name: &str, score: f64) -> Self {
        Self {
            validator_name: validator_name.to_string(),
            passed: true,
            score: score.clamp(0.0, 1.0),
            suggestions: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Create a failing verdict.
    pub fn fail(
        validator_name: &str,
        score: f64,
        failures: Vec<FailureKind>,
        suggestions: Vec<String>,
    ) -> Self {
        Self {
            validator_name: validator_name.to_string(),
            passed: false,
            score: score.clamp(0.0, 1.0),
            suggestions,
            failures,
        }
    }

    /// Attach suggestions to a verdict (used for passing-but-improvable drafts).
    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions.extend(suggestions);
        self
    }
}

/// Combined verdict over every validator in the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedVerdict {
    /// `all(v.passed) && overall_score >= threshold`
    pub passed: bool,
    /// Weighted average of validator scores
    pub overall_score: f64,
    /// Suggestions of every validator, in pipeline order
    pub suggestions: Vec<String>,
    /// Per-validator verdicts, in pipeline order
    pub verdicts: Vec<ValidationVerdict>,
}

impl AggregatedVerdict {
    /// Union of the failure kinds of every verdict, in first-seen order.
    pub fn failure_kinds(&self) -> Vec<FailureKind> {
        let mut kinds = Vec::new();
        for kind in self.verdicts.iter().flat_map(|v| v.failures.iter()) {
            if !kinds.contains(kind) {
                kinds.push(*kind);
            }
        }
        kinds
    }

    /// Whether the target-language check failed.
    pub fn language_failed(&self) -> bool {
        !self.passed && self.failure_kinds().contains(&FailureKind::Language)
    }

    /// Whether anything other than the language check failed.
    ///
    /// A verdict that failed only because the weighted score fell below the
    /// overall threshold (no validator flagged a concern) counts here.
    pub fn quality_failed(&self) -> bool {
        if self.passed {
            return false;
        }
        let kinds = self.failure_kinds();
        kinds.is_empty() || kinds.iter().any(|k| *k != FailureKind::Language)
    }

    /// Verdict of the named validator, if it ran.
    pub fn verdict(&self, validator_name: &str) -> Option<&ValidationVerdict> {
        self.verdicts
            .iter()
            .find(|v| v.validator_name == validator_name)
    }
}

/// Natural language the analysis must be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetLanguage {
    English,
    Korean,
}

impl TargetLanguage {
    /// Human-readable name used in prompts and suggestions
    pub fn display_name(&self) -> &'static str {
        match self {
            TargetLanguage::English => "English",
            TargetLanguage::Korean => "Korean",
        }
    }

    /// Default minimum share of letters that must be in the target script.
    ///
    /// Korean prose about software keeps many Latin identifiers, so its bar
    /// is lower.
    pub fn default_min_ratio(&self) -> f64 {
        match self {
            TargetLanguage::English => 0.9,
            TargetLanguage::Korean => 0.3,
        }
    }

    /// Whether `c` belongs to this language's script
    pub fn is_native_char(&self, c: char) -> bool {
        match self {
            TargetLanguage::English => c.is_ascii_alphabetic(),
            TargetLanguage::Korean => {
                ('\u{AC00}'..='\u{D7A3}').contains(&c)
                    || ('\u{1100}'..='\u{11FF}').contains(&c)
                    || ('\u{3130}'..='\u{318F}').contains(&c)
            }
        }
    }
}

impl Default for TargetLanguage {
    fn default() -> Self {
        TargetLanguage::English
    }
}

/// Length bounds (inclusive, in characters) for one text field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LengthBounds {
    pub min: usize,
    pub max: usize,
}

impl LengthBounds {
    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, len: usize) -> bool {
        len >= self.min && len <= self.max
    }
}

/// Relative weight of each validator in the overall score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorWeights {
    pub classification: f64,
    pub structural: f64,
    pub content: f64,
}

impl Default for ValidatorWeights {
    fn default() -> Self {
        Self {
            classification: 0.3,
            structural: 0.3,
            content: 0.4,
        }
    }
}

/// Tuning for every validator and the aggregation step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationSettings {
    /// Minimum weighted score for the aggregated verdict to pass
    pub overall_threshold: f64,
    /// Per-validator weights
    pub weights: ValidatorWeights,
    /// Summary length bounds
    pub summary_length: LengthBounds,
    /// Cause length bounds
    pub cause_length: LengthBounds,
    /// Solution length bounds
    pub solution_length: LengthBounds,
    /// Minimum structural score (fraction of checks satisfied)
    pub structural_min_score: f64,
    /// Language the analysis must be written in
    pub target_language: TargetLanguage,
    /// Minimum share of target-script letters; `None` uses the language default
    pub min_language_ratio: Option<f64>,
    /// Minimum combined content score
    pub content_min_score: f64,
    /// Weight of language quality inside the content score
    pub language_weight: f64,
    /// Weight of evidence alignment inside the content score
    pub evidence_weight: f64,
    /// Weight of action density inside the content score
    pub action_weight: f64,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            overall_threshold: 0.7,
            weights: ValidatorWeights::default(),
            summary_length: LengthBounds::new(10, 300),
            cause_length: LengthBounds::new(30, 4000),
            solution_length: LengthBounds::new(30, 6000),
            structural_min_score: 0.8,
            target_language: TargetLanguage::English,
            min_language_ratio: None,
            content_min_score: 0.5,
            language_weight: 0.4,
            evidence_weight: 0.3,
            action_weight: 0.3,
        }
    }
}

impl ValidationSettings {
    /// Effective minimum language ratio
    pub fn min_language_ratio(&self) -> f64 {
        self.min_language_ratio
            .unwrap_or_else(|| self.target_language.default_min_ratio())
    }

    /// Validate the settings, returning a description of the first problem.
    pub fn validate(&self) -> Result<(), String> {
        let unit = |name: &str, v: f64| -> Result<(), String> {
            if (0.0..=1.0).contains(&v) {
                Ok(())
            } else {
                Err(format!("{} must be within 0.0..=1.0, got {}", name, v))
            }
        };
        unit("overall_threshold", self.overall_threshold)?;
        unit("structural_min_score", self.structural_min_score)?;
        unit("content_min_score", self.content_min_score)?;
        unit("min_language_ratio", self.min_language_ratio())?;

        let weights = [
            self.weights.classification,
            self.weights.structural,
            self.weights.content,
        ];
        if weights.iter().any(|w| *w < 0.0) || weights.iter().sum::<f64>() <= 0.0 {
            return Err("validator weights must be non-negative and not all zero".to_string());
        }

        let content = [self.language_weight, self.evidence_weight, self.action_weight];
        if content.iter().any(|w| *w < 0.0) || content.iter().sum::<f64>() <= 0.0 {
            return Err("content weights must be non-negative and not all zero".to_string());
        }

        for (name, bounds) in [
            ("summary_length", self.summary_length),
            ("cause_length", self.cause_length),
            ("solution_length", self.solution_length),
        ] {
            if bounds.min > bounds.max {
                return Err(format!("{} min exceeds max", name));
            }
        }
        Ok(())
    }
}
