//! Structural Check
//!
//! Field presence, length bounds, required remediation sections, and the
//! severity tag. Score is the fraction of checks satisfied.

use log_triage_core::{AnalysisResult, LogEntry};

use crate::models::{FailureKind, LengthBounds, ValidationSettings, ValidationVerdict};
use crate::SEVERITY_TAGS;

pub const VALIDATOR_NAME: &str = "structural";

const IMMEDIATE_MARKERS: &[&str] = &["immediate", "short-term", "short term", "즉시", "긴급"];
const PREVENTION_MARKERS: &[&str] = &[
    "prevention",
    "prevent",
    "long-term",
    "long term",
    "재발 방지",
    "예방",
];

/// Structural check.
#[derive(Debug, Clone)]
pub struct StructuralCheck {
    summary_length: LengthBounds,
    cause_length: LengthBounds,
    solution_length: LengthBounds,
    min_score: f64,
}

impl StructuralCheck {
    pub fn new(settings: &ValidationSettings) -> Self {
        Self {
            summary_length: settings.summary_length,
            cause_length: settings.cause_length,
            solution_length: settings.solution_length,
            min_score: settings.structural_min_score,
        }
    }

    pub fn validate(&self, draft: &AnalysisResult, _log: &LogEntry) -> ValidationVerdict {
        let mut satisfied = 0usize;
        let mut total = 0usize;
        let mut suggestions = Vec::new();

        let mut check = |ok: bool, suggestion: String| {
            total += 1;
            if ok {
                satisfied += 1;
            } else {
                suggestions.push(suggestion);
            }
        };

        for (field, text, bounds) in [
            ("summary", &draft.summary, self.summary_length),
            ("error_cause", &draft.error_cause, self.cause_length),
            ("solution", &draft.solution, self.solution_length),
        ] {
            let len = text.trim().chars().count();
            check(bounds.contains(len), length_suggestion(field, len, bounds));
        }

        let solution = draft.solution.to_lowercase();
        check(
            count_action_items(&draft.solution) > 0,
            "solution: list the remediation steps as bullet or numbered items".to_string(),
        );
        check(
            IMMEDIATE_MARKERS.iter().any(|m| solution.contains(m)),
            "solution: add an \"Immediate actions\" section".to_string(),
        );
        check(
            PREVENTION_MARKERS.iter().any(|m| solution.contains(m)),
            "solution: add a \"Prevention\" section for long-term fixes".to_string(),
        );
        check(
            SEVERITY_TAGS.iter().any(|t| draft.has_tag(t)),
            format!("tags: add one severity tag ({})", SEVERITY_TAGS.join(", ")),
        );

        let score = if total == 0 {
            1.0
        } else {
            satisfied as f64 / total as f64
        };

        if score >= self.min_score {
            ValidationVerdict::pass(VALIDATOR_NAME, score).with_suggestions(suggestions)
        } else {
            ValidationVerdict::fail(
                VALIDATOR_NAME,
                score,
                vec![FailureKind::Structure],
                suggestions,
            )
        }
    }
}

fn length_suggestion(field: &str, len: usize, bounds: LengthBounds) -> String {
    if len == 0 {
        format!("{}: field is empty", field)
    } else if len < bounds.min {
        format!(
            "{}: too short ({} chars, at least {} expected)",
            field, len, bounds.min
        )
    } else {
        format!(
            "{}: too long ({} chars, at most {} allowed)",
            field, len, bounds.max
        )
    }
}

/// Lines that read as list items: `- x`, `* x`, `1. x`, `2) x`.
pub fn count_action_items(text: &str) -> usize {
    text.lines()
        .map(str::trim_start)
        .filter(|line| is_list_item(line))
        .count()
}

fn is_list_item(line: &str) -> bool {
    if line.starts_with("- ") || line.starts_with("* ") || line.starts_with("• ") {
        return true;
    }
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    digits > 0
        && matches!(
            line[digits..].chars().next(),
            Some('.') | Some(')')
        )
}
