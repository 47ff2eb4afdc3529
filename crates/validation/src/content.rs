//! Content Check
//!
//! Scores a draft on three axes and combines them:
//! - language quality: share of prose letters written in the target script
//! - evidence alignment: facts from the source log quoted in the cause
//! - action density: number and specificity of remediation items

use std::sync::OnceLock;

use log_triage_core::{AnalysisResult, LogEntry};
use regex::Regex;

use crate::models::{FailureKind, TargetLanguage, ValidationSettings, ValidationVerdict};
use crate::structural::count_action_items;

pub const VALIDATOR_NAME: &str = "content";

/// Sub-scores below this are named in the failure kinds.
const WEAK_AXIS: f64 = 0.5;

fn code_block_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```.*?```").expect("code block pattern is valid"))
}

fn inline_code_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"`[^`\n]+`").expect("inline code pattern is valid"))
}

fn method_ref_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b[A-Za-z_][A-Za-z0-9_]*(?:(?:\.|::|#)[A-Za-z_][A-Za-z0-9_]*)+(?:\(\))?|\b[A-Za-z_][A-Za-z0-9_]*\(\)")
            .expect("method reference pattern is valid")
    })
}

fn frame_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"at\s+(?:[\w$]+\.)*([\w$]+\.[\w$<>]+)\(").expect("frame pattern is valid")
    })
}

fn exception_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b([A-Z][A-Za-z0-9_]*(?:Exception|Error))\b").expect("exception pattern is valid")
    })
}

/// Share of letters in `text` that belong to `language`, ignoring code.
///
/// Code blocks, inline code and identifier-like tokens (dotted paths,
/// snake_case, calls) are removed first so Latin identifiers do not count
/// against a non-Latin target. Returns 0.0 when no prose letters remain.
pub fn language_ratio(text: &str, language: TargetLanguage) -> f64 {
    let without_blocks = code_block_regex().replace_all(text, " ");
    let without_inline = inline_code_regex().replace_all(&without_blocks, " ");

    let mut native = 0usize;
    let mut letters = 0usize;
    for token in without_inline.split_whitespace() {
        if is_identifier_like(token) {
            continue;
        }
        for c in token.chars().filter(|c| c.is_alphabetic()) {
            letters += 1;
            if language.is_native_char(c) {
                native += 1;
            }
        }
    }

    if letters == 0 {
        0.0
    } else {
        native as f64 / letters as f64
    }
}

fn is_identifier_like(token: &str) -> bool {
    let core = token.trim_matches(|c: char| !c.is_alphanumeric());
    if core.is_empty() {
        return false;
    }
    core.contains('_')
        || core.contains("::")
        || core.contains('(')
        || (core.contains('.') && core.chars().any(|c| c.is_ascii_alphabetic()))
        || core.chars().skip(1).any(|c| c.is_ascii_uppercase())
}

/// Concrete facts from `log` an evidence-backed cause should mention.
pub fn evidence_facts(log: &LogEntry) -> Vec<String> {
    let mut facts = vec![
        log.id.clone(),
        log.service.clone(),
        log.timestamp.format("%Y-%m-%d").to_string(),
        log.level.to_string(),
    ];

    if let Some(fragment) = log.stack_trace.as_deref().and_then(stack_fragment) {
        facts.push(fragment);
    }

    facts.retain(|f| !f.trim().is_empty());
    facts
}

/// First frame method (`Class.method`) of a stack trace, else its first exception name.
fn stack_fragment(stack: &str) -> Option<String> {
    if let Some(caps) = frame_regex().captures(stack) {
        return caps.get(1).map(|m| m.as_str().to_string());
    }
    exception_name_regex()
        .captures(stack)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Fraction of `evidence_facts` present (case-insensitive) in the cause.
pub fn evidence_score(cause: &str, log: &LogEntry) -> f64 {
    let facts = evidence_facts(log);
    if facts.is_empty() {
        return 1.0;
    }
    let cause = cause.to_lowercase();
    let found = facts
        .iter()
        .filter(|f| cause.contains(&f.to_lowercase()))
        .count();
    found as f64 / facts.len() as f64
}

/// Code blocks, inline code spans, and method references in the solution.
pub fn specificity(solution: &str) -> usize {
    let blocks = code_block_regex().find_iter(solution).count();
    let without_blocks = code_block_regex().replace_all(solution, " ");
    let inline = inline_code_regex().find_iter(&without_blocks).count();
    let without_inline = inline_code_regex().replace_all(&without_blocks, " ");
    let methods = method_ref_regex().find_iter(&without_inline).count();
    blocks + inline + methods
}

/// `0.6 * min(items/3, 1) + 0.4 * min(specificity/2, 1)`
pub fn action_score(solution: &str) -> f64 {
    let items = count_action_items(solution) as f64;
    let specific = specificity(solution) as f64;
    0.6 * (items / 3.0).min(1.0) + 0.4 * (specific / 2.0).min(1.0)
}

/// Content quality check.
#[derive(Debug, Clone)]
pub struct ContentCheck {
    language: TargetLanguage,
    min_language_ratio: f64,
    min_score: f64,
    language_weight: f64,
    evidence_weight: f64,
    action_weight: f64,
}

impl ContentCheck {
    pub fn new(settings: &ValidationSettings) -> Self {
        Self {
            language: settings.target_language,
            min_language_ratio: settings.min_language_ratio(),
            min_score: settings.content_min_score,
            language_weight: settings.language_weight,
            evidence_weight: settings.evidence_weight,
            action_weight: settings.action_weight,
        }
    }

    pub fn validate(&self, draft: &AnalysisResult, log: &LogEntry) -> ValidationVerdict {
        let prose = format!(
            "{}\n{}\n{}",
            draft.summary, draft.error_cause, draft.solution
        );
        let ratio = language_ratio(&prose, self.language);
        let language_ok = ratio >= self.min_language_ratio;
        let language = if self.min_language_ratio > 0.0 {
            (ratio / self.min_language_ratio).min(1.0)
        } else {
            1.0
        };

        let evidence = evidence_score(&draft.error_cause, log);
        let action = action_score(&draft.solution);

        let total_weight = self.language_weight + self.evidence_weight + self.action_weight;
        let score = (self.language_weight * language
            + self.evidence_weight * evidence
            + self.action_weight * action)
            / total_weight;

        tracing::debug!(
            log_id = %log.id,
            ratio,
            evidence,
            action,
            score,
            "validation: content scored"
        );

        let mut failures = Vec::new();
        let mut suggestions = Vec::new();

        if !language_ok {
            failures.push(FailureKind::Language);
            suggestions.push(format!(
                "language: write summary, error_cause and solution in {} ({:.0}% of prose is, {:.0}% required)",
                self.language.display_name(),
                ratio * 100.0,
                self.min_language_ratio * 100.0
            ));
        }

        if evidence < WEAK_AXIS {
            let missing: Vec<String> = evidence_facts(log)
                .into_iter()
                .filter(|f| !draft.error_cause.to_lowercase().contains(&f.to_lowercase()))
                .collect();
            suggestions.push(format!(
                "error_cause: cite facts from the log ({})",
                missing.join(", ")
            ));
        }
        if action < WEAK_AXIS {
            suggestions.push(
                "solution: give at least three concrete steps referencing methods, config keys or code"
                    .to_string(),
            );
        }

        let passed = language_ok && score >= self.min_score;
        if passed {
            return ValidationVerdict::pass(VALIDATOR_NAME, score).with_suggestions(suggestions);
        }

        if score < self.min_score {
            if evidence < WEAK_AXIS {
                failures.push(FailureKind::Evidence);
            }
            if action < WEAK_AXIS {
                failures.push(FailureKind::Actionability);
            }
        }
        ValidationVerdict::fail(VALIDATOR_NAME, score, failures, suggestions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{error_log, good_draft};

    fn check() -> ContentCheck {
        ContentCheck::new(&ValidationSettings::default())
    }

    #[test]
    fn test_language_ratio_english() {
        assert_eq!(language_ratio("The pool was exhausted.", TargetLanguage::English), 1.0);
        assert_eq!(language_ratio("", TargetLanguage::English), 0.0);
        let mixed = language_ratio("연결 풀이 고갈되었습니다 pool", TargetLanguage::English);
        assert!(mixed < 0.5);
    }

    #[test]
    fn test_language_ratio_korean_ignores_code() {
        let text = "`OrderService.place()` 에서 널 포인터 예외가 발생했습니다 order_id\n```java\nif (order == null) return;\n```";
        assert_eq!(language_ratio(text, TargetLanguage::Korean), 1.0);
    }

    #[test]
    fn test_evidence_facts_and_score() {
        let log = error_log("java.lang.NullPointerException").with_stack_trace(
            "java.lang.NullPointerException\n\tat com.shop.OrderService.place(OrderService.java:42)",
        );
        let facts = evidence_facts(&log);
        assert!(facts.contains(&"OrderService.place".to_string()));
        assert!(facts.contains(&"ERROR".to_string()));

        assert_eq!(evidence_score("nothing relevant", &log), 0.0);
        let cause = format!(
            "Log {} from {} on {} at ERROR level: OrderService.place dereferenced null",
            log.id,
            log.service,
            log.timestamp.format("%Y-%m-%d")
        );
        assert_eq!(evidence_score(&cause, &log), 1.0);
    }

    #[test]
    fn test_action_score() {
        assert_eq!(action_score("just restart"), 0.0);
        let rich = "- add a guard in `OrderService.place`\n- raise pool.max-size\n- add a test for Order::new()";
        assert!((action_score(rich) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_good_draft_passes() {
        let log = error_log("java.lang.NullPointerException");
        let verdict = check().validate(&good_draft(&log), &log);
        assert!(verdict.passed, "{:?}", verdict);
        assert!(verdict.score > 0.9);
    }

    #[test]
    fn test_wrong_language_fails_with_language_kind() {
        let log = error_log("java.lang.NullPointerException");
        let mut d = good_draft(&log);
        d.summary = "주문 서비스에서 널 포인터 예외가 발생했습니다".to_string();
        d.error_cause = format!(
            "{} {} 서비스에서 주문 객체가 비어 있어 예외가 발생했습니다 주문 처리 중 오류",
            log.id, log.service
        );
        d.solution = "- 즉시 조치: 주문 객체를 확인합니다\n- 재발 방지: 검증을 추가합니다".to_string();
        let verdict = check().validate(&d, &log);
        assert!(!verdict.passed);
        assert!(verdict.failures.contains(&FailureKind::Language));
        assert!(verdict.suggestions[0].contains("English"));
    }

    #[test]
    fn test_vague_draft_fails_with_evidence_and_action() {
        let log = error_log("java.lang.NullPointerException");
        let mut d = good_draft(&log);
        d.error_cause = "Something went wrong somewhere in the system.".to_string();
        d.solution = "Look into it.".to_string();
        let mut settings = ValidationSettings::default();
        settings.content_min_score = 0.8;
        let verdict = ContentCheck::new(&settings).validate(&d, &log);
        assert!(!verdict.passed);
        assert!(verdict.failures.contains(&FailureKind::Evidence));
        assert!(verdict.failures.contains(&FailureKind::Actionability));
        assert!(!verdict.failures.contains(&FailureKind::Language));
    }
}
