//! Classification Check
//!
//! Re-derives whether a log describes a user-caused or system-caused
//! condition and rejects drafts whose tags or remediation contradict it.
//!
//! Derivation is layered; the first layer with an opinion wins:
//! 1. exception-type allowlists
//! 2. structured error codes (`USR-1001`, `DB_2003`, ...)
//! 3. HTTP status codes
//! 4. message keyword counts
//! 5. a substantial stack trace
//! 6. default by level

use std::sync::OnceLock;

use log_triage_core::{AnalysisResult, LogEntry};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::{FailureKind, ValidationVerdict};
use crate::{TAG_SYSTEM_ERROR, TAG_USER_ERROR};

pub const VALIDATOR_NAME: &str = "classification";

/// Score for drafts that carry no classification tag at all.
const UNTAGGED_SCORE: f64 = 0.7;

/// Exceptions raised for bad input, business rules, or missing permissions.
const USER_EXCEPTIONS: &[&str] = &[
    "BusinessException",
    "ValidationException",
    "IllegalArgumentException",
    "MethodArgumentNotValidException",
    "ConstraintViolationException",
    "AccessDeniedException",
    "AuthenticationException",
    "BadCredentialsException",
    "UnauthorizedException",
    "ForbiddenException",
    "EntityNotFoundException",
    "ResourceNotFoundException",
    "DuplicateKeyException",
    "InvalidRequestException",
    "MissingServletRequestParameterException",
    "HttpMessageNotReadableException",
    "ValueError",
    "PermissionError",
];

/// Exceptions that point at the service or its infrastructure.
const SYSTEM_EXCEPTIONS: &[&str] = &[
    "NullPointerException",
    "SQLException",
    "DataAccessException",
    "TimeoutException",
    "SocketTimeoutException",
    "ConnectException",
    "IOException",
    "OutOfMemoryError",
    "StackOverflowError",
    "IllegalStateException",
    "ClassCastException",
    "ArrayIndexOutOfBoundsException",
    "IndexOutOfBoundsException",
    "ConcurrentModificationException",
    "UnsupportedOperationException",
    "NoSuchMethodError",
    "ClassNotFoundException",
    "RedisConnectionFailureException",
    "CannotGetJdbcConnectionException",
    "KeyError",
    "AttributeError",
    "TypeError",
];

const USER_KEYWORDS: &[&str] = &[
    "invalid input",
    "invalid parameter",
    "invalid request",
    "validation failed",
    "bad request",
    "unauthorized",
    "forbidden",
    "permission denied",
    "access denied",
    "missing required",
    "already exists",
    "insufficient balance",
    "not allowed",
    "invalid password",
    "expired token",
];

const SYSTEM_KEYWORDS: &[&str] = &[
    "connection refused",
    "connection reset",
    "timed out",
    "timeout",
    "out of memory",
    "deadlock",
    "internal server error",
    "null pointer",
    "disk full",
    "no space left",
    "service unavailable",
    "pool exhausted",
    "broken pipe",
    "segmentation fault",
];

/// Remediation phrases that put the burden on the end user.
const BLAME_USER_PHRASES: &[&str] = &[
    "user should",
    "user must",
    "ask the user",
    "inform the user",
    "notify the user",
    "check your input",
    "user error",
    "re-enter",
    "retry with valid",
    "provide valid",
    "correct the input",
];

/// Remediation phrases that propose changing the service itself.
const CODE_CHANGE_PHRASES: &[&str] = &[
    "fix the code",
    "modify the code",
    "change the code",
    "code change",
    "refactor",
    "null check",
    "add a check",
    "patch",
    "hotfix",
    "redeploy",
    "increase the pool",
    "connection pool",
    "update the query",
    "add an index",
    "restart the service",
    "backend",
];

/// Who caused the condition a log describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    User,
    System,
}

impl ErrorClass {
    /// Tag an analysis of this class must carry.
    pub fn tag(&self) -> &'static str {
        match self {
            ErrorClass::User => TAG_USER_ERROR,
            ErrorClass::System => TAG_SYSTEM_ERROR,
        }
    }
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorClass::User => write!(f, "user error"),
            ErrorClass::System => write!(f, "system error"),
        }
    }
}

/// Which heuristic layer decided the classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationBasis {
    ExceptionType,
    ErrorCode,
    HttpStatus,
    Keywords,
    StackTrace,
    LevelDefault,
}

/// Result of re-deriving a log's classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub class: ErrorClass,
    pub basis: ClassificationBasis,
    /// The exception name, code, or status that decided it (if any)
    pub evidence: Option<String>,
}

impl Classification {
    fn new(class: ErrorClass, basis: ClassificationBasis, evidence: Option<String>) -> Self {
        Self {
            class,
            basis,
            evidence,
        }
    }
}

fn exception_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b[A-Z][A-Za-z0-9_]*(?:Exception|Error)\b")
            .expect("exception pattern is valid")
    })
}

fn user_code_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(?:USR|USER|AUTH|VAL|BIZ)[-_]?\d{2,}\b").expect("user code pattern is valid")
    })
}

fn system_code_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(?:SYS|DB|INFRA|NET|INT)[-_]?\d{2,}\b")
            .expect("system code pattern is valid")
    })
}

fn http_status_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:http|status(?:\s*code)?|response\s*code)[\s:=/]*([45]\d{2})\b")
            .expect("http status pattern is valid")
    })
}

/// Derive the classification of `log`.
pub fn classify(log: &LogEntry) -> Classification {
    let stack = log.stack_trace.as_deref().unwrap_or("");
    let text = format!("{}\n{}", log.message, stack);

    // 1. Exception allowlists, first recognized name in reading order wins
    for m in exception_regex().find_iter(&text) {
        let name = m.as_str();
        if USER_EXCEPTIONS.contains(&name) {
            return Classification::new(
                ErrorClass::User,
                ClassificationBasis::ExceptionType,
                Some(name.to_string()),
            );
        }
        if SYSTEM_EXCEPTIONS.contains(&name) {
            return Classification::new(
                ErrorClass::System,
                ClassificationBasis::ExceptionType,
                Some(name.to_string()),
            );
        }
    }

    // 2. Structured error codes
    if let Some(m) = user_code_regex().find(&log.message) {
        return Classification::new(
            ErrorClass::User,
            ClassificationBasis::ErrorCode,
            Some(m.as_str().to_string()),
        );
    }
    if let Some(m) = system_code_regex().find(&log.message) {
        return Classification::new(
            ErrorClass::System,
            ClassificationBasis::ErrorCode,
            Some(m.as_str().to_string()),
        );
    }

    // 3. HTTP status
    if let Some(caps) = http_status_regex().captures(&log.message) {
        if let Some(code) = caps.get(1).and_then(|c| c.as_str().parse::<u16>().ok()) {
            let class = match code {
                408 => ErrorClass::System,
                400..=499 => ErrorClass::User,
                _ => ErrorClass::System,
            };
            return Classification::new(
                class,
                ClassificationBasis::HttpStatus,
                Some(code.to_string()),
            );
        }
    }

    // 4. Keywords
    let lowered = log.message.to_lowercase();
    let user_hits = count_phrases(&lowered, USER_KEYWORDS);
    let system_hits = count_phrases(&lowered, SYSTEM_KEYWORDS);
    if user_hits != system_hits {
        let class = if user_hits > system_hits {
            ErrorClass::User
        } else {
            ErrorClass::System
        };
        return Classification::new(class, ClassificationBasis::Keywords, None);
    }

    // 5. Stack trace
    if has_substantial_stack_trace(stack) {
        return Classification::new(ErrorClass::System, ClassificationBasis::StackTrace, None);
    }

    // 6. Level
    let class = if log.level.is_error() {
        ErrorClass::System
    } else {
        ErrorClass::User
    };
    Classification::new(class, ClassificationBasis::LevelDefault, None)
}

/// At least three frames (`at ...`) or five non-empty lines.
pub fn has_substantial_stack_trace(stack: &str) -> bool {
    let lines: Vec<&str> = stack
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    let frames = lines.iter().filter(|l| l.starts_with("at ")).count();
    frames >= 3 || lines.len() >= 5
}

fn count_phrases(haystack: &str, phrases: &[&str]) -> usize {
    phrases.iter().filter(|p| haystack.contains(*p)).count()
}

/// Classification consistency check.
#[derive(Debug, Clone, Default)]
pub struct ClassificationCheck;

impl ClassificationCheck {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(&self, draft: &AnalysisResult, log: &LogEntry) -> ValidationVerdict {
        let derived = classify(log);
        let expected_tag = derived.class.tag();
        let has_user = draft.has_tag(TAG_USER_ERROR);
        let has_system = draft.has_tag(TAG_SYSTEM_ERROR);

        tracing::debug!(
            log_id = %log.id,
            class = %derived.class,
            basis = ?derived.basis,
            "validation: classification derived"
        );

        let mut suggestions = Vec::new();
        let because = derived
            .evidence
            .as_deref()
            .map(|e| format!(" ({})", e))
            .unwrap_or_default();

        if has_user && has_system {
            suggestions.push(format!(
                "tags: use only {} for this log; it is a {}{}",
                expected_tag, derived.class, because
            ));
        } else if (derived.class == ErrorClass::System && has_user)
            || (derived.class == ErrorClass::User && has_system)
        {
            suggestions.push(format!(
                "tags: this log is a {}{}; replace the classification tag with {}",
                derived.class, because, expected_tag
            ));
        }

        let solution = draft.solution.to_lowercase();
        let blames = count_phrases(&solution, BLAME_USER_PHRASES);
        let code_changes = count_phrases(&solution, CODE_CHANGE_PHRASES);
        match derived.class {
            ErrorClass::System if blames > 0 && code_changes == 0 => suggestions.push(
                "solution: this is a system error; describe the service-side fix instead of \
                 asking the user to change their input"
                    .to_string(),
            ),
            ErrorClass::User if code_changes > blames => suggestions.push(
                "solution: this is a user error; guide the caller to correct the request \
                 instead of proposing backend code changes"
                    .to_string(),
            ),
            _ => {}
        }

        if !suggestions.is_empty() {
            return ValidationVerdict::fail(
                VALIDATOR_NAME,
                0.0,
                vec![FailureKind::Classification],
                suggestions,
            );
        }

        if !has_user && !has_system {
            return ValidationVerdict::pass(VALIDATOR_NAME, UNTAGGED_SCORE).with_suggestions(vec![
                format!("tags: add the {} classification tag", expected_tag),
            ]);
        }

        ValidationVerdict::pass(VALIDATOR_NAME, 1.0)
    }
}
