//! Analysis Prompts
//!
//! Prompt text for every LLM call the executor makes. Log fields are always
//! rendered the same way so the evidence the validator looks for (id,
//! service, date, level, stack frames) is visible to the model.

use log_triage_core::LogEntry;
use log_triage_validation::{TargetLanguage, SEVERITY_TAGS, TAG_SYSTEM_ERROR, TAG_USER_ERROR};

use super::draft::ChunkDigest;

/// Stack-trace lines kept when a single log is analyzed.
const SINGLE_STACK_LINES: usize = 40;
/// Stack-trace lines kept per log in multi-log prompts.
const MULTI_STACK_LINES: usize = 6;

/// System prompt for Single, Direct, and Reduce calls.
pub fn analysis_system_prompt(language: TargetLanguage) -> String {
    format!(
        "You are a senior site-reliability engineer performing root-cause analysis of \
application logs.\n\
\n\
Rules:\n\
- Write summary, error_cause and solution in {language}. Identifiers, class names and \
code stay as they are.\n\
- error_cause must cite concrete facts from the log: its id, service, date, level, and the \
most relevant stack frame (Class.method) when a stack trace exists.\n\
- solution must contain an \"Immediate actions:\" section and a \"Prevention:\" section, \
each a list of \"- \" items. Reference concrete methods, config keys, or code in backticks.\n\
- tags must contain exactly one classification tag: {user} when the caller caused the \
condition (bad input, business rule, permissions), {system} when the service or its \
infrastructure did. For {user}, guide the caller; do not propose backend code changes. \
For {system}, describe the service-side fix; do not blame the user.\n\
- tags must contain exactly one severity tag: {severities}.",
        language = language.display_name(),
        user = TAG_USER_ERROR,
        system = TAG_SYSTEM_ERROR,
        severities = SEVERITY_TAGS.join(", "),
    )
}

/// System prompt for Map calls.
pub fn map_system_prompt() -> String {
    "You condense a slice of a distributed trace for a later root-cause analysis. \
Report what happened, quote the most significant error lines verbatim, and list the \
services involved. Do not speculate about fixes."
        .to_string()
}

/// Render one log entry.
pub fn format_log(entry: &LogEntry, stack_lines: usize) -> String {
    let mut out = format!(
        "id: {}\nservice: {}\nlevel: {}\ntimestamp: {}\n",
        entry.id,
        entry.service,
        entry.level,
        entry.timestamp.to_rfc3339()
    );
    if let Some(trace) = entry.trace() {
        out.push_str(&format!("trace_id: {}\n", trace));
    }
    if let Some(source) = entry.source_type.as_deref() {
        out.push_str(&format!("source_type: {}\n", source));
    }
    out.push_str(&format!("message: {}\n", entry.message));
    if let Some(stack) = entry.stack_trace.as_deref().filter(|s| !s.trim().is_empty()) {
        let lines: Vec<&str> = stack.lines().take(stack_lines).collect();
        out.push_str("stack_trace:\n");
        out.push_str(&lines.join("\n"));
        out.push('\n');
    }
    out
}

fn feedback_section(feedback: &[String]) -> String {
    if feedback.is_empty() {
        return String::new();
    }
    let items: Vec<String> = feedback.iter().map(|f| format!("- {}", f)).collect();
    format!(
        "\nA previous draft was rejected. Fix these problems:\n{}\n",
        items.join("\n")
    )
}

/// Prompt for a single-log analysis.
pub fn single_prompt(log: &LogEntry, feedback: &[String]) -> String {
    format!(
        "Analyze this log entry.\n\n{}{}",
        format_log(log, SINGLE_STACK_LINES),
        feedback_section(feedback)
    )
}

/// Prompt for a multi-log analysis with the center log marked.
pub fn direct_prompt(center: &LogEntry, related: &[LogEntry], feedback: &[String]) -> String {
    let mut out = format!(
        "Analyze the log marked TARGET in the context of the {} logs of its trace, in time order.\n\n",
        related.len()
    );
    for (i, entry) in related.iter().enumerate() {
        let marker = if entry.id == center.id { " TARGET" } else { "" };
        out.push_str(&format!(
            "### Log {}{}\n{}\n",
            i + 1,
            marker,
            format_log(entry, MULTI_STACK_LINES)
        ));
    }
    if !related.iter().any(|e| e.id == center.id) {
        out.push_str(&format!(
            "### TARGET\n{}\n",
            format_log(center, MULTI_STACK_LINES)
        ));
    }
    out.push_str(&feedback_section(feedback));
    out
}

/// Prompt for one Map chunk.
pub fn map_prompt(chunk: &[LogEntry], index: usize, total: usize) -> String {
    let mut out = format!("Trace slice {} of {}.\n\n", index + 1, total);
    for entry in chunk {
        out.push_str(&format_log(entry, MULTI_STACK_LINES));
        out.push('\n');
    }
    out
}

/// Prompt for the Reduce call: the target log in full plus every chunk digest.
pub fn reduce_prompt(center: &LogEntry, digests: &[ChunkDigest], feedback: &[String]) -> String {
    let mut out = format!(
        "Analyze the TARGET log using the {} summaries of its trace, in time order.\n\n### TARGET\n{}\n",
        digests.len(),
        format_log(center, SINGLE_STACK_LINES)
    );
    for (i, digest) in digests.iter().enumerate() {
        out.push_str(&format!("### Slice {}\nsummary: {}\n", i + 1, digest.summary));
        if !digest.services.is_empty() {
            out.push_str(&format!("services: {}\n", digest.services.join(", ")));
        }
        for line in &digest.key_errors {
            out.push_str(&format!("error: {}\n", line));
        }
        out.push('\n');
    }
    out.push_str(&feedback_section(feedback));
    out
}
