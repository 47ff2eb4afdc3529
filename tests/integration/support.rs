//! Shared fixtures: a scripted LLM, an in-memory store, and draft builders.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use log_triage::models::settings::AnalyzerSettings;
use log_triage::services::embedding::{EmbeddingService, HashingEmbeddingProvider};
use log_triage::storage::Database;
use log_triage::LogAnalysisOrchestrator;
use log_triage_core::{LogEntry, LogLevel, LogStore};
use log_triage_llm::{
    LlmError, LlmProvider, LlmRequestOptions, LlmResponse, LlmResult, Message, ProviderConfig,
};

pub const PROJECT: &str = "shop";
pub const NPE_MESSAGE: &str =
    "java.lang.NullPointerException: Cannot invoke \"Customer.getId()\" because \"customer\" is null";

const DIGEST_JSON: &str =
    r#"{"summary":"Requests in this slice failed on a missing customer","key_errors":["NullPointerException"],"services":["order-service"]}"#;

/// Reply to one analysis-phase call (single, direct, reduce)
#[derive(Debug, Clone)]
pub enum Reply {
    /// A SYSTEM_ERROR draft citing the center log; passes for system errors
    Passing,
    /// A draft written in Korean
    Korean,
    /// A draft that fails structure and content
    Vague,
    /// Provider error
    Fail,
}

/// Scripted `LlmProvider`: replies to analysis calls from a queue, falling
/// back to a default, and always answers Map calls with a digest.
pub struct ScriptedLlm {
    config: ProviderConfig,
    center: LogEntry,
    script: Mutex<VecDeque<Reply>>,
    fallback: Reply,
    delay: Duration,
    phases: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn new(center: &LogEntry, script: Vec<Reply>, fallback: Reply) -> Self {
        Self {
            config: ProviderConfig::default(),
            center: center.clone(),
            script: Mutex::new(script.into()),
            fallback,
            delay: Duration::ZERO,
            phases: Mutex::new(Vec::new()),
        }
    }

    /// Always answer with a passing draft
    pub fn passing(center: &LogEntry) -> Self {
        Self::new(center, vec![], Reply::Passing)
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Every phase label seen, in call order
    pub fn phases(&self) -> Vec<String> {
        self.phases.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.phases.lock().unwrap().len()
    }

    /// Calls that produced a full analysis draft
    pub fn analysis_calls(&self) -> usize {
        self.phases().iter().filter(|p| p.as_str() != "map").count()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    async fn send_message(
        &self,
        _messages: Vec<Message>,
        _system: Option<String>,
        options: LlmRequestOptions,
    ) -> LlmResult<LlmResponse> {
        let phase = options.analysis_phase.unwrap_or_default();
        self.phases.lock().unwrap().push(phase.clone());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if phase == "map" {
            return Ok(LlmResponse::from_text("scripted-model", DIGEST_JSON));
        }

        let reply = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        let text = match reply {
            Reply::Passing => passing_draft_json(&self.center),
            Reply::Korean => korean_draft_json(&self.center),
            Reply::Vague => serde_json::json!({
                "summary": "Error",
                "error_cause": "Something failed.",
                "solution": "Look into it.",
                "tags": []
            })
            .to_string(),
            Reply::Fail => {
                return Err(LlmError::ServerError {
                    message: "upstream exploded".into(),
                    status: Some(503),
                })
            }
        };
        Ok(LlmResponse::from_text("scripted-model", text))
    }

    async fn health_check(&self) -> LlmResult<()> {
        Ok(())
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

/// SYSTEM_ERROR draft JSON that satisfies every validator for a
/// system-error `log`
pub fn passing_draft_json(log: &LogEntry) -> String {
    serde_json::json!({
        "summary": format!("Null dereference in {} while placing an order", log.service),
        "error_cause": format!(
            "Log {} from {} recorded an {} on {}: the order handler dereferenced a missing customer record.",
            log.id,
            log.service,
            log.level,
            log.timestamp.format("%Y-%m-%d")
        ),
        "solution": "Immediate actions:\n\
                     - Add a null check for `order.customer` in `OrderService.place`\n\
                     - Return a clear error response until the fix is deployed\n\
                     \n\
                     Prevention:\n\
                     - Add a regression test for OrderService.place() with a missing customer\n\
                     - Enforce a NOT NULL constraint on orders.customer_id",
        "tags": ["SYSTEM_ERROR", "HIGH", "null-pointer"]
    })
    .to_string()
}

fn korean_draft_json(log: &LogEntry) -> String {
    serde_json::json!({
        "summary": "주문 서비스에서 널 포인터 예외가 발생했습니다",
        "error_cause": format!(
            "{} {} 서비스에서 주문 객체가 비어 있어 예외가 발생했습니다 주문 처리 중 오류",
            log.id, log.service
        ),
        "solution": "- 즉시 조치: 주문 객체를 확인합니다\n- 재발 방지: 검증을 추가합니다",
        "tags": ["SYSTEM_ERROR", "HIGH"]
    })
    .to_string()
}

pub fn at(millis: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap() + chrono::Duration::milliseconds(millis)
}

/// An ERROR entry from order-service at `at(millis)`
pub fn error_entry(id: &str, message: &str, trace: Option<&str>, millis: i64) -> LogEntry {
    let entry = LogEntry::new(id, PROJECT, "order-service", LogLevel::Error, message)
        .with_timestamp(at(millis));
    match trace {
        Some(t) => entry.with_trace(t),
        None => entry,
    }
}

/// In-memory database, embeddings and an orchestrator wired around `llm`
pub struct Harness {
    pub db: Arc<Database>,
    pub embeddings: Arc<EmbeddingService>,
    pub orchestrator: LogAnalysisOrchestrator,
}

impl Harness {
    pub fn new(settings: AnalyzerSettings, llm: Arc<ScriptedLlm>) -> Self {
        let db = Arc::new(Database::new_in_memory().unwrap());
        let embeddings = Arc::new(EmbeddingService::new(
            Arc::new(HashingEmbeddingProvider::with_dimension(128)),
            1000,
        ));
        let orchestrator = LogAnalysisOrchestrator::new(
            settings,
            db.clone(),
            db.clone(),
            embeddings.clone(),
            llm,
        );
        Self {
            db,
            embeddings,
            orchestrator,
        }
    }

    pub async fn insert(&self, entries: &[LogEntry]) {
        for entry in entries {
            self.db.upsert(entry).await.unwrap();
        }
    }

    pub async fn stored(&self, id: &str) -> LogEntry {
        self.db.get(PROJECT, id).await.unwrap()
    }
}
