//! Application State
//!
//! Collaborators built once at startup from `AppConfig` and handed to the
//! orchestrator by constructor injection.

use std::sync::Arc;

use log_triage_llm::{LlmProvider, OpenAIProvider};

use crate::models::settings::AppConfig;
use crate::services::embedding::EmbeddingService;
use crate::services::orchestrator::LogAnalysisOrchestrator;
use crate::storage::Database;
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::database_path;

/// Process-wide services
pub struct AppState {
    config: AppConfig,
    database: Arc<Database>,
    embeddings: Arc<EmbeddingService>,
    orchestrator: Arc<LogAnalysisOrchestrator>,
}

impl AppState {
    /// Open the configured database and build every collaborator
    pub fn from_config(config: AppConfig) -> AppResult<Self> {
        config.validate().map_err(AppError::validation)?;

        let db_path = match &config.database_path {
            Some(path) => path.clone(),
            None => database_path()?,
        };
        let database = Arc::new(Database::open(&db_path)?);
        let llm: Arc<dyn LlmProvider> = Arc::new(
            OpenAIProvider::new(config.llm.clone()).map_err(|e| AppError::config(e.to_string()))?,
        );

        Self::with_collaborators(config, database, llm)
    }

    /// Build state around an existing database and LLM provider
    pub fn with_collaborators(
        config: AppConfig,
        database: Arc<Database>,
        llm: Arc<dyn LlmProvider>,
    ) -> AppResult<Self> {
        let embeddings = Arc::new(
            EmbeddingService::from_config(&config.embedding)
                .map_err(|e| AppError::config(e.to_string()))?,
        );

        let orchestrator = Arc::new(LogAnalysisOrchestrator::new(
            config.analyzer.clone(),
            database.clone(),
            database.clone(),
            embeddings.clone(),
            llm,
        ));

        tracing::info!(
            llm = %config.llm.provider,
            model = %config.llm.model,
            embedding = %config.embedding.provider,
            "state: services initialized"
        );

        Ok(Self {
            config,
            database,
            embeddings,
            orchestrator,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn database(&self) -> &Arc<Database> {
        &self.database
    }

    pub fn embeddings(&self) -> &Arc<EmbeddingService> {
        &self.embeddings
    }

    pub fn orchestrator(&self) -> &Arc<LogAnalysisOrchestrator> {
        &self.orchestrator
    }

    /// Check if database is healthy
    pub fn is_database_healthy(&self) -> bool {
        self.database.is_healthy()
    }
}
