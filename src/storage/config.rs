//! JSON Configuration Management
//!
//! Handles reading and writing the application configuration file.

use std::fs;
use std::path::{Path, PathBuf};

use crate::models::settings::AppConfig;
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::{config_path, ensure_app_dir, ensure_dir};

/// Configuration service for managing app settings
#[derive(Debug)]
pub struct ConfigService {
    config_path: PathBuf,
    config: AppConfig,
}

impl ConfigService {
    /// Load ~/.log-triage/config.json, creating it with defaults when missing
    pub fn new() -> AppResult<Self> {
        ensure_app_dir()?;
        Self::load_or_create(config_path()?)
    }

    /// Load a specific config file, creating it with defaults when missing
    pub fn load_or_create(config_path: PathBuf) -> AppResult<Self> {
        let config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            if let Some(parent) = config_path.parent() {
                if !parent.as_os_str().is_empty() {
                    ensure_dir(parent)?;
                }
            }
            let default_config = AppConfig::default();
            Self::save_to_file(&config_path, &default_config)?;
            default_config
        };

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Load configuration from a file
    fn load_from_file(path: &Path) -> AppResult<AppConfig> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        config.validate().map_err(AppError::validation)?;
        Ok(config)
    }

    /// Save configuration to a file with pretty formatting
    fn save_to_file(path: &Path, config: &AppConfig) -> AppResult<()> {
        config.validate().map_err(AppError::validation)?;
        let content = serde_json::to_string_pretty(config)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Get the current configuration
    pub fn get_config(&self) -> &AppConfig {
        &self.config
    }

    /// Current configuration with environment API keys applied.
    ///
    /// Keys taken from the environment are never written back to disk.
    pub fn effective_config(&self) -> AppConfig {
        let mut config = self.config.clone();
        config.apply_env_overrides();
        config
    }

    /// Replace the configuration and persist it
    pub fn update_config(&mut self, config: AppConfig) -> AppResult<AppConfig> {
        config.validate().map_err(AppError::validation)?;
        self.config = config;
        self.save()?;
        Ok(self.config.clone())
    }

    /// Save the current configuration to disk
    pub fn save(&self) -> AppResult<()> {
        Self::save_to_file(&self.config_path, &self.config)
    }

    /// Reload configuration from disk
    pub fn reload(&mut self) -> AppResult<()> {
        self.config = Self::load_from_file(&self.config_path)?;
        Ok(())
    }

    /// Reset configuration to defaults
    pub fn reset(&mut self) -> AppResult<()> {
        self.config = AppConfig::default();
        self.save()?;
        Ok(())
    }

    /// Check if the config service is healthy
    pub fn is_healthy(&self) -> bool {
        self.config_path.exists() && self.config.validate().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_config_file(content: &str) -> (NamedTempFile, PathBuf) {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        let path = file.path().to_path_buf();
        (file, path)
    }

    #[test]
    fn test_load_partial_config_from_file() {
        let (_file, path) = create_test_config_file(r#"{ "analyzer": { "chunk_size": 10 } }"#);
        let config = ConfigService::load_from_file(&path).unwrap();
        assert_eq!(config.analyzer.chunk_size, 10);
        assert_eq!(config.analyzer.map_reduce_threshold, 30);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let (_file, path) =
            create_test_config_file(r#"{ "analyzer": { "similarity_threshold": 2.0 } }"#);
        let err = ConfigService::load_from_file(&path).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_load_or_create_writes_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("sub").join("config.json");

        let service = ConfigService::load_or_create(path.clone()).unwrap();
        assert!(path.exists());
        assert!(service.is_healthy());
        assert_eq!(service.get_config(), &AppConfig::default());
    }

    #[test]
    fn test_config_update_and_reload() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.json");
        let mut service = ConfigService::load_or_create(path).unwrap();

        let mut config = service.get_config().clone();
        config.analyzer.max_validation_retries = 5;
        service.update_config(config).unwrap();

        service.reload().unwrap();
        assert_eq!(service.get_config().analyzer.max_validation_retries, 5);

        let mut bad = service.get_config().clone();
        bad.analyzer.chunk_size = 0;
        assert!(service.update_config(bad).is_err());
        assert_eq!(service.get_config().analyzer.chunk_size, 25);

        service.reset().unwrap();
        assert_eq!(service.get_config().analyzer.max_validation_retries, 2);
    }
}
