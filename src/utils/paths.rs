//! Path Utilities
//!
//! Resolves the application directory (~/.log-triage/) and the files in it.

use std::path::{Path, PathBuf};

use crate::utils::error::{AppError, AppResult};

/// Get the user's home directory
pub fn home_dir() -> AppResult<PathBuf> {
    dirs::home_dir().ok_or_else(|| AppError::config("Could not determine home directory"))
}

/// Get the application directory (~/.log-triage/)
pub fn app_dir() -> AppResult<PathBuf> {
    Ok(home_dir()?.join(".log-triage"))
}

/// Get the config file path (~/.log-triage/config.json)
pub fn config_path() -> AppResult<PathBuf> {
    Ok(app_dir()?.join("config.json"))
}

/// Get the default database file path (~/.log-triage/logs.db)
pub fn database_path() -> AppResult<PathBuf> {
    Ok(app_dir()?.join("logs.db"))
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> AppResult<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Get the application directory, creating it if it doesn't exist
pub fn ensure_app_dir() -> AppResult<PathBuf> {
    let path = app_dir()?;
    ensure_dir(&path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_live_under_app_dir() {
        let dir = app_dir().unwrap();
        assert!(config_path().unwrap().starts_with(&dir));
        assert!(database_path().unwrap().starts_with(&dir));
        assert!(dir.ends_with(".log-triage"));
    }

    #[test]
    fn test_ensure_dir_creates_nested() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a").join("b");
        ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());
    }
}
