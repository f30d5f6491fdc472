//! Path management for projpack
//!
//! ## Path Resolution Order
//!
//! 1. `PROJPACK_HOME` environment variable (if set)
//! 2. `<home>/.projpack`, with the home directory resolved by `directories`

use std::path::{Path, PathBuf};

use directories::BaseDirs;

use crate::error::PackError;

/// Environment variable that overrides the base directory
pub const HOME_ENV_VAR: &str = "PROJPACK_HOME";

/// Manages all paths used by projpack
#[derive(Debug, Clone)]
pub struct PackPaths {
    /// Base directory for profiles, logs and default backups
    base_dir: PathBuf,
}

impl PackPaths {
    /// Create a new PackPaths instance
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self, PackError> {
        let base_dir = match std::env::var_os(HOME_ENV_VAR) {
            Some(custom) if !custom.is_empty() => PathBuf::from(custom),
            _ => resolve_default_path()?,
        };

        Ok(Self { base_dir })
    }

    /// Create PackPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory (~/.projpack/ or equivalent)
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Get the default backup directory (~/.projpack/backups/)
    pub fn backup_dir(&self) -> PathBuf {
        self.base_dir.join("backups")
    }

    /// Get the log directory (~/.projpack/logs/)
    pub fn log_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }

    /// Get the path to the profile store
    pub fn profiles_file(&self) -> PathBuf {
        self.base_dir.join("profiles.json")
    }

    /// Ensure the base, backup and log directories exist
    pub fn ensure_directories(&self) -> Result<(), PackError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| PackError::Io(format!("Failed to create base directory: {}", e)))?;

        std::fs::create_dir_all(self.backup_dir())
            .map_err(|e| PackError::Io(format!("Failed to create backup directory: {}", e)))?;

        std::fs::create_dir_all(self.log_dir())
            .map_err(|e| PackError::Io(format!("Failed to create log directory: {}", e)))?;

        Ok(())
    }
}

fn resolve_default_path() -> Result<PathBuf, PackError> {
    let base = BaseDirs::new()
        .ok_or_else(|| PackError::Config("Could not determine home directory".into()))?;
    Ok(base.home_dir().join(".projpack"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_custom_base_dir() {
        let temp_dir = TempDir::new().unwrap();
        let paths = PackPaths::with_base_dir(temp_dir.path().to_path_buf());

        assert_eq!(paths.base_dir(), temp_dir.path());
        assert_eq!(paths.backup_dir(), temp_dir.path().join("backups"));
        assert_eq!(paths.log_dir(), temp_dir.path().join("logs"));
        assert_eq!(
            paths.profiles_file(),
            temp_dir.path().join("profiles.json")
        );
    }

    #[test]
    fn test_ensure_directories() {
        let temp_dir = TempDir::new().unwrap();
        let paths = PackPaths::with_base_dir(temp_dir.path().join("nested"));

        paths.ensure_directories().unwrap();

        assert!(paths.backup_dir().is_dir());
        assert!(paths.log_dir().is_dir());
    }
}
