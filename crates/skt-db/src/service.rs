//! Service layer orchestrating database mutations with the audit trail.
//!
//! `SktService` wraps `SktDb` (raw database access) plus the settings the
//! background jobs need. All repo methods are implemented as `impl SktService`
//! blocks, one file per entity under `repos/`.

use std::path::{Path, PathBuf};

use skt_config::SktConfig;

use crate::SktDb;
use crate::error::DatabaseError;

/// Orchestrates database mutations with the audit trail.
///
/// Every mutation method follows this protocol:
/// 1. Validate references (programme or beneficiary exists)
/// 2. Execute SQL
/// 3. Append an audit event
pub struct SktService {
    db: SktDb,
    export_dir: Option<PathBuf>,
}

impl SktService {
    /// Create a new service wrapping a local database.
    ///
    /// # Arguments
    ///
    /// * `db_path` - Path to the libSQL database file, or `":memory:"` for tests.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn new_local(db_path: &str) -> Result<Self, DatabaseError> {
        let db = SktDb::open_local(db_path).await?;
        Ok(Self::from_db(db))
    }

    /// Open the database named by `config.database.path`, creating its parent
    /// directory if needed, and apply the job settings.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the directory cannot be created or the
    /// database cannot be opened.
    pub async fn from_config(config: &SktConfig) -> Result<Self, DatabaseError> {
        if !config.database.is_in_memory() {
            if let Some(parent) = Path::new(&config.database.path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        DatabaseError::Other(anyhow::anyhow!(
                            "failed to create database directory {}: {e}",
                            parent.display()
                        ))
                    })?;
                }
            }
        }
        let svc = Self::new_local(&config.database.path).await?;
        Ok(svc.with_export_dir(config.jobs.export_dir()))
    }

    /// Create from an existing `SktDb` (for testing).
    #[must_use]
    pub const fn from_db(db: SktDb) -> Self {
        Self {
            db,
            export_dir: None,
        }
    }

    /// Write rendered exports beneath `dir`. `None` disables writing.
    #[must_use]
    pub fn with_export_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.export_dir = dir;
        self
    }

    /// Access the underlying database handle.
    #[must_use]
    pub const fn db(&self) -> &SktDb {
        &self.db
    }

    /// Directory rendered exports are written beneath, if any.
    #[must_use]
    pub fn export_dir(&self) -> Option<&Path> {
        self.export_dir.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn new_local_in_memory() {
        let svc = SktService::new_local(":memory:").await.unwrap();
        assert!(svc.export_dir().is_none());
        svc.db().ping().await.unwrap();
    }

    #[tokio::test]
    async fn from_config_creates_parent_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = SktConfig::default();
        config.database.path = dir
            .path()
            .join("nested/portal.db")
            .to_string_lossy()
            .into_owned();
        config.jobs.export_dir = dir.path().join("out").to_string_lossy().into_owned();

        let svc = SktService::from_config(&config).await.unwrap();
        assert!(dir.path().join("nested").is_dir());
        assert_eq!(svc.export_dir(), Some(dir.path().join("out").as_path()));
    }
}
