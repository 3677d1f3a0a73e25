//! # skt-config
//!
//! Layered configuration loading for SkillTrack using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`SKILLTRACK_*` prefix, `__` as separator)
//! 2. An explicit file passed with `--config`
//! 3. Project-level `.skilltrack/config.toml`
//! 4. User-level `~/.config/skilltrack/config.toml`
//! 5. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `SKILLTRACK_SERVER__PORT` -> `server.port`,
//! `SKILLTRACK_JOBS__EXPORT_DIR` -> `jobs.export_dir`, etc.
//! The `__` (double underscore) separates nested config sections.
//!
//! # Usage
//!
//! ```no_run
//! use skt_config::SktConfig;
//!
//! // Load from all sources (dotenvy + TOML + env):
//! let config = SktConfig::load_with_dotenv().expect("config");
//!
//! println!("listening on {}", config.server.bind_addr());
//! ```

mod database;
mod error;
mod general;
mod jobs;
mod server;
mod uploads;

pub use database::DatabaseConfig;
pub use error::ConfigError;
pub use general::GeneralConfig;
pub use jobs::JobsConfig;
pub use server::ServerConfig;
pub use uploads::UploadsConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "SKILLTRACK_";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SktConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub jobs: JobsConfig,
    #[serde(default)]
    pub uploads: UploadsConfig,
}

impl SktConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy` -- use [`Self::load_with_dotenv`] if you need `.env` file loading.
    pub fn load() -> Result<Self, ConfigError> {
        Self::extract(Self::figment(None))
    }

    /// Load configuration, layering `path` above the project and user files.
    ///
    /// Unlike the implicit files, an explicit path must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::MissingFile {
                path: path.display().to_string(),
            });
        }
        Self::extract(Self::figment(Some(path)))
    }

    /// Load configuration with `.env` file support.
    ///
    /// Calls `dotenvy` to load the `.env` file from the workspace root before
    /// building the figment. This is the typical entry point for the CLI.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        Self::load_dotenv_from_workspace();
        Self::load()
    }

    /// Build the figment provider chain.
    ///
    /// This is public so tests can inspect the figment directly or add
    /// additional providers on top.
    pub fn figment(explicit: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        // Layer 2: Project-local config
        let local_path = PathBuf::from(".skilltrack/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // Layer 3: --config
        if let Some(path) = explicit {
            figment = figment.merge(Toml::file(path));
        }

        // Layer 4: Environment variables (highest priority)
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    fn extract(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the service misbehave.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.general.max_page_size == 0 {
            return Err(invalid("general.max_page_size", "must be at least 1"));
        }
        if self.general.default_page_size == 0
            || self.general.default_page_size > self.general.max_page_size
        {
            return Err(invalid(
                "general.default_page_size",
                "must be between 1 and general.max_page_size",
            ));
        }
        if !(1..=365).contains(&self.jobs.evidence_expiry_days) {
            return Err(invalid("jobs.evidence_expiry_days", "must be between 1 and 365"));
        }
        if self.uploads.max_csv_bytes == 0 {
            return Err(invalid("uploads.max_csv_bytes", "must be greater than 0"));
        }
        if self.database.path.trim().is_empty() {
            return Err(invalid("database.path", "must not be empty"));
        }
        Ok(())
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("skilltrack").join("config.toml"))
    }

    /// Load `.env` from the workspace root.
    ///
    /// Walks up from `CARGO_MANIFEST_DIR` (if available) or current dir looking
    /// for a `.env` file. Silently does nothing if no `.env` is found.
    fn load_dotenv_from_workspace() {
        if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
            let mut dir = PathBuf::from(manifest_dir);
            // crate -> crates/ -> workspace root
            for _ in 0..3 {
                let env_path = dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                    return;
                }
                if !dir.pop() {
                    break;
                }
            }
        }

        let _ = dotenvy::dotenv();
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SktConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.jobs.evidence_expiry_days, 7);
    }

    #[test]
    fn figment_builds_without_files() {
        figment::Jail::expect_with(|_jail| {
            let config: SktConfig = SktConfig::figment(None).extract()?;
            assert_eq!(config.general.default_page_size, 20);
            assert_eq!(config.general.max_page_size, 100);
            Ok(())
        });
    }

    #[test]
    fn rejects_zero_max_page_size() {
        let mut config = SktConfig::default();
        config.general.max_page_size = 0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "general.max_page_size"));
    }

    #[test]
    fn rejects_default_page_size_above_max() {
        let mut config = SktConfig::default();
        config.general.default_page_size = 500;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_expiry() {
        let mut config = SktConfig::default();
        config.jobs.evidence_expiry_days = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = SktConfig::load_from(Path::new("/nonexistent/skilltrack.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::MissingFile { .. }));
    }
}
