//! Background job configuration (evidence bundles and exports).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Days an evidence bundle stays downloadable when the request does not say.
const fn default_evidence_expiry_days() -> u32 {
    7
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JobsConfig {
    #[serde(default = "default_evidence_expiry_days")]
    pub evidence_expiry_days: u32,

    /// Directory that rendered exports are written beneath. Empty disables
    /// writing; jobs still record their `file_path`.
    #[serde(default)]
    pub export_dir: String,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            evidence_expiry_days: default_evidence_expiry_days(),
            export_dir: String::new(),
        }
    }
}

impl JobsConfig {
    /// The export directory, if one is configured.
    pub fn export_dir(&self) -> Option<PathBuf> {
        if self.export_dir.is_empty() {
            None
        } else {
            Some(PathBuf::from(&self.export_dir))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = JobsConfig::default();
        assert_eq!(config.evidence_expiry_days, 7);
        assert!(config.export_dir().is_none());
    }

    #[test]
    fn export_dir_when_set() {
        let config = JobsConfig {
            export_dir: "/var/lib/skilltrack".into(),
            ..JobsConfig::default()
        };
        assert_eq!(
            config.export_dir(),
            Some(PathBuf::from("/var/lib/skilltrack"))
        );
    }
}
