//! Upload limits.

use serde::{Deserialize, Serialize};

/// 10 MiB.
const fn default_max_csv_bytes() -> usize {
    10 * 1024 * 1024
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadsConfig {
    /// Largest accepted CSV import, in bytes.
    #[serde(default = "default_max_csv_bytes")]
    pub max_csv_bytes: usize,
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            max_csv_bytes: default_max_csv_bytes(),
        }
    }
}
