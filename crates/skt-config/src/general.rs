//! General application configuration.

use serde::{Deserialize, Serialize};

/// Default page size for list endpoints that do not set their own.
const fn default_page_size() -> u32 {
    20
}

/// Upper bound for any requested `limit`.
const fn default_max_page_size() -> u32 {
    100
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneralConfig {
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}
