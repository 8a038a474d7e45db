//! General application configuration.

use serde::{Deserialize, Serialize};

fn default_log_filter() -> String {
    "warn".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// Whether `insert_graph` decomposes networks into deduplicated rows by default.
    #[serde(default)]
    pub deep_decomposition: bool,

    /// Tracing filter used when `STRAND_LOG` is unset (e.g., "info", "strand_db=debug").
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            deep_decomposition: false,
            log_filter: default_log_filter(),
        }
    }
}
