//! Local libSQL database configuration.

use serde::{Deserialize, Serialize};

fn default_path() -> String {
    "strand.db".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Path of the database file. `:memory:` opens a throwaway in-memory store.
    #[serde(default = "default_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
        }
    }
}

impl DatabaseConfig {
    pub fn is_in_memory(&self) -> bool {
        self.path == ":memory:"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_file_in_working_dir() {
        let config = DatabaseConfig::default();
        assert_eq!(config.path, "strand.db");
        assert!(!config.is_in_memory());
    }
}
