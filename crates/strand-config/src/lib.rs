//! # strand-config
//!
//! Layered configuration loading for Strand using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`STRAND_*` prefix, `__` as separator)
//! 2. Project-level `.strand/config.toml`
//! 3. User-level `~/.config/strand/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `STRAND_DATABASE__PATH` -> `database.path`,
//! `STRAND_RESOURCES__TIMEOUT_SECS` -> `resources.timeout_secs`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use strand_config::StrandConfig;
//!
//! let config = StrandConfig::load_with_dotenv().expect("config");
//! println!("database: {}", config.database.path);
//! ```

mod database;
mod error;
mod general;
mod resources;

pub use database::DatabaseConfig;
pub use error::ConfigError;
pub use general::GeneralConfig;
pub use resources::ResourcesConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StrandConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub resources: ResourcesConfig,
    #[serde(default)]
    pub general: GeneralConfig,
}

impl StrandConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy`; use [`Self::load_with_dotenv`] for `.env` support.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Figment` on malformed sources and
    /// `ConfigError::InvalidValue` when a value fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment().extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration after reading a `.env` file, if one is found.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`].
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        Self::load_dotenv_from_workspace();
        Self::load()
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests can add providers on top.
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = PathBuf::from(".strand/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed("STRAND_").split("__"))
    }

    /// Reject values that would only fail later, deep inside a store call.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.path.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "database.path".into(),
                reason: "must not be empty".into(),
            });
        }
        if self.resources.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "resources.timeout_secs".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.resources.default_encoding.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "resources.default_encoding".into(),
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("strand").join("config.toml"))
    }

    /// Walks up from `CARGO_MANIFEST_DIR` (if set) looking for `.env`, then
    /// falls back to the current directory. Missing files are ignored.
    fn load_dotenv_from_workspace() {
        if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
            let mut dir = PathBuf::from(manifest_dir);
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = StrandConfig::default();
        config.validate().unwrap();
        assert_eq!(config.database.path, "strand.db");
        assert!(!config.general.deep_decomposition);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut config = StrandConfig::default();
        config.resources.timeout_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { ref field, .. } if field == "resources.timeout_secs"
        ));
    }
}
