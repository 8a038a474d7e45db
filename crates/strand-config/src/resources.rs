//! Remote resource fetching and vocabulary defaults.

use serde::{Deserialize, Serialize};

/// Default HTTP request timeout in seconds.
const fn default_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("strand/{}", env!("CARGO_PKG_VERSION"))
}

fn default_encoding() -> String {
    "ABCGMOPR".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResourcesConfig {
    /// Request timeout for resource downloads, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// `User-Agent` header sent with resource downloads.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Encoding given to namespace entries that declare none.
    #[serde(default = "default_encoding")]
    pub default_encoding: String,

    /// Namespace resource used for `GOCC` locations a network does not declare.
    /// Empty disables the fallback.
    #[serde(default)]
    pub location_fallback_url: String,
}

impl Default for ResourcesConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            default_encoding: default_encoding(),
            location_fallback_url: String::new(),
        }
    }
}

impl ResourcesConfig {
    pub fn has_location_fallback(&self) -> bool {
        !self.location_fallback_url.is_empty()
    }

    /// The fallback URL, if configured.
    pub fn location_fallback(&self) -> Option<&str> {
        self.has_location_fallback()
            .then_some(self.location_fallback_url.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = ResourcesConfig::default();
        assert_eq!(config.timeout_secs, 10);
        assert!(config.user_agent.starts_with("strand/"));
        assert_eq!(config.default_encoding, "ABCGMOPR");
        assert_eq!(config.location_fallback(), None);
    }

    #[test]
    fn fallback_when_url_set() {
        let config = ResourcesConfig {
            location_fallback_url: "https://resources.example.org/go-cc.belns".into(),
            ..Default::default()
        };
        assert_eq!(
            config.location_fallback(),
            Some("https://resources.example.org/go-cc.belns")
        );
    }
}
