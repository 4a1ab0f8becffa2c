// src/infra/config.rs — Configuration loading (TOML)

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::infra::paths;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub providers: ProvidersConfig,

    #[serde(default)]
    pub models: ModelsConfig,

    #[serde(default)]
    pub timeouts: TimeoutsConfig,

    #[serde(default)]
    pub quota: QuotaConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level filter; RUST_LOG wins when set.
    pub level: String,
    /// Emit one JSON object per event instead of compact lines.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    /// Optional bearer token required on every API request.
    pub api_token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8787,
            api_token: None,
        }
    }
}

/// Credentials for the external providers. Each one is optional: a missing
/// credential deactivates the stages that need it, it never crashes the
/// pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvidersConfig {
    pub openai_api_key: Option<String>,
    pub google_api_key: Option<String>,
    pub search_api_key: Option<String>,
    pub search_engine_id: Option<String>,
}

impl ProvidersConfig {
    /// Fill unset credentials from the process environment.
    pub fn with_env_fallback(mut self) -> Self {
        self.openai_api_key = self
            .openai_api_key
            .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        self.google_api_key = self
            .google_api_key
            .or_else(|| std::env::var("GEMINI_API_KEY").ok());
        self.search_api_key = self
            .search_api_key
            .or_else(|| std::env::var("SEARCH_API_KEY").ok());
        self.search_engine_id = self
            .search_engine_id
            .or_else(|| std::env::var("SEARCH_ENGINE_ID").ok());
        self
    }

    pub fn search_configured(&self) -> bool {
        self.search_api_key.is_some() && self.search_engine_id.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    pub primary: String,
    pub secondary: String,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            primary: "gpt-4o-mini".into(),
            secondary: "gemini-2.0-flash".into(),
        }
    }
}

/// One deliberate timeout per adapter type, replacing the scattered
/// per-endpoint values in earlier revisions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutsConfig {
    pub completion_secs: u64,
    pub search_secs: u64,
    pub knowledge_secs: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            completion_secs: 45,
            search_secs: 15,
            knowledge_secs: 5,
        }
    }
}

impl TimeoutsConfig {
    pub fn completion(&self) -> Duration {
        Duration::from_secs(self.completion_secs)
    }

    pub fn search(&self) -> Duration {
        Duration::from_secs(self.search_secs)
    }

    pub fn knowledge(&self) -> Duration {
        Duration::from_secs(self.knowledge_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaConfig {
    /// Free-tier diagnoses per user per day. Premium users are unlimited.
    pub daily_limit: i64,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self { daily_limit: 2 }
    }
}

impl Config {
    /// Load config from file, falling back to defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = paths::config_file_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_reasonable() {
        let c = Config::default();
        assert_eq!(c.server.port, 8787);
        assert!(c.server.api_token.is_none());
        assert_eq!(c.timeouts.completion_secs, 45);
        assert_eq!(c.timeouts.search_secs, 15);
        assert_eq!(c.quota.daily_limit, 2);
        assert_eq!(c.logging.level, "info");
        assert!(!c.logging.json);
    }

    #[test]
    fn test_timeout_durations() {
        let t = TimeoutsConfig::default();
        assert_eq!(t.completion(), Duration::from_secs(45));
        assert_eq!(t.search(), Duration::from_secs(15));
        assert_eq!(t.knowledge(), Duration::from_secs(5));
    }

    #[test]
    fn test_search_configured_requires_both_secrets() {
        let mut p = ProvidersConfig::default();
        assert!(!p.search_configured());
        p.search_api_key = Some("key".into());
        assert!(!p.search_configured());
        p.search_engine_id = Some("cx".into());
        assert!(p.search_configured());
    }

    #[test]
    fn test_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.quota.daily_limit, 2);
        assert_eq!(config.models.primary, "gpt-4o-mini");
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
[server]
port = 9000
api_token = "secret"

[providers]
openai_api_key = "sk-test"
search_api_key = "search-key"
search_engine_id = "cx-id"

[models]
primary = "gpt-4o"
secondary = "gemini-2.0-pro"

[timeouts]
completion_secs = 60
search_secs = 10
knowledge_secs = 3

[quota]
daily_limit = 5

[logging]
level = "debug"
json = true
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.api_token.as_deref(), Some("secret"));
        assert_eq!(config.providers.openai_api_key.as_deref(), Some("sk-test"));
        assert!(config.providers.search_configured());
        assert!(config.providers.google_api_key.is_none());
        assert_eq!(config.models.primary, "gpt-4o");
        assert_eq!(config.timeouts.completion_secs, 60);
        assert_eq!(config.quota.daily_limit, 5);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
    }

    #[test]
    fn test_serialize_roundtrip() {
        let config = Config::default();
        let serialized = toml::to_string(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(deserialized.server.port, config.server.port);
        assert_eq!(deserialized.quota.daily_limit, config.quota.daily_limit);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Config::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
    }
}
