//! Configuration management for tradehelper
//!
//! Supports environment variables, config files, and runtime overrides.
//!
//! Config file location: ~/.config/tradehelper/config.toml

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::core::error::{Result, TradeHelperError};

/// Main configuration for tradehelper
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Reasoning provider configuration
    #[serde(default)]
    pub llm: LlmConfig,
    /// Dialogue policy
    #[serde(default)]
    pub dialogue: DialogueConfig,
    /// Result cache location
    #[serde(default)]
    pub cache: CacheConfig,
    /// Finance data API configuration
    #[serde(default)]
    pub finance: FinanceConfig,
}

/// OpenAI-compatible chat completion endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// API base URL (default: https://api.openai.com/v1)
    pub base_url: String,
    /// API key, usually supplied through OPENAI_API_KEY
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// Model name
    /// Default: gpt-4o
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Turn budget, markers and timeouts for one analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogueConfig {
    /// Maximum initiator turns before the run stops
    /// Default: 10
    pub max_turns: usize,
    /// Wall-clock limit for a whole request in seconds
    pub request_timeout_secs: u64,
    /// Token the analyst emits once the report is complete
    pub terminal_marker: String,
    /// Substring identifying the analyst message that holds the report
    pub report_marker: String,
    /// Proxy reply when the analyst did not call a tool
    pub acknowledgement: String,
    /// Language the report is written in
    pub report_language: String,
}

/// Result cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Directory holding result_<SUBJECT>_<DATE>.{json,md}
    pub dir: PathBuf,
}

/// Finance data API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FinanceConfig {
    /// Finnhub API key, usually supplied through FINNHUB_API_KEY
    #[serde(default, skip_serializing)]
    pub finnhub_api_key: Option<String>,
    /// Finnhub REST base URL
    pub finnhub_url: String,
    /// Yahoo Finance chart endpoint base URL
    pub yahoo_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            api_key: env::var("OPENAI_API_KEY").ok(),
            model: env::var("TRADEHELPER_MODEL").unwrap_or_else(|_| "gpt-4o".to_string()),
            temperature: 0.0,
            timeout_secs: 120,
        }
    }
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            max_turns: env::var("TRADEHELPER_MAX_TURNS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            request_timeout_secs: env::var("TRADEHELPER_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(600),
            terminal_marker: "TERMINATE".to_string(),
            report_marker: "###".to_string(),
            acknowledgement: "Continue.".to_string(),
            report_language: "English".to_string(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: env::var("TRADEHELPER_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("results")),
        }
    }
}

impl Default for FinanceConfig {
    fn default() -> Self {
        Self {
            finnhub_api_key: env::var("FINNHUB_API_KEY").ok(),
            finnhub_url: "https://finnhub.io/api/v1".to_string(),
            yahoo_url: "https://query1.finance.yahoo.com/v8/finance/chart".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tradehelper")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from file, environment, and defaults
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load() -> Self {
        // Try to load .env file if it exists
        let _ = dotenvy::dotenv();

        let mut config = Self::load_from_file().unwrap_or_default();
        config.apply_env();
        config
    }

    /// Load configuration from file only
    pub fn load_from_file() -> Result<Self> {
        let config_path = Self::config_file();

        if !config_path.exists() {
            return Err(TradeHelperError::config("Config file not found"));
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|e| TradeHelperError::config(format!("Failed to read config: {}", e)))?;

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| TradeHelperError::config(format!("Failed to parse config: {}", e)))
    }

    /// Overlay environment variables on values read from the file
    fn apply_env(&mut self) {
        if let Ok(key) = env::var("OPENAI_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Ok(url) = env::var("OPENAI_BASE_URL") {
            self.llm.base_url = url;
        }
        if let Ok(model) = env::var("TRADEHELPER_MODEL") {
            self.llm.model = model;
        }
        if let Some(turns) = env::var("TRADEHELPER_MAX_TURNS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.dialogue.max_turns = turns;
        }
        if let Some(secs) = env::var("TRADEHELPER_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.dialogue.request_timeout_secs = secs;
        }
        if let Ok(dir) = env::var("TRADEHELPER_CACHE_DIR") {
            self.cache.dir = PathBuf::from(dir);
        }
        if let Ok(key) = env::var("FINNHUB_API_KEY") {
            self.finance.finnhub_api_key = Some(key);
        }
    }

    /// Whole-request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.dialogue.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_dialogue_policy() {
        let dialogue = DialogueConfig {
            max_turns: 10,
            request_timeout_secs: 600,
            ..DialogueConfig::default()
        };
        assert_eq!(dialogue.terminal_marker, "TERMINATE");
        assert_eq!(dialogue.report_marker, "###");
        assert!(!dialogue.acknowledgement.ends_with("TERMINATE"));
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config = Config::from_toml(
            r#"
            [dialogue]
            max_turns = 4
            request_timeout_secs = 30
            terminal_marker = "DONE"
            "#,
        )
        .unwrap();

        assert_eq!(config.dialogue.max_turns, 4);
        assert_eq!(config.dialogue.terminal_marker, "DONE");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.dialogue.report_marker, "###");
        assert!(!config.finance.finnhub_url.is_empty());
    }

    #[test]
    fn test_secrets_are_not_serialized() {
        let mut config = Config::default();
        config.llm.api_key = Some("sk-secret".to_string());
        config.finance.finnhub_api_key = Some("fh-secret".to_string());

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("model"));
        assert!(!toml_str.contains("sk-secret"));
        assert!(!toml_str.contains("fh-secret"));
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let err = Config::from_toml("[dialogue\nmax_turns = ").unwrap_err();
        assert!(matches!(err, TradeHelperError::Config(_)));
    }

    #[test]
    fn test_config_dir() {
        let dir = Config::config_dir();
        assert!(dir.to_string_lossy().contains("tradehelper"));
    }
}
