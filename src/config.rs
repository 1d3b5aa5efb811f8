//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(default)]
    pub share: ShareConfig,

    #[serde(default)]
    pub about: AboutConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Hosted data and auth gateway configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Project base URL (e.g., "https://xyzcompany.example.co")
    #[serde(default = "default_gateway_url")]
    pub url: String,

    /// Public anonymous API key
    #[serde(default)]
    pub anon_key: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    /// Where the signed-in session token is kept between runs
    #[serde(default = "default_session_file")]
    pub session_file: Option<String>,
}

fn default_gateway_url() -> String {
    "http://localhost:54321".to_string()
}

fn default_request_timeout() -> u64 {
    10_000 // 10 seconds
}

fn default_session_file() -> Option<String> {
    dirs::data_local_dir().map(|p| {
        p.join("daybook")
            .join("session.json")
            .to_string_lossy()
            .to_string()
    })
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: default_gateway_url(),
            anon_key: String::new(),
            request_timeout_ms: default_request_timeout(),
            session_file: default_session_file(),
        }
    }
}

impl GatewayConfig {
    /// Configuration pointing at `url` with no persisted session
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            anon_key: anon_key.into(),
            request_timeout_ms: default_request_timeout(),
            session_file: None,
        }
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    /// Check that the gateway can be addressed at all
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::Invalid("gateway.url must not be empty".to_string()));
        }
        if self.anon_key.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "gateway.anon_key must not be empty (set DAYBOOK_GATEWAY_ANON_KEY)".to_string(),
            ));
        }
        Ok(())
    }
}

/// Sharing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ShareConfig {
    /// Public URL handed out when sharing
    #[serde(default = "default_share_url")]
    pub url: String,
}

fn default_share_url() -> String {
    "http://localhost:5173/".to_string()
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            url: default_share_url(),
        }
    }
}

/// Static biography shown on the About page
#[derive(Debug, Clone, Deserialize)]
pub struct AboutConfig {
    #[serde(default = "default_about_name")]
    pub name: String,

    #[serde(default = "default_about_paragraphs")]
    pub paragraphs: Vec<String>,

    /// Headline figures, e.g. "Experience" / "4+ Years"
    #[serde(default)]
    pub stats: Vec<AboutStat>,

    #[serde(default)]
    pub skills: Vec<String>,

    #[serde(default)]
    pub links: Vec<AboutLink>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AboutStat {
    pub label: String,
    pub value: String,
}

/// A labelled link on the About page
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AboutLink {
    pub label: String,
    pub url: String,
}

fn default_about_name() -> String {
    "The Author".to_string()
}

fn default_about_paragraphs() -> Vec<String> {
    vec!["One entry a day, written down before it slips away.".to_string()]
}

impl Default for AboutConfig {
    fn default() -> Self {
        Self {
            name: default_about_name(),
            paragraphs: default_about_paragraphs(),
            stats: Vec::new(),
            skills: Vec::new(),
            links: Vec::new(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("daybook").join("config.toml")),
            Some(PathBuf::from("./daybook.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("DAYBOOK_GATEWAY_URL") {
            self.gateway.url = url;
        }
        if let Ok(key) = std::env::var("DAYBOOK_GATEWAY_ANON_KEY") {
            self.gateway.anon_key = key;
        }
        if let Ok(timeout) = std::env::var("DAYBOOK_GATEWAY_TIMEOUT_MS") {
            if let Ok(ms) = timeout.parse() {
                self.gateway.request_timeout_ms = ms;
            }
        }

        if let Ok(url) = std::env::var("DAYBOOK_SHARE_URL") {
            self.share.url = url;
        }

        if let Ok(level) = std::env::var("DAYBOOK_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("DAYBOOK_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Daybook Configuration
#
# Environment variables override these settings:
# - DAYBOOK_GATEWAY_URL
# - DAYBOOK_GATEWAY_ANON_KEY
# - DAYBOOK_GATEWAY_TIMEOUT_MS
# - DAYBOOK_SHARE_URL
# - DAYBOOK_LOG_LEVEL
# - DAYBOOK_LOG_FORMAT

[gateway]
# Project URL of the hosted data and auth gateway
url = "http://localhost:54321"

# Public anonymous API key
anon_key = ""

# Request timeout in milliseconds
request_timeout_ms = 10000

# Where the signed-in session is remembered between runs
# session_file = "~/.local/share/daybook/session.json"

[share]
# Link handed out by the share command
url = "http://localhost:5173/"

[about]
name = "The Author"
paragraphs = ["One entry a day, written down before it slips away."]
skills = []

# [[about.stats]]
# label = "Experience"
# value = "4+ Years"

# [[about.links]]
# label = "GitHub"
# url = "https://github.com/"

[logging]
# Log level: trace, debug, info, warn, error
level = "warn"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
