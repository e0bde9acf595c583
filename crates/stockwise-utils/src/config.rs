//! Configuration management utilities
//!
//! Configuration is read from the process environment once, at startup, and
//! then handed to the relay and the quote aggregator as plain structs. Nothing
//! downstream of these constructors reads the environment again.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_MAX_TOKENS: usize = 512;
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 60;

const DEFAULT_POLYGON_API_BASE: &str = "https://api.polygon.io";
const DEFAULT_POLYGON_RATE_LIMIT: u32 = 5;
const DEFAULT_POLYGON_TIMEOUT_SECS: u64 = 30;

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable is not set
    #[error("{0} environment variable not set")]
    Missing(&'static str),

    /// A variable is set but could not be parsed
    #[error("Invalid value for {name}: {detail}")]
    Invalid { name: &'static str, detail: String },
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// LLM provider used by the relay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI chat completions (or any compatible endpoint)
    #[default]
    OpenAI,
    /// Google Gemini `generateContent`
    Gemini,
}

impl ProviderKind {
    /// Model used when none is configured
    pub fn default_model(self) -> &'static str {
        match self {
            Self::OpenAI => "gpt-4o-mini",
            Self::Gemini => "gemini-2.0-flash-lite",
        }
    }

    /// Base URL used when none is configured
    pub fn default_api_base(self) -> &'static str {
        match self {
            Self::OpenAI => "https://api.openai.com/v1",
            Self::Gemini => "https://generativelanguage.googleapis.com/v1beta",
        }
    }

    fn key_var(self) -> &'static str {
        match self {
            Self::OpenAI => "OPENAI_API_KEY",
            Self::Gemini => "GEMINI_API_KEY",
        }
    }

    fn base_var(self) -> &'static str {
        match self {
            Self::OpenAI => "OPENAI_API_BASE",
            Self::Gemini => "GEMINI_API_BASE",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "gemini" => Ok(Self::Gemini),
            other => Err(ConfigError::Invalid {
                name: "STOCKWISE_PROVIDER",
                detail: format!("unknown provider '{other}', expected 'openai' or 'gemini'"),
            }),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenAI => f.write_str("openai"),
            Self::Gemini => f.write_str("gemini"),
        }
    }
}

/// Configuration for the report relay
#[derive(Clone)]
pub struct RelayConfig {
    /// Address the HTTP server listens on
    pub bind_addr: SocketAddr,

    /// Which upstream provider to call
    pub provider: ProviderKind,

    /// Provider model identifier
    pub model: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Maximum tokens the provider may generate
    pub max_tokens: usize,

    /// Upper bound on a single upstream call
    pub upstream_timeout: Duration,

    /// Provider API base URL
    pub api_base: Url,

    /// Provider credential
    pub api_key: String,
}

impl RelayConfig {
    /// Create a config for `provider` with the given key and default settings
    pub fn new(provider: ProviderKind, api_key: impl Into<String>) -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8787)),
            provider,
            model: provider.default_model().to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            upstream_timeout: Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
            api_base: Url::parse(provider.default_api_base())
                .expect("default API base is a valid URL"),
            api_key: api_key.into(),
        }
    }

    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let provider = match lookup("STOCKWISE_PROVIDER") {
            Some(v) => v.parse()?,
            None => ProviderKind::default(),
        };

        let api_key = lookup(provider.key_var())
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::Missing(provider.key_var()))?;

        let mut config = Self::new(provider, api_key);

        if let Some(bind) = lookup("STOCKWISE_BIND") {
            config.bind_addr = parse_value("STOCKWISE_BIND", &bind)?;
        }
        if let Some(model) = lookup("STOCKWISE_MODEL") {
            config.model = model;
        }
        if let Some(t) = lookup("STOCKWISE_TEMPERATURE") {
            config.temperature = parse_value("STOCKWISE_TEMPERATURE", &t)?;
        }
        if let Some(n) = lookup("STOCKWISE_MAX_TOKENS") {
            config.max_tokens = parse_value("STOCKWISE_MAX_TOKENS", &n)?;
        }
        if let Some(secs) = lookup("STOCKWISE_UPSTREAM_TIMEOUT") {
            config.upstream_timeout =
                Duration::from_secs(parse_value("STOCKWISE_UPSTREAM_TIMEOUT", &secs)?);
        }
        if let Some(base) = lookup(provider.base_var()) {
            config.api_base = parse_url(provider.base_var(), &base)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Set the listen address
    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set the model identifier
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the upstream timeout
    pub fn with_upstream_timeout(mut self, timeout: Duration) -> Self {
        self.upstream_timeout = timeout;
        self
    }

    /// Set the provider API base URL
    pub fn with_api_base(mut self, api_base: Url) -> Self {
        self.api_base = api_base;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid {
                name: "STOCKWISE_MODEL",
                detail: "model must not be empty".to_string(),
            });
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::Invalid {
                name: "STOCKWISE_TEMPERATURE",
                detail: format!("{} is outside 0.0..=2.0", self.temperature),
            });
        }

        if self.max_tokens == 0 {
            return Err(ConfigError::Invalid {
                name: "STOCKWISE_MAX_TOKENS",
                detail: "must be greater than 0".to_string(),
            });
        }

        if self.upstream_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                name: "STOCKWISE_UPSTREAM_TIMEOUT",
                detail: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

// The API key is deliberately left out of Debug output.
impl fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayConfig")
            .field("bind_addr", &self.bind_addr)
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("upstream_timeout", &self.upstream_timeout)
            .field("api_base", &self.api_base.as_str())
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Configuration for the Polygon quote client
#[derive(Clone)]
pub struct QuoteConfig {
    /// Polygon API key
    pub api_key: String,

    /// Polygon API base URL
    pub api_base: Url,

    /// Maximum requests per minute
    pub rate_limit_per_minute: u32,

    /// Request timeout duration
    pub request_timeout: Duration,
}

impl QuoteConfig {
    /// Create a new configuration builder
    pub fn builder() -> QuoteConfigBuilder {
        QuoteConfigBuilder::default()
    }

    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::builder();

        if let Some(key) = lookup("POLYGON_API_KEY") {
            builder = builder.api_key(key);
        }
        if let Some(base) = lookup("POLYGON_API_BASE") {
            builder = builder.api_base(parse_url("POLYGON_API_BASE", &base)?);
        }
        if let Some(limit) = lookup("POLYGON_RATE_LIMIT") {
            builder = builder.rate_limit_per_minute(parse_value("POLYGON_RATE_LIMIT", &limit)?);
        }

        builder.build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::Missing("POLYGON_API_KEY"));
        }

        if self.rate_limit_per_minute == 0 {
            return Err(ConfigError::Invalid {
                name: "POLYGON_RATE_LIMIT",
                detail: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

impl fmt::Debug for QuoteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuoteConfig")
            .field("api_base", &self.api_base.as_str())
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .field("request_timeout", &self.request_timeout)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Builder for QuoteConfig
#[derive(Debug, Default)]
pub struct QuoteConfigBuilder {
    api_key: Option<String>,
    api_base: Option<Url>,
    rate_limit_per_minute: Option<u32>,
    request_timeout: Option<Duration>,
}

impl QuoteConfigBuilder {
    /// Set the Polygon API key
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the API base URL
    pub fn api_base(mut self, base: Url) -> Self {
        self.api_base = Some(base);
        self
    }

    /// Set the request rate limit
    pub fn rate_limit_per_minute(mut self, limit: u32) -> Self {
        self.rate_limit_per_minute = Some(limit);
        self
    }

    /// Set request timeout
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.request_timeout = Some(duration);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<QuoteConfig> {
        let api_base = match self.api_base {
            Some(base) => base,
            None => parse_url("POLYGON_API_BASE", DEFAULT_POLYGON_API_BASE)?,
        };

        let config = QuoteConfig {
            api_key: self.api_key.unwrap_or_default(),
            api_base,
            rate_limit_per_minute: self
                .rate_limit_per_minute
                .unwrap_or(DEFAULT_POLYGON_RATE_LIMIT),
            request_timeout: self
                .request_timeout
                .unwrap_or(Duration::from_secs(DEFAULT_POLYGON_TIMEOUT_SECS)),
        };

        config.validate()?;
        Ok(config)
    }
}

fn parse_value<T>(name: &'static str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        name,
        detail: e.to_string(),
    })
}

fn parse_url(name: &'static str, raw: &str) -> Result<Url> {
    // Trailing slashes would otherwise double up when joining paths.
    Url::parse(raw.trim().trim_end_matches('/')).map_err(|e| ConfigError::Invalid {
        name,
        detail: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_relay_defaults() {
        let config = RelayConfig::new(ProviderKind::OpenAI, "sk-test");
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.temperature, 0.7);
        assert_eq!(config.upstream_timeout, Duration::from_secs(60));
        assert_eq!(config.api_base.as_str(), "https://api.openai.com/v1");
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8787");
        tokio_test::assert_ok!(config.validate());
    }

    #[test]
    fn test_relay_from_lookup() {
        let config = RelayConfig::from_lookup(lookup(&[
            ("STOCKWISE_PROVIDER", "gemini"),
            ("GEMINI_API_KEY", "g-key"),
            ("STOCKWISE_TEMPERATURE", "0.2"),
            ("STOCKWISE_UPSTREAM_TIMEOUT", "15"),
            ("STOCKWISE_BIND", "0.0.0.0:9000"),
        ]))
        .unwrap();

        assert_eq!(config.provider, ProviderKind::Gemini);
        assert_eq!(config.model, "gemini-2.0-flash-lite");
        assert_eq!(config.api_key, "g-key");
        assert_eq!(config.temperature, 0.2);
        assert_eq!(config.upstream_timeout, Duration::from_secs(15));
        assert_eq!(config.bind_addr.port(), 9000);
    }

    #[test]
    fn test_relay_missing_key() {
        let err = RelayConfig::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err.to_string(), "OPENAI_API_KEY environment variable not set");
    }

    #[test]
    fn test_relay_invalid_values() {
        let err = RelayConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk"),
            ("STOCKWISE_TEMPERATURE", "hot"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "STOCKWISE_TEMPERATURE", .. }));

        let err = RelayConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk"),
            ("STOCKWISE_PROVIDER", "llama"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("unknown provider 'llama'"));

        let config = RelayConfig::new(ProviderKind::OpenAI, "sk").with_temperature(3.5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_api_base_trailing_slash_trimmed() {
        let config = RelayConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk"),
            ("OPENAI_API_BASE", "http://localhost:1234/v1/"),
        ]))
        .unwrap();
        assert_eq!(config.api_base.as_str(), "http://localhost:1234/v1");
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = RelayConfig::new(ProviderKind::OpenAI, "sk-very-secret");
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-very-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_quote_config_builder() {
        let config = QuoteConfig::builder()
            .api_key("poly")
            .rate_limit_per_minute(100)
            .request_timeout(Duration::from_secs(5))
            .build()
            .unwrap();

        assert_eq!(config.rate_limit_per_minute, 100);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.api_base.as_str(), "https://api.polygon.io/");
    }

    #[test]
    fn test_quote_config_requires_key() {
        let err = QuoteConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("POLYGON_API_KEY")));

        let err = QuoteConfig::builder()
            .api_key("poly")
            .rate_limit_per_minute(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "POLYGON_RATE_LIMIT", .. }));
    }
}
