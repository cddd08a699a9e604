//! Configuration schema structures with serde support

use super::error::{ValidationError, ValidationErrorKind};
use super::secrets::SecretString;
use serde::{Deserialize, Serialize};

/// Schema version accepted by this crate
pub const CONFIG_VERSION: &str = "0.1";

/// Root configuration, built once at startup and passed by reference
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Schema version (required - no default)
    pub version: String,

    /// Which provider set backs the logical model names
    #[serde(default)]
    pub environment: Environment,

    /// The chat backend serving `chat-model`
    #[serde(default)]
    pub backend: BackendConfig,

    /// The OpenAI API serving every other production model
    #[serde(default)]
    pub openai: OpenAIConfig,

    /// Concrete model ids behind the logical names
    #[serde(default)]
    pub models: ModelIds,

    /// Reasoning extraction for `chat-model-reasoning`
    #[serde(default)]
    pub reasoning: ReasoningConfig,

    /// HTTP connection settings
    #[serde(default)]
    pub connection: ConnectionConfig,
}

/// Test mode swaps every model for a deterministic stand-in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Test,
    #[default]
    Production,
}

/// Chat backend settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    /// Base URL of the OpenAI-compatible backend
    #[serde(default = "default_backend_url")]
    pub base_url: String,

    /// Streaming format the backend speaks
    #[serde(default)]
    pub protocol: BackendProtocol,

    /// Key sent to the backend; falls back to `openai.api_key`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<SecretString>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
            protocol: BackendProtocol::default(),
            api_key: None,
        }
    }
}

/// Streaming format of the chat backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendProtocol {
    /// Chat-completions SSE (`choices[].delta.content`, `[DONE]`)
    #[default]
    OpenaiChat,
    /// Native `text` / `finish` chunks, run through the stream adapter
    Native,
}

/// OpenAI API settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OpenAIConfig {
    /// Base URL for the API
    #[serde(default = "default_openai_url")]
    pub base_url: String,

    /// API key. Optional here; a call without one fails at first use.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<SecretString>,

    /// Organization header value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_url(),
            api_key: None,
            organization: None,
        }
    }
}

/// Concrete model ids
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModelIds {
    #[serde(default = "default_language_model")]
    pub chat: String,

    #[serde(default = "default_language_model")]
    pub reasoning: String,

    #[serde(default = "default_language_model")]
    pub title: String,

    #[serde(default = "default_language_model")]
    pub artifact: String,

    #[serde(default = "default_image_model")]
    pub image: String,
}

impl Default for ModelIds {
    fn default() -> Self {
        Self {
            chat: default_language_model(),
            reasoning: default_language_model(),
            title: default_language_model(),
            artifact: default_language_model(),
            image: default_image_model(),
        }
    }
}

/// Reasoning extraction settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ReasoningConfig {
    /// Tag name delimiting reasoning, without angle brackets
    #[serde(default = "default_tag_name")]
    pub tag_name: String,
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            tag_name: default_tag_name(),
        }
    }
}

/// Connection configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionConfig {
    /// Connection timeout in milliseconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,

    /// Timeout for non-streaming requests in milliseconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    /// Maximum idle connections per host
    #[serde(default = "default_max_idle")]
    pub max_idle_per_host: usize,

    /// Keep-alive timeout in seconds
    #[serde(default = "default_keepalive")]
    pub keepalive_secs: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout(),
            request_timeout_ms: default_request_timeout(),
            max_idle_per_host: default_max_idle(),
            keepalive_secs: default_keepalive(),
        }
    }
}

// Default value functions for serde
fn default_backend_url() -> String { "http://localhost:8000".to_string() }
fn default_openai_url() -> String { "https://api.openai.com/v1".to_string() }
fn default_language_model() -> String { "gpt-4o-mini".to_string() }
fn default_image_model() -> String { "dall-e-3".to_string() }
fn default_tag_name() -> String { "think".to_string() }
fn default_connect_timeout() -> u64 { 10000 }
fn default_request_timeout() -> u64 { 60000 }
fn default_max_idle() -> usize { 10 }
fn default_keepalive() -> u64 { 90 }

impl AppConfig {
    /// Defaults for the given environment
    pub fn new(environment: Environment) -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            environment,
            backend: BackendConfig::default(),
            openai: OpenAIConfig::default(),
            models: ModelIds::default(),
            reasoning: ReasoningConfig::default(),
            connection: ConnectionConfig::default(),
        }
    }

    /// Whether the test provider set is selected
    pub fn is_test(&self) -> bool {
        self.environment == Environment::Test
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.version.is_empty() {
            return Err(ValidationError::required("version"));
        }

        if self.version != CONFIG_VERSION {
            return Err(ValidationError::new(
                "version",
                ValidationErrorKind::InvalidVersion {
                    expected: CONFIG_VERSION.to_string(),
                    actual: self.version.clone(),
                },
            ));
        }

        validate_http_url("backend.base_url", &self.backend.base_url)?;
        validate_http_url("openai.base_url", &self.openai.base_url)?;
        self.models.validate("models")?;

        if self.reasoning.tag_name.is_empty() {
            return Err(ValidationError::required("reasoning.tag_name"));
        }

        self.connection.validate("connection")?;

        Ok(())
    }
}

impl ModelIds {
    /// Every id must be non-empty
    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        let ids = [
            ("chat", &self.chat),
            ("reasoning", &self.reasoning),
            ("title", &self.title),
            ("artifact", &self.artifact),
            ("image", &self.image),
        ];
        for (field, id) in ids {
            if id.trim().is_empty() {
                return Err(ValidationError::required(format!("{}.{}", path, field)));
            }
        }
        Ok(())
    }
}

impl ConnectionConfig {
    /// Validate timeouts
    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        if self.connect_timeout_ms == 0 {
            return Err(ValidationError::out_of_range(
                format!("{}.connect_timeout_ms", path),
                "Must be greater than 0",
            ));
        }

        if self.request_timeout_ms == 0 {
            return Err(ValidationError::out_of_range(
                format!("{}.request_timeout_ms", path),
                "Must be greater than 0",
            ));
        }

        Ok(())
    }
}

fn validate_http_url(path: &str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::required(path));
    }

    match url::Url::parse(value) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Ok(()),
        Ok(url) => Err(ValidationError::invalid_url(
            path,
            format!("URL scheme must be http or https, got: {}", url.scheme()),
        )),
        Err(e) => Err(ValidationError::invalid_url(path, e.to_string())),
    }
}
