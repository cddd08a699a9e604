//! Environment variables: `${VAR}` interpolation and environment-only loading

use super::error::ConfigError;
use super::schema::{AppConfig, BackendProtocol, Environment};
use super::secrets::SecretString;
use regex::Regex;
use std::env;
use std::sync::LazyLock;

/// Selects the test provider set when truthy
pub const TEST_MODE_VAR: &str = "CHATBRIDGE_TEST_MODE";
/// Overrides `backend.base_url`
pub const BACKEND_URL_VAR: &str = "CHATBRIDGE_BACKEND_URL";
/// Overrides `backend.protocol` (`openai_chat` or `native`)
pub const BACKEND_PROTOCOL_VAR: &str = "CHATBRIDGE_BACKEND_PROTOCOL";
/// Sets `openai.api_key`
pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";
/// Overrides `openai.base_url`
pub const OPENAI_BASE_URL_VAR: &str = "OPENAI_BASE_URL";

static ENV_VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("env var pattern is a valid regex")
});

/// Interpolate environment variables in a configuration string
pub fn interpolate_env_vars(content: &str) -> Result<String, ConfigError> {
    let mut result = content.to_string();

    for cap in ENV_VAR_PATTERN.captures_iter(content) {
        let var_name = &cap[1];
        match env::var(var_name) {
            Ok(value) => result = result.replace(&cap[0], &value),
            Err(_) => {
                return Err(ConfigError::EnvVarNotFound {
                    var: var_name.to_string(),
                })
            }
        }
    }

    Ok(result)
}

/// Interpolate the fields of a loaded config that may still hold placeholders
pub fn interpolate_config_env_vars(config: &mut AppConfig) -> Result<(), ConfigError> {
    for key in [&mut config.openai.api_key, &mut config.backend.api_key]
        .into_iter()
        .flatten()
    {
        if ENV_VAR_PATTERN.is_match(key.expose_secret()) {
            *key = SecretString::new(interpolate_env_vars(key.expose_secret())?);
        }
    }

    for url in [&mut config.backend.base_url, &mut config.openai.base_url] {
        if ENV_VAR_PATTERN.is_match(url) {
            *url = interpolate_env_vars(url)?;
        }
    }

    Ok(())
}

/// Parse a boolean flag value
pub fn parse_flag(var: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnvValue {
            var: var.to_string(),
            value: value.to_string(),
            expected: "a boolean (1/0, true/false, yes/no, on/off)".to_string(),
        }),
    }
}

impl AppConfig {
    /// Build the configuration from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    ///
    /// Unset variables keep their defaults. The result is validated.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let test_mode = match lookup(TEST_MODE_VAR) {
            Some(value) => parse_flag(TEST_MODE_VAR, &value)?,
            None => false,
        };
        let environment = if test_mode {
            Environment::Test
        } else {
            Environment::Production
        };

        let mut config = AppConfig::new(environment);

        if let Some(url) = lookup(BACKEND_URL_VAR) {
            config.backend.base_url = url;
        }

        if let Some(protocol) = lookup(BACKEND_PROTOCOL_VAR) {
            config.backend.protocol = match protocol.trim() {
                "openai_chat" => BackendProtocol::OpenaiChat,
                "native" => BackendProtocol::Native,
                _ => {
                    return Err(ConfigError::InvalidEnvValue {
                        var: BACKEND_PROTOCOL_VAR.to_string(),
                        value: protocol,
                        expected: "openai_chat or native".to_string(),
                    })
                }
            };
        }

        if let Some(key) = lookup(OPENAI_API_KEY_VAR).filter(|k| !k.is_empty()) {
            config.openai.api_key = Some(SecretString::new(key));
        }

        if let Some(url) = lookup(OPENAI_BASE_URL_VAR) {
            config.openai.base_url = url;
        }

        super::validator::ConfigValidator::new().validate(&config)?;
        tracing::debug!(
            environment = ?config.environment,
            backend = %config.backend.base_url,
            "Loaded configuration from environment"
        );
        Ok(config)
    }
}
