//! Configuration module for Chatbridge
//!
//! `AppConfig` is built once at startup, from the environment or from a file,
//! and handed by reference to `ProviderRegistry::from_config`.

mod env;
mod error;
mod schema;
mod secrets;
mod validator;

pub use env::{
    parse_flag, BACKEND_PROTOCOL_VAR, BACKEND_URL_VAR, OPENAI_API_KEY_VAR, OPENAI_BASE_URL_VAR,
    TEST_MODE_VAR,
};
pub use error::{ConfigError, ConfigResult, ValidationError, ValidationErrorKind};
pub use schema::{
    AppConfig, BackendConfig, BackendProtocol, ConnectionConfig, Environment, ModelIds,
    OpenAIConfig, ReasoningConfig, CONFIG_VERSION,
};
pub use secrets::SecretString;
pub use validator::ConfigValidator;

use std::fs;
use std::path::Path;

/// Load a configuration from a YAML file
pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> ConfigResult<AppConfig> {
    let path = path.as_ref();
    let content = read_config(path)?;

    // Interpolate environment variables before parsing
    let interpolated = env::interpolate_env_vars(&content)?;

    let config: AppConfig =
        serde_yaml::from_str(&interpolated).map_err(|e| ConfigError::ParseError {
            path: path.to_string_lossy().to_string(),
            line: e.location().map(|l| l.line()),
            column: e.location().map(|l| l.column()),
            message: e.to_string(),
        })?;

    finish_loading(config)
}

/// Load a configuration from a JSON file
pub fn load_from_json<P: AsRef<Path>>(path: P) -> ConfigResult<AppConfig> {
    let path = path.as_ref();
    let content = read_config(path)?;

    let interpolated = env::interpolate_env_vars(&content)?;

    let config: AppConfig =
        serde_json::from_str(&interpolated).map_err(|e| ConfigError::ParseError {
            path: path.to_string_lossy().to_string(),
            line: Some(e.line()),
            column: Some(e.column()),
            message: e.to_string(),
        })?;

    finish_loading(config)
}

fn read_config(path: &Path) -> ConfigResult<String> {
    fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        path: path.to_string_lossy().to_string(),
        source: e,
    })
}

fn finish_loading(mut config: AppConfig) -> ConfigResult<AppConfig> {
    env::interpolate_config_env_vars(&mut config)?;

    ConfigValidator::new().validate(&config)?;
    tracing::debug!(environment = ?config.environment, "Loaded configuration file");
    Ok(config)
}
