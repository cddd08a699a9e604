//! Configuration validation utilities

use super::error::{ValidationError, ValidationErrorKind};
use super::schema::AppConfig;
use regex::Regex;

/// Configuration validator with additional validation rules
pub struct ConfigValidator {
    /// Pattern for environment variable placeholders
    env_var_pattern: Regex,
    /// Pattern for sensitive field names
    sensitive_pattern: Regex,
    /// Pattern for reasoning tag names
    tag_pattern: Regex,
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigValidator {
    /// Create a new validator
    pub fn new() -> Self {
        Self {
            env_var_pattern: Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("valid regex"),
            sensitive_pattern: Regex::new(r"(?i)(api_key|secret|token|password|credential)")
                .expect("valid regex"),
            tag_pattern: Regex::new(r"^[A-Za-z][A-Za-z0-9_-]*$").expect("valid regex"),
        }
    }

    /// Validate a configuration with extended rules
    pub fn validate(&self, config: &AppConfig) -> Result<(), ValidationError> {
        // Placeholders first: an unresolved `${VAR}` makes the URL checks misleading.
        self.validate_resolved(config)?;
        config.validate()?;
        self.validate_reasoning_tag(config)?;

        Ok(())
    }

    /// Every `${VAR}` must have been interpolated by now
    fn validate_resolved(&self, config: &AppConfig) -> Result<(), ValidationError> {
        let fields = [
            ("backend.base_url", Some(config.backend.base_url.as_str())),
            ("openai.base_url", Some(config.openai.base_url.as_str())),
            (
                "openai.api_key",
                config.openai.api_key.as_ref().map(|k| k.expose_secret()),
            ),
            (
                "backend.api_key",
                config.backend.api_key.as_ref().map(|k| k.expose_secret()),
            ),
        ];

        for (path, value) in fields {
            if let Some(var) = value.and_then(|v| self.extract_env_vars(v).into_iter().next()) {
                return Err(ValidationError::new(
                    path,
                    ValidationErrorKind::UnresolvedPlaceholder {
                        placeholder: format!("${{{}}}", var),
                    },
                ));
            }
        }

        Ok(())
    }

    /// Tag names end up inside `<…>` delimiters, so keep them to word characters
    fn validate_reasoning_tag(&self, config: &AppConfig) -> Result<(), ValidationError> {
        let tag = &config.reasoning.tag_name;
        if !self.tag_pattern.is_match(tag) {
            return Err(ValidationError::invalid_format(
                "reasoning.tag_name",
                format!("'{}' is not a valid tag name", tag),
            )
            .with_context("Use letters, digits, '_' or '-', starting with a letter"));
        }
        Ok(())
    }

    /// Check if a field name appears to contain sensitive information
    pub fn is_sensitive_field(&self, field_name: &str) -> bool {
        self.sensitive_pattern.is_match(field_name)
    }

    /// Extract environment variables from a string
    pub fn extract_env_vars(&self, text: &str) -> Vec<String> {
        self.env_var_pattern
            .captures_iter(text)
            .map(|cap| cap[1].to_string())
            .collect()
    }
}
