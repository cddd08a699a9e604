//! Errors raised while loading or validating an [`AppConfig`](super::AppConfig)

use std::fmt;
use thiserror::Error;

/// Failure to produce a usable configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse '{path}' (line {}, column {}): {message}",
            .line.unwrap_or(0), .column.unwrap_or(0))]
    ParseError {
        path: String,
        line: Option<usize>,
        column: Option<usize>,
        message: String,
    },

    #[error("invalid configuration: {0}")]
    ValidationError(#[from] ValidationError),

    #[error("config references unset environment variable '{var}'")]
    EnvVarNotFound { var: String },

    #[error("{var}='{value}' is not valid, expected {expected}")]
    InvalidEnvValue {
        var: String,
        value: String,
        expected: String,
    },
}

/// A single rejected field, addressed by its dotted path (`openai.base_url`)
#[derive(Debug, Error)]
pub struct ValidationError {
    pub field_path: String,
    pub kind: ValidationErrorKind,
    /// Hint shown after the message
    pub context: Option<String>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field_path, self.kind)?;
        match &self.context {
            Some(hint) => write!(f, " ({hint})"),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Error)]
pub enum ValidationErrorKind {
    #[error("must not be empty")]
    RequiredFieldMissing,

    #[error("{message}")]
    OutOfRange { message: String },

    #[error("malformed value: {message}")]
    InvalidFormat { message: String },

    #[error("not a usable http(s) URL: {message}")]
    InvalidUrl { message: String },

    #[error("config version {actual} is not supported (expected {expected})")]
    InvalidVersion { expected: String, actual: String },

    #[error("placeholder {placeholder} was never resolved")]
    UnresolvedPlaceholder { placeholder: String },
}

impl ValidationError {
    pub fn new(field_path: impl Into<String>, kind: ValidationErrorKind) -> Self {
        Self {
            field_path: field_path.into(),
            kind,
            context: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn required(field_path: impl Into<String>) -> Self {
        Self::new(field_path, ValidationErrorKind::RequiredFieldMissing)
    }

    pub fn out_of_range(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(field_path, ValidationErrorKind::OutOfRange { message })
    }

    pub fn invalid_format(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(field_path, ValidationErrorKind::InvalidFormat { message })
    }

    pub fn invalid_url(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(field_path, ValidationErrorKind::InvalidUrl { message })
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
