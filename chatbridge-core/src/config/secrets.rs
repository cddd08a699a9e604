//! Secret values in configuration
//!
//! API keys are wrapped so that `Debug` and `Display` never print them, which
//! keeps them out of `tracing` output and error messages.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An API key or bearer token
#[derive(Clone, Deserialize, Serialize)]
#[serde(transparent)]
pub struct SecretString {
    value: String,
}

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// The raw value, for building request headers
    pub fn expose_secret(&self) -> &str {
        &self.value
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Enough of the key to tell two keys apart in logs
    pub fn partial_redact(&self) -> String {
        if self.value.is_empty() {
            return "[EMPTY]".to_string();
        }

        let len = self.value.len();
        if len <= 8 || !self.value.is_ascii() {
            "[REDACTED]".to_string()
        } else if self.value.starts_with("sk-") {
            format!("sk-...{}", &self.value[len - 4..])
        } else {
            format!("{}...{}", &self.value[..2], &self.value[len - 2..])
        }
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl PartialEq for SecretString {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_and_display_are_redacted() {
        let secret = SecretString::new("sk-abcdefghijklmnop");
        assert_eq!(format!("{:?}", secret), "[REDACTED]");
        assert_eq!(format!("{}", secret), "[REDACTED]");
        assert_eq!(secret.expose_secret(), "sk-abcdefghijklmnop");
    }

    #[test]
    fn test_partial_redact() {
        assert_eq!(SecretString::new("").partial_redact(), "[EMPTY]");
        assert_eq!(SecretString::new("short").partial_redact(), "[REDACTED]");
        assert_eq!(
            SecretString::new("sk-abcdefghijklmnop").partial_redact(),
            "sk-...mnop"
        );
        assert_eq!(SecretString::new("abcdefghijkl").partial_redact(), "ab...kl");
    }

    #[test]
    fn test_serializes_transparently() {
        let secret = SecretString::new("key");
        assert_eq!(serde_json::to_string(&secret).unwrap(), "\"key\"");
        let parsed: SecretString = serde_json::from_str("\"key\"").unwrap();
        assert_eq!(parsed, secret);
    }
}
