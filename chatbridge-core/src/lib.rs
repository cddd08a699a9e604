//! Chatbridge Core Library
//!
//! This crate wires logical model names to concrete language-model handles and
//! adapts backend streaming chunks into the stream parts consumed by a chat UI.

pub mod config;
pub mod http;
pub mod protocol;
pub mod providers;
pub mod stream;

pub use config::AppConfig;
pub use protocol::{BackendChunk, ChatRequest, FinishReason, Message, StreamPart, Usage};
pub use providers::{LanguageModel, ProviderError, ProviderRegistry, ProviderResult};

/// Returns the version of the Chatbridge Core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
