//! Model traits and call results
//!
//! Every concrete model (OpenAI chat, OpenAI responses, the native backend,
//! test stand-ins, middleware wrappers) implements one of these traits so the
//! registry can hand out `Arc<dyn LanguageModel>` / `Arc<dyn ImageModel>`.

use crate::protocol::{ChatRequest, FinishReason, StreamPart, Usage};
use crate::providers::error::ProviderResult;
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A boxed stream of parts, owning everything it borrows
pub type PartStream<T = StreamPart> = BoxStream<'static, ProviderResult<T>>;

/// Core trait for chat-capable models
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Provider name (e.g. "openai.chat")
    fn provider(&self) -> &str;

    /// Concrete model id at the provider
    fn model_id(&self) -> &str;

    /// Run a request to completion
    async fn do_generate(&self, request: &ChatRequest) -> ProviderResult<GenerateResult>;

    /// Run a request as a stream of parts
    async fn do_stream(&self, request: &ChatRequest) -> ProviderResult<StreamResult>;
}

/// Core trait for image generation models
#[async_trait]
pub trait ImageModel: Send + Sync {
    /// Provider name (e.g. "openai.image")
    fn provider(&self) -> &str;

    /// Concrete model id at the provider
    fn model_id(&self) -> &str;

    /// Generate images for a prompt
    async fn do_generate(&self, request: &ImageRequest) -> ProviderResult<ImageResult>;
}

/// What was sent upstream, for diagnostics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCall {
    /// Full request URL, if the call went over HTTP
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Request body as sent
    #[serde(default)]
    pub body: serde_json::Value,
}

/// What came back upstream, apart from the body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawResponse {
    /// Correlation id sent with the request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,

    /// Response headers
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

/// Result of a streaming call: the stream plus auxiliary call data
pub struct StreamResult<T = StreamPart> {
    /// The parts, in arrival order
    pub stream: PartStream<T>,

    /// Request as sent
    pub raw_call: RawCall,

    /// Response metadata
    pub raw_response: Option<RawResponse>,

    /// Non-fatal notes from the provider (unsupported settings and the like)
    pub warnings: Vec<String>,
}

impl<T: Send + 'static> StreamResult<T> {
    /// Wrap a stream with empty call metadata
    pub fn new(stream: PartStream<T>) -> Self {
        Self {
            stream,
            raw_call: RawCall::default(),
            raw_response: None,
            warnings: Vec::new(),
        }
    }

    /// Replace the stream, keeping every other field as is
    pub fn map_stream<U, F>(self, f: F) -> StreamResult<U>
    where
        F: FnOnce(PartStream<T>) -> PartStream<U>,
    {
        StreamResult {
            stream: f(self.stream),
            raw_call: self.raw_call,
            raw_response: self.raw_response,
            warnings: self.warnings,
        }
    }
}

impl<T> fmt::Debug for StreamResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamResult")
            .field("stream", &"<stream>")
            .field("raw_call", &self.raw_call)
            .field("raw_response", &self.raw_response)
            .field("warnings", &self.warnings)
            .finish()
    }
}

/// Result of a non-streaming call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateResult {
    /// Generated answer text
    pub text: String,

    /// Reasoning text, when a model or middleware separates it out
    pub reasoning: Option<String>,

    pub finish_reason: FinishReason,

    pub usage: Usage,

    pub raw_call: RawCall,

    pub raw_response: Option<RawResponse>,

    pub warnings: Vec<String>,
}

impl GenerateResult {
    /// Drain a part stream into a single result.
    ///
    /// Text and reasoning deltas are concatenated; the last finish part wins.
    /// The first stream error is returned as is.
    pub async fn collect(result: StreamResult) -> ProviderResult<Self> {
        let StreamResult {
            mut stream,
            raw_call,
            raw_response,
            warnings,
        } = result;

        let mut text = String::new();
        let mut reasoning: Option<String> = None;
        let mut finish_reason = FinishReason::Stop;
        let mut usage = Usage::unreported();

        while let Some(part) = stream.next().await {
            match part? {
                StreamPart::TextDelta { text_delta } => text.push_str(&text_delta),
                StreamPart::Reasoning { text_delta } => {
                    reasoning.get_or_insert_with(String::new).push_str(&text_delta)
                }
                StreamPart::Finish {
                    finish_reason: reason,
                    usage: reported,
                } => {
                    finish_reason = reason;
                    usage = reported;
                }
            }
        }

        Ok(Self {
            text,
            reasoning,
            finish_reason,
            usage,
            raw_call,
            raw_response,
            warnings,
        })
    }
}

/// Image generation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRequest {
    /// Text prompt describing the image
    pub prompt: String,

    /// Number of images to generate
    #[serde(default = "default_image_count")]
    pub n: u32,

    /// Size such as "1024x1024"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

fn default_image_count() -> u32 {
    1
}

impl ImageRequest {
    /// Create a request for a single image
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            n: default_image_count(),
            size: None,
        }
    }

    /// Set the image size
    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self
    }
}

/// One generated image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedImage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base64: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Prompt as rewritten by the provider, if it did so
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revised_prompt: Option<String>,
}

/// Result of an image generation call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageResult {
    pub images: Vec<GeneratedImage>,
    pub raw_response: Option<RawResponse>,
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::error::ProviderError;
    use futures::stream;

    fn parts(items: Vec<ProviderResult<StreamPart>>) -> StreamResult {
        StreamResult::new(stream::iter(items).boxed())
    }

    #[tokio::test]
    async fn test_collect_concatenates_deltas() {
        let result = parts(vec![
            Ok(StreamPart::reasoning("thinking")),
            Ok(StreamPart::text_delta("Hello, ")),
            Ok(StreamPart::text_delta("world")),
            Ok(StreamPart::finish(FinishReason::Length, Usage::new(2, 3))),
        ]);

        let generated = GenerateResult::collect(result).await.unwrap();
        assert_eq!(generated.text, "Hello, world");
        assert_eq!(generated.reasoning.as_deref(), Some("thinking"));
        assert_eq!(generated.finish_reason, FinishReason::Length);
        assert_eq!(generated.usage, Usage::new(2, 3));
    }

    #[tokio::test]
    async fn test_collect_returns_first_error() {
        let result = parts(vec![
            Ok(StreamPart::text_delta("partial")),
            Err(ProviderError::Stream("connection reset".to_string())),
            Ok(StreamPart::text_delta("never seen")),
        ]);

        let err = GenerateResult::collect(result).await.unwrap_err();
        assert!(matches!(err, ProviderError::Stream(_)));
    }

    #[test]
    fn test_map_stream_keeps_metadata() {
        let mut result = parts(vec![]);
        result.warnings.push("temperature ignored".to_string());
        result.raw_call.url = Some("http://localhost:8000/chat/completions".to_string());

        let mapped: StreamResult<String> =
            result.map_stream(|s| s.map(|p| p.map(|part| format!("{part:?}"))).boxed());
        assert_eq!(mapped.warnings, vec!["temperature ignored".to_string()]);
        assert_eq!(
            mapped.raw_call.url.as_deref(),
            Some("http://localhost:8000/chat/completions")
        );
    }
}
