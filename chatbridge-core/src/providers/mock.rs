//! Deterministic stand-in models for test mode
//!
//! Each mock replays a fixed script of stream parts, so UI and end-to-end tests
//! see the same output on every run without network access.

use crate::protocol::{ChatRequest, FinishReason, StreamPart, Usage};
use crate::providers::adapter::{GenerateResult, LanguageModel, StreamResult};
use crate::providers::error::ProviderResult;
use async_trait::async_trait;
use futures::{stream, StreamExt};
use std::sync::Mutex;
use std::time::Duration;

/// A language model that replays scripted parts
pub struct MockLanguageModel {
    model_id: String,
    parts: Vec<StreamPart>,
    chunk_delay: Option<Duration>,
    last_request: Mutex<Option<ChatRequest>>,
}

impl MockLanguageModel {
    /// Create a mock that streams exactly `parts`
    pub fn new(model_id: impl Into<String>, parts: Vec<StreamPart>) -> Self {
        Self {
            model_id: model_id.into(),
            parts,
            chunk_delay: None,
            last_request: Mutex::new(None),
        }
    }

    /// Create a mock that streams `chunks` as text deltas, then finishes with `stop`
    pub fn from_text(model_id: impl Into<String>, chunks: &[&str]) -> Self {
        let mut parts: Vec<StreamPart> = chunks.iter().map(|c| StreamPart::text_delta(*c)).collect();
        parts.push(StreamPart::finish(FinishReason::Stop, Usage::new(3, 10)));
        Self::new(model_id, parts)
    }

    /// Sleep between parts, to exercise incremental rendering
    pub fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = Some(delay);
        self
    }

    /// The scripted parts
    pub fn parts(&self) -> &[StreamPart] {
        &self.parts
    }

    /// Most recent request seen by this model
    pub fn last_request(&self) -> Option<ChatRequest> {
        self.last_request.lock().ok().and_then(|guard| guard.clone())
    }

    fn record(&self, request: &ChatRequest) {
        if let Ok(mut guard) = self.last_request.lock() {
            *guard = Some(request.clone());
        }
    }
}

#[async_trait]
impl LanguageModel for MockLanguageModel {
    fn provider(&self) -> &str {
        "mock"
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn do_generate(&self, request: &ChatRequest) -> ProviderResult<GenerateResult> {
        let result = self.do_stream(request).await?;
        GenerateResult::collect(result).await
    }

    async fn do_stream(&self, request: &ChatRequest) -> ProviderResult<StreamResult> {
        self.record(request);
        let parts = stream::iter(self.parts.clone().into_iter().map(Ok));

        let stream = match self.chunk_delay {
            Some(delay) => parts
                .then(move |part| async move {
                    tokio::time::sleep(delay).await;
                    part
                })
                .boxed(),
            None => parts.boxed(),
        };

        Ok(StreamResult::new(stream))
    }
}

/// Stand-in for `chat-model`
pub fn chat_model() -> MockLanguageModel {
    MockLanguageModel::from_text("chat-model", &["Hello", ", ", "world!"])
}

/// Stand-in for `chat-model-reasoning`: emits reasoning before the answer
pub fn reasoning_model() -> MockLanguageModel {
    MockLanguageModel::new(
        "chat-model-reasoning",
        vec![
            StreamPart::reasoning("The user greeted me. "),
            StreamPart::reasoning("A short greeting back fits."),
            StreamPart::text_delta("Hello"),
            StreamPart::text_delta(", "),
            StreamPart::text_delta("world!"),
            StreamPart::finish(FinishReason::Stop, Usage::new(3, 10)),
        ],
    )
}

/// Stand-in for `title-model`
pub fn title_model() -> MockLanguageModel {
    MockLanguageModel::from_text("title-model", &["This is a test title"])
}

/// Stand-in for `artifact-model`
pub fn artifact_model() -> MockLanguageModel {
    MockLanguageModel::from_text(
        "artifact-model",
        &["# Test document\n\n", "This is a test artifact."],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Message;

    #[tokio::test]
    async fn test_chat_model_is_deterministic() {
        let model = chat_model();
        let request = ChatRequest::new(vec![Message::user("Hi")]);

        let first = model.do_generate(&request).await.unwrap();
        let second = model.do_generate(&request).await.unwrap();
        assert_eq!(first.text, "Hello, world!");
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_reasoning_model_generate() {
        let result = reasoning_model()
            .do_generate(&ChatRequest::new(vec![Message::user("Hi")]))
            .await
            .unwrap();
        assert_eq!(result.text, "Hello, world!");
        assert_eq!(
            result.reasoning.as_deref(),
            Some("The user greeted me. A short greeting back fits.")
        );
    }

    #[tokio::test]
    async fn test_chunk_delay_keeps_order() {
        let model = title_model().with_chunk_delay(Duration::from_millis(1));
        let result = model
            .do_stream(&ChatRequest::new(vec![Message::user("title?")]))
            .await
            .unwrap();
        let parts: Vec<_> = result.stream.map(|p| p.unwrap()).collect().await;
        assert_eq!(parts.as_slice(), model.parts());
    }

    #[tokio::test]
    async fn test_records_last_request() {
        let model = artifact_model();
        assert!(model.last_request().is_none());
        model
            .do_stream(&ChatRequest::new(vec![Message::user("write")]))
            .await
            .unwrap();
        assert_eq!(
            model.last_request().unwrap().last_user_message(),
            Some("write")
        );
    }
}
