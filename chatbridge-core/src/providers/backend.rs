//! Chat model for backends that emit native stream chunks
//!
//! The backend answers `POST /chat/completions` with server-sent events whose
//! `data:` payloads are `BackendChunk` JSON objects:
//!
//! ```text
//! data: {"type":"text","content":"Hel"}
//! data: {"type":"text","content":"lo"}
//! data: {"type":"finish","reason":"stop"}
//! data: [DONE]
//! ```
//!
//! Chunks are decoded here and translated by [`crate::stream::adapt_stream_result`].

use crate::config::SecretString;
use crate::http::{EventStream, HttpClient, RequestOptions};
use crate::protocol::{BackendChunk, ChatRequest};
use crate::providers::adapter::{GenerateResult, LanguageModel, PartStream, RawCall, StreamResult};
use crate::providers::error::{ProviderError, ProviderResult};
use crate::providers::openai::types::ChatCompletionRequest;
use crate::stream::adapt_stream_result;
use async_trait::async_trait;
use futures::StreamExt;
use std::collections::HashMap;
use tracing::debug;

const CHAT_PATH: &str = "chat/completions";

/// Language model speaking the native chunk protocol
pub struct BackendChatModel {
    model_id: String,
    base_url: String,
    api_key: Option<SecretString>,
    http: HttpClient,
}

impl BackendChatModel {
    /// Create a model for a backend at `base_url`
    pub fn new(base_url: impl Into<String>, model_id: impl Into<String>, http: HttpClient) -> Self {
        Self {
            model_id: model_id.into(),
            base_url: base_url.into(),
            api_key: None,
            http,
        }
    }

    /// Send a bearer token with every request
    pub fn with_api_key(mut self, api_key: Option<SecretString>) -> Self {
        self.api_key = api_key.filter(|k| !k.is_empty());
        self
    }

    fn url(&self) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), CHAT_PATH)
    }

    fn headers(&self) -> HashMap<String, String> {
        self.api_key
            .iter()
            .map(|key| {
                (
                    "Authorization".to_string(),
                    format!("Bearer {}", key.expose_secret()),
                )
            })
            .collect()
    }
}

/// Decode SSE payloads into backend chunks.
///
/// The first transport error or malformed payload is yielded and ends the
/// stream, the same way the chat-completions decoder behaves.
fn decode_chunks(mut events: EventStream) -> PartStream<BackendChunk> {
    async_stream::stream! {
        while let Some(event) = events.next().await {
            let data = match event {
                Ok(data) => data,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };

            match serde_json::from_str::<BackendChunk>(&data) {
                Ok(chunk) => yield Ok(chunk),
                Err(e) => {
                    yield Err(ProviderError::ParseError(format!(
                        "Invalid backend chunk '{}': {}",
                        data, e
                    )));
                    return;
                }
            }
        }
    }
    .boxed()
}

#[async_trait]
impl LanguageModel for BackendChatModel {
    fn provider(&self) -> &str {
        "backend.native"
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn do_generate(&self, request: &ChatRequest) -> ProviderResult<GenerateResult> {
        let result = self.do_stream(request).await?;
        GenerateResult::collect(result).await
    }

    async fn do_stream(&self, request: &ChatRequest) -> ProviderResult<StreamResult> {
        let url = self.url();
        let body = serde_json::to_value(ChatCompletionRequest::from_request(
            &self.model_id,
            request,
            true,
        ))?;
        debug!("Streaming native chunks from {}", url);

        let (events, raw_response) = self
            .http
            .post_event_stream(&url, &self.headers(), &body, &RequestOptions::new())
            .await?;

        let chunks = StreamResult {
            stream: decode_chunks(events),
            raw_call: RawCall {
                url: Some(url),
                body,
            },
            raw_response: Some(raw_response),
            warnings: Vec::new(),
        };

        Ok(adapt_stream_result(chunks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn events(items: &[&str]) -> EventStream {
        stream::iter(
            items
                .iter()
                .map(|s| Ok(s.to_string()))
                .collect::<Vec<ProviderResult<String>>>(),
        )
        .boxed()
    }

    #[tokio::test]
    async fn test_decode_chunks() {
        let chunks: Vec<BackendChunk> = decode_chunks(events(&[
            r#"{"type":"text","content":"Hi"}"#,
            r#"{"type":"heartbeat"}"#,
            r#"{"type":"finish"}"#,
        ]))
        .map(|c| c.unwrap())
        .collect()
        .await;

        assert_eq!(
            chunks,
            vec![
                BackendChunk::text("Hi"),
                BackendChunk::Unrecognized,
                BackendChunk::finish(None),
            ]
        );
    }

    #[tokio::test]
    async fn test_decode_chunks_stops_at_malformed_payload() {
        let chunks: Vec<ProviderResult<BackendChunk>> = decode_chunks(events(&[
            r#"{"type":"text","content":"before"}"#,
            r#"{"type":"text"}"#,
            r#"{"type":"text","content":"after"}"#,
        ]))
        .collect()
        .await;

        assert_eq!(chunks.len(), 2);
        assert!(matches!(&chunks[0], Ok(BackendChunk::Text { content }) if content == "before"));
        assert!(matches!(chunks[1], Err(ProviderError::ParseError(_))));
    }

    #[test]
    fn test_headers_without_key_are_empty() {
        let model = BackendChatModel::new(
            "http://localhost:8000/",
            "gpt-4o-mini",
            HttpClient::new().unwrap(),
        );
        assert!(model.headers().is_empty());
        assert_eq!(model.url(), "http://localhost:8000/chat/completions");

        let model = model.with_api_key(Some(SecretString::new("sk-local")));
        assert_eq!(model.headers()["Authorization"], "Bearer sk-local");
    }
}
