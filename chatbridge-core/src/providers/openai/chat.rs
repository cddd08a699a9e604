//! Chat completions model

use super::types::{ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse};
use super::OpenAISettings;
use crate::http::{EventStream, RequestOptions};
use crate::protocol::{ChatRequest, FinishReason, StreamPart, Usage};
use crate::providers::adapter::{
    GenerateResult, LanguageModel, PartStream, RawCall, StreamResult,
};
use crate::providers::error::{ProviderError, ProviderResult};
use async_trait::async_trait;
use futures::StreamExt;
use std::sync::Arc;
use tracing::debug;

const CHAT_PATH: &str = "chat/completions";

/// Model handle for `POST /chat/completions`
pub struct OpenAIChatModel {
    model_id: String,
    provider: String,
    settings: Arc<OpenAISettings>,
}

impl OpenAIChatModel {
    pub(crate) fn new(model_id: impl Into<String>, settings: Arc<OpenAISettings>) -> Self {
        Self {
            model_id: model_id.into(),
            provider: settings.label("chat"),
            settings,
        }
    }

    fn raw_call(&self, body: &ChatCompletionRequest) -> ProviderResult<RawCall> {
        Ok(RawCall {
            url: Some(self.settings.url(CHAT_PATH)),
            body: serde_json::to_value(body)?,
        })
    }
}

#[async_trait]
impl LanguageModel for OpenAIChatModel {
    fn provider(&self) -> &str {
        &self.provider
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn do_generate(&self, request: &ChatRequest) -> ProviderResult<GenerateResult> {
        let headers = self.settings.headers()?;
        let raw_call = self.raw_call(&ChatCompletionRequest::from_request(
            &self.model_id,
            request,
            false,
        ))?;
        let url = self.settings.url(CHAT_PATH);

        let (value, raw_response) = self
            .settings
            .http()
            .post_json(&url, &headers, &raw_call.body, &RequestOptions::new())
            .await?;

        let response: ChatCompletionResponse = serde_json::from_value(value)
            .map_err(|e| ProviderError::ParseError(format!("Invalid chat completion: {}", e)))?;
        debug!(response_id = ?response.id, "Chat completion received");

        let choice = response.choices.into_iter().next().ok_or_else(|| {
            ProviderError::ParseError("Chat completion contained no choices".to_string())
        })?;

        Ok(GenerateResult {
            text: choice.message.content.unwrap_or_default(),
            reasoning: None,
            finish_reason: FinishReason::parse(choice.finish_reason.as_deref()),
            usage: response.usage.map(Usage::from).unwrap_or_default(),
            raw_call,
            raw_response: Some(raw_response),
            warnings: Vec::new(),
        })
    }

    async fn do_stream(&self, request: &ChatRequest) -> ProviderResult<StreamResult> {
        let headers = self.settings.headers()?;
        let raw_call = self.raw_call(&ChatCompletionRequest::from_request(
            &self.model_id,
            request,
            true,
        ))?;
        let url = self.settings.url(CHAT_PATH);
        debug!("Streaming chat completion from {} with model {}", url, self.model_id);

        let (events, raw_response) = self
            .settings
            .http()
            .post_event_stream(&url, &headers, &raw_call.body, &RequestOptions::new())
            .await?;

        Ok(StreamResult {
            stream: chat_parts(events),
            raw_call,
            raw_response: Some(raw_response),
            warnings: Vec::new(),
        })
    }
}

/// Turn chat completion chunks into text deltas and one closing finish part
fn chat_parts(mut events: EventStream) -> PartStream {
    let stream = async_stream::stream! {
        let mut finish_reason = FinishReason::Stop;
        let mut usage = Usage::unreported();

        while let Some(event) = events.next().await {
            let data = match event {
                Ok(data) => data,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };

            let chunk: ChatCompletionChunk = match serde_json::from_str(&data) {
                Ok(chunk) => chunk,
                Err(e) => {
                    yield Err(ProviderError::ParseError(format!("Invalid chat chunk: {}", e)));
                    return;
                }
            };

            if let Some(reported) = chunk.usage {
                usage = reported.into();
            }

            for choice in chunk.choices {
                if let Some(reason) = choice.finish_reason {
                    finish_reason = FinishReason::parse(Some(&reason));
                }
                if let Some(content) = choice.delta.content.filter(|c| !c.is_empty()) {
                    yield Ok(StreamPart::text_delta(content));
                }
            }
        }

        yield Ok(StreamPart::finish(finish_reason, usage));
    };
    stream.boxed()
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
    async fn test_chat_parts_from_backend_deltas() {
        let parts: Vec<StreamPart> = chat_parts(events(&[
            r#"{"choices":[{"delta":{"content":"Hel"},"index":0}]}"#,
            r#"{"choices":[{"delta":{"content":"lo"},"index":0}]}"#,
        ]))
        .map(|p| p.unwrap())
        .collect()
        .await;

        assert_eq!(
            parts,
            vec![
                StreamPart::text_delta("Hel"),
                StreamPart::text_delta("lo"),
                StreamPart::finish(FinishReason::Stop, Usage::unreported()),
            ]
        );
    }

    #[tokio::test]
    async fn test_chat_parts_track_reason_and_usage() {
        let parts: Vec<StreamPart> = chat_parts(events(&[
            r#"{"choices":[{"delta":{"role":"assistant","content":""},"index":0}]}"#,
            r#"{"choices":[{"delta":{"content":"cut"},"index":0,"finish_reason":"length"}]}"#,
            r#"{"choices":[],"usage":{"prompt_tokens":4,"completion_tokens":1}}"#,
        ]))
        .map(|p| p.unwrap())
        .collect()
        .await;

        assert_eq!(
            parts,
            vec![
                StreamPart::text_delta("cut"),
                StreamPart::finish(FinishReason::Length, Usage::new(4, 1)),
            ]
        );
    }

    #[tokio::test]
    async fn test_chat_parts_stop_on_malformed_chunk() {
        let parts: Vec<ProviderResult<StreamPart>> = chat_parts(events(&[
            r#"{"choices":[{"delta":{"content":"ok"},"index":0}]}"#,
            "not json",
            r#"{"choices":[{"delta":{"content":"never"},"index":0}]}"#,
        ]))
        .collect()
        .await;

        assert_eq!(parts.len(), 2);
        assert!(matches!(parts[1], Err(ProviderError::ParseError(_))));
    }
}
