//! Responses API model

use super::types::{ResponseObject, ResponsesEvent, ResponsesRequest};
use super::OpenAISettings;
use crate::http::{EventStream, RequestOptions};
use crate::protocol::{ChatRequest, FinishReason, StreamPart, Usage};
use crate::providers::adapter::{GenerateResult, LanguageModel, PartStream, RawCall, StreamResult};
use crate::providers::error::{ProviderError, ProviderResult};
use async_trait::async_trait;
use futures::StreamExt;
use std::sync::Arc;
use tracing::{debug, warn};

const RESPONSES_PATH: &str = "responses";

/// Model handle for `POST /responses`
pub struct OpenAIResponsesModel {
    model_id: String,
    provider: String,
    settings: Arc<OpenAISettings>,
}

impl OpenAIResponsesModel {
    pub(crate) fn new(model_id: impl Into<String>, settings: Arc<OpenAISettings>) -> Self {
        Self {
            model_id: model_id.into(),
            provider: settings.label("responses"),
            settings,
        }
    }

    fn raw_call(&self, request: &ChatRequest, stream: bool) -> ProviderResult<RawCall> {
        let body = ResponsesRequest::from_request(&self.model_id, request, stream);
        Ok(RawCall {
            url: Some(self.settings.url(RESPONSES_PATH)),
            body: serde_json::to_value(body)?,
        })
    }

    fn warnings(request: &ChatRequest) -> Vec<String> {
        match &request.stop {
            Some(_) => vec!["stop sequences are not supported by the responses API".to_string()],
            None => Vec::new(),
        }
    }
}

#[async_trait]
impl LanguageModel for OpenAIResponsesModel {
    fn provider(&self) -> &str {
        &self.provider
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn do_generate(&self, request: &ChatRequest) -> ProviderResult<GenerateResult> {
        let headers = self.settings.headers()?;
        let raw_call = self.raw_call(request, false)?;
        let url = self.settings.url(RESPONSES_PATH);

        let (value, raw_response) = self
            .settings
            .http()
            .post_json(&url, &headers, &raw_call.body, &RequestOptions::new())
            .await?;

        let response: ResponseObject = serde_json::from_value(value)
            .map_err(|e| ProviderError::ParseError(format!("Invalid response object: {}", e)))?;
        debug!(response_id = ?response.id, status = ?response.status, "Response received");

        if let Some(error) = &response.error {
            return Err(response_error(error.code.as_deref(), &error.message));
        }

        Ok(GenerateResult {
            text: response.output_text(),
            reasoning: None,
            finish_reason: response_finish_reason(&response),
            usage: response.usage.map(Usage::from).unwrap_or_default(),
            raw_call,
            raw_response: Some(raw_response),
            warnings: Self::warnings(request),
        })
    }

    async fn do_stream(&self, request: &ChatRequest) -> ProviderResult<StreamResult> {
        let headers = self.settings.headers()?;
        let raw_call = self.raw_call(request, true)?;
        let url = self.settings.url(RESPONSES_PATH);
        debug!("Streaming response from {} with model {}", url, self.model_id);

        let (events, raw_response) = self
            .settings
            .http()
            .post_event_stream(&url, &headers, &raw_call.body, &RequestOptions::new())
            .await?;

        Ok(StreamResult {
            stream: response_parts(events),
            raw_call,
            raw_response: Some(raw_response),
            warnings: Self::warnings(request),
        })
    }
}

/// Finish reason of a completed or incomplete response
fn response_finish_reason(response: &ResponseObject) -> FinishReason {
    match response.status.as_deref() {
        Some("incomplete") => FinishReason::parse(
            response
                .incomplete_details
                .as_ref()
                .and_then(|d| d.reason.as_deref())
                .or(Some("length")),
        ),
        Some("failed") => FinishReason::Error,
        _ => FinishReason::Stop,
    }
}

fn response_error(code: Option<&str>, message: &str) -> ProviderError {
    match code {
        Some(code) => ProviderError::Stream(format!("{}: {}", code, message)),
        None => ProviderError::Stream(message.to_string()),
    }
}

/// Turn response events into text deltas and one closing finish part
fn response_parts(mut events: EventStream) -> PartStream {
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

            let event: ResponsesEvent = match serde_json::from_str(&data) {
                Ok(event) => event,
                Err(e) => {
                    yield Err(ProviderError::ParseError(format!("Invalid response event: {}", e)));
                    return;
                }
            };

            match event {
                ResponsesEvent::OutputTextDelta { delta } => {
                    if !delta.is_empty() {
                        yield Ok(StreamPart::text_delta(delta));
                    }
                }
                ResponsesEvent::Completed { response } | ResponsesEvent::Incomplete { response } => {
                    finish_reason = response_finish_reason(&response);
                    if let Some(reported) = response.usage {
                        usage = reported.into();
                    }
                }
                ResponsesEvent::Failed { response } => {
                    let message = response
                        .error
                        .map(|e| response_error(e.code.as_deref(), &e.message))
                        .unwrap_or_else(|| ProviderError::Stream("Response failed".to_string()));
                    warn!("Response stream failed: {}", message);
                    yield Err(message);
                    return;
                }
                ResponsesEvent::Error { code, message } => {
                    yield Err(response_error(code.as_deref(), &message));
                    return;
                }
                ResponsesEvent::Other => {}
            }
        }

        yield Ok(StreamPart::finish(finish_reason, usage));
    };
    stream.boxed()
}
