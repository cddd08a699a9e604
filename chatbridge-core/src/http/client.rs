//! HTTP client implementation using reqwest

use crate::config::ConnectionConfig;
use crate::http::error::map_http_error;
use crate::http::{RequestOptions, REQUEST_ID_HEADER};
use crate::providers::adapter::RawResponse;
use crate::providers::error::{ProviderError, ProviderResult};
use bytes::Bytes;
use eventsource_stream::Eventsource;
use futures::future;
use futures::stream::BoxStream;
use futures::{Stream, StreamExt, TryStreamExt};
use reqwest::{Client, ClientBuilder, RequestBuilder, Response};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Default user agent
const USER_AGENT: &str = concat!("chatbridge/", env!("CARGO_PKG_VERSION"));

/// Terminal data payload of OpenAI-style event streams
const DONE_SENTINEL: &str = "[DONE]";

/// Data payloads of a server-sent event stream, ending before `[DONE]`
pub type EventStream = BoxStream<'static, ProviderResult<String>>;

/// Shared HTTP client with connection pooling
#[derive(Clone)]
pub struct HttpClient {
    /// The underlying reqwest client
    client: Arc<Client>,

    /// Default timeout for non-streaming requests
    request_timeout: Duration,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> ProviderResult<Self> {
        Self::from_config(&ConnectionConfig::default())
    }

    /// Create a new HTTP client from connection settings
    pub fn from_config(config: &ConnectionConfig) -> ProviderResult<Self> {
        // No client-wide timeout: it would also cut off long-running streams.
        let client = ClientBuilder::new()
            .pool_max_idle_per_host(config.max_idle_per_host)
            .pool_idle_timeout(Duration::from_secs(config.keepalive_secs))
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .user_agent(USER_AGENT)
            .gzip(true)
            .build()
            .map_err(|e| {
                ProviderError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client: Arc::new(client),
            request_timeout: Duration::from_millis(config.request_timeout_ms),
        })
    }

    /// POST a JSON body and parse a JSON response
    pub async fn post_json(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
        body: &Value,
        options: &RequestOptions,
    ) -> ProviderResult<(Value, RawResponse)> {
        let timeout = options.timeout.unwrap_or(self.request_timeout);
        let builder = self.request(url, headers, body, options).timeout(timeout);
        let response = self.send(builder, url, options).await?;
        let raw = raw_response(&response, options);

        let value = response.json::<Value>().await.map_err(|e| {
            error!(
                "Failed to parse response from {} [request_id: {}]: {}",
                url, options.request_id, e
            );
            ProviderError::ParseError(format!(
                "Invalid response body: {} [request_id: {}]",
                e, options.request_id
            ))
        })?;

        Ok((value, raw))
    }

    /// POST a JSON body and open a server-sent event stream
    pub async fn post_event_stream(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
        body: &Value,
        options: &RequestOptions,
    ) -> ProviderResult<(EventStream, RawResponse)> {
        let mut builder = self
            .request(url, headers, body, options)
            .header("Accept", "text/event-stream");
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }

        let response = self.send(builder, url, options).await?;
        let raw = raw_response(&response, options);

        Ok((parse_event_stream(response.bytes_stream()), raw))
    }

    fn request(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
        body: &Value,
        options: &RequestOptions,
    ) -> RequestBuilder {
        debug!("Request URL: {} [request_id: {}]", url, options.request_id);

        let mut builder = self.client.post(url).json(body);
        for (key, value) in headers {
            builder = builder.header(key, value);
        }
        builder.header(REQUEST_ID_HEADER, options.request_id.to_string())
    }

    async fn send(
        &self,
        builder: RequestBuilder,
        url: &str,
        options: &RequestOptions,
    ) -> ProviderResult<Response> {
        let request_id = options.request_id;

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                warn!("Request timeout for {} [request_id: {}]", url, request_id);
                ProviderError::Timeout
            } else if e.is_connect() {
                error!("Connection error for {} [request_id: {}]: {}", url, request_id, e);
                ProviderError::Network(format!(
                    "Connection failed: {} [request_id: {}]",
                    e, request_id
                ))
            } else {
                error!("Request error for {} [request_id: {}]: {}", url, request_id, e);
                ProviderError::Network(format!("{} [request_id: {}]", e, request_id))
            }
        })?;

        let status = response.status();
        debug!("Response status: {} [request_id: {}]", status, request_id);

        if !status.is_success() {
            let headers = response.headers().clone();
            let body = response.text().await.ok();

            warn!(
                "Request failed with status {} for {} [request_id: {}]",
                status, url, request_id
            );

            return Err(map_http_error(status, Some(&headers), body, request_id));
        }

        Ok(response)
    }
}

/// Turn a byte stream into SSE data payloads.
///
/// Stops at the `[DONE]` sentinel. Transport and framing failures become
/// `ProviderError::Stream` items.
pub fn parse_event_stream<S>(stream: S) -> EventStream
where
    S: Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
{
    stream
        .eventsource()
        .map(|event| {
            event
                .map(|e| e.data)
                .map_err(|e| ProviderError::Stream(e.to_string()))
        })
        .try_take_while(|data| future::ready(Ok(data != DONE_SENTINEL)))
        .boxed()
}

fn raw_response(response: &Response, options: &RequestOptions) -> RawResponse {
    let headers = response
        .headers()
        .iter()
        .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
        .collect();

    RawResponse {
        request_id: Some(options.request_id.to_string()),
        headers,
    }
}
