//! HTTP error mapping utilities

use crate::providers::error::ProviderError;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use serde_json::Value;
use uuid::Uuid;

/// Map an HTTP status code and response body to a ProviderError
pub fn map_http_error(
    status: StatusCode,
    headers: Option<&HeaderMap>,
    body: Option<String>,
    request_id: Uuid,
) -> ProviderError {
    let error_details = body
        .as_ref()
        .and_then(|b| serde_json::from_str::<Value>(b).ok())
        .and_then(|v| extract_error_details(&v));

    let error_message = error_details
        .as_ref()
        .map(|d| d.message.clone())
        .or_else(|| body.clone().filter(|b| !b.is_empty()))
        .unwrap_or_else(|| format!("HTTP error {}", status.as_u16()));

    let message_with_id = format!("{} [request_id: {}]", error_message, request_id);

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ProviderError::Authentication(message_with_id)
        }

        StatusCode::TOO_MANY_REQUESTS => {
            let retry_after_secs = headers
                .and_then(|h| h.get(RETRY_AFTER))
                .and_then(|v| v.to_str().ok())
                .and_then(parse_retry_after)
                .or_else(|| error_details.and_then(|d| d.retry_after_seconds));

            ProviderError::RateLimit {
                message: message_with_id,
                retry_after_secs,
            }
        }

        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            ProviderError::InvalidRequest(message_with_id)
        }

        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ProviderError::Timeout,

        _ => ProviderError::Api {
            status: status.as_u16(),
            message: message_with_id,
        },
    }
}

/// Error details extracted from response body
struct ErrorDetails {
    message: String,
    retry_after_seconds: Option<u64>,
}

/// Extract error details from JSON response
fn extract_error_details(json: &Value) -> Option<ErrorDetails> {
    // OpenAI format: { "error": { "message": "...", "type": "...", "code": "..." } }
    if let Some(message) = json
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(|v| v.as_str())
    {
        return Some(ErrorDetails {
            message: message.to_string(),
            retry_after_seconds: json["error"].get("retry_after").and_then(|v| v.as_u64()),
        });
    }

    // FastAPI format: { "detail": "..." }
    if let Some(detail) = json.get("detail").and_then(|v| v.as_str()) {
        return Some(ErrorDetails {
            message: detail.to_string(),
            retry_after_seconds: None,
        });
    }

    // Generic formats: { "message": "..." } or { "error": "..." }
    if let Some(message) = json
        .get("message")
        .or_else(|| json.get("error"))
        .and_then(|v| v.as_str())
    {
        return Some(ErrorDetails {
            message: message.to_string(),
            retry_after_seconds: json.get("retry_after").and_then(|v| v.as_u64()),
        });
    }

    None
}

/// Parse a Retry-After header value given in seconds
pub fn parse_retry_after(header_value: &str) -> Option<u64> {
    header_value.trim().parse::<u64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_unauthorized_maps_to_authentication() {
        let body = r#"{"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}}"#;
        let err = map_http_error(
            StatusCode::UNAUTHORIZED,
            None,
            Some(body.to_string()),
            Uuid::nil(),
        );
        match err {
            ProviderError::Authentication(message) => {
                assert!(message.contains("Incorrect API key provided"));
                assert!(message.contains("request_id"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_rate_limit_reads_retry_after_header() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("12"));
        let err = map_http_error(StatusCode::TOO_MANY_REQUESTS, Some(&headers), None, Uuid::nil());
        assert!(matches!(
            err,
            ProviderError::RateLimit {
                retry_after_secs: Some(12),
                ..
            }
        ));
    }

    #[test]
    fn test_fastapi_detail_is_used() {
        let err = map_http_error(
            StatusCode::BAD_REQUEST,
            None,
            Some(r#"{"detail": "No user message found"}"#.to_string()),
            Uuid::nil(),
        );
        match err {
            ProviderError::InvalidRequest(message) => {
                assert!(message.starts_with("No user message found"))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_server_error_keeps_status() {
        let err = map_http_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            None,
            Some(r#"{"error": "boom"}"#.to_string()),
            Uuid::nil(),
        );
        assert!(matches!(err, ProviderError::Api { status: 500, .. }));
    }

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(parse_retry_after("30"), Some(30));
        assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), None);
    }
}
