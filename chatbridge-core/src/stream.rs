//! Backend stream adapter
//!
//! Rewrites a backend's native chunk stream into stream parts, one chunk at a
//! time. The adapter holds no state between chunks and never looks at errors:
//! an `Err` item from upstream comes out the other side unchanged and in place.
//!
//! Token usage is not part of the backend chunk protocol, so every finish part
//! produced here carries `Usage::unreported()` (all zeros). Consumers that need
//! real accounting must get it from somewhere else.

use crate::protocol::{BackendChunk, FinishReason, StreamPart, Usage};
use crate::providers::adapter::StreamResult;
use futures::future;
use futures::{Stream, StreamExt};

/// Translate one backend chunk into at most one stream part
pub fn translate_chunk(chunk: BackendChunk) -> Option<StreamPart> {
    match chunk {
        BackendChunk::Text { content } => Some(StreamPart::TextDelta {
            text_delta: content,
        }),
        BackendChunk::Finish { reason } => Some(StreamPart::Finish {
            finish_reason: FinishReason::from_backend(reason.as_deref()),
            usage: Usage::unreported(),
        }),
        BackendChunk::Unrecognized => {
            tracing::trace!("Dropping unrecognized backend chunk");
            None
        }
    }
}

/// Adapt a stream of backend chunks into a stream of parts.
///
/// Items are pulled from `upstream` only as the returned stream is polled, and
/// dropping the returned stream drops `upstream`.
pub fn adapt_backend_stream<S, E>(upstream: S) -> impl Stream<Item = Result<StreamPart, E>>
where
    S: Stream<Item = Result<BackendChunk, E>>,
{
    upstream.filter_map(|item| {
        future::ready(match item {
            Ok(chunk) => translate_chunk(chunk).map(Ok),
            Err(err) => Some(Err(err)),
        })
    })
}

/// Adapt the stream of a call result, passing every other field through
pub fn adapt_stream_result(result: StreamResult<BackendChunk>) -> StreamResult<StreamPart> {
    result.map_stream(|stream| adapt_backend_stream(stream).boxed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::adapter::RawCall;
    use crate::providers::error::{ProviderError, ProviderResult};
    use futures::stream;
    use serde_json::json;

    async fn adapt(chunks: Vec<BackendChunk>) -> Vec<StreamPart> {
        let upstream = stream::iter(chunks.into_iter().map(Ok::<_, ProviderError>));
        adapt_backend_stream(upstream)
            .map(|item| item.unwrap())
            .collect()
            .await
    }

    #[test]
    fn test_translate_text() {
        assert_eq!(
            translate_chunk(BackendChunk::text("hello")),
            Some(StreamPart::text_delta("hello"))
        );
    }

    #[test]
    fn test_translate_finish_with_length() {
        assert_eq!(
            translate_chunk(BackendChunk::finish(Some("length"))),
            Some(StreamPart::finish(FinishReason::Length, Usage::new(0, 0)))
        );
    }

    #[test]
    fn test_translate_finish_without_reason_defaults_to_stop() {
        assert_eq!(
            translate_chunk(BackendChunk::finish(None)),
            Some(StreamPart::finish(FinishReason::Stop, Usage::unreported()))
        );
    }

    #[test]
    fn test_translate_unrecognized_is_dropped() {
        let chunk: BackendChunk = serde_json::from_value(json!({"type": "debug"})).unwrap();
        assert_eq!(translate_chunk(chunk), None);
    }

    #[tokio::test]
    async fn test_sequence_is_order_preserved() {
        let parts = adapt(vec![
            BackendChunk::text("a"),
            BackendChunk::text("b"),
            BackendChunk::finish(None),
        ])
        .await;

        assert_eq!(
            parts,
            vec![
                StreamPart::text_delta("a"),
                StreamPart::text_delta("b"),
                StreamPart::finish(FinishReason::Stop, Usage::unreported()),
            ]
        );
    }

    #[tokio::test]
    async fn test_errors_pass_through_in_place() {
        let upstream = stream::iter(vec![
            Ok(BackendChunk::text("a")),
            Err("upstream failed"),
            Ok(BackendChunk::Unrecognized),
            Ok(BackendChunk::text("b")),
        ]);

        let items: Vec<Result<StreamPart, &str>> = adapt_backend_stream(upstream).collect().await;
        assert_eq!(
            items,
            vec![
                Ok(StreamPart::text_delta("a")),
                Err("upstream failed"),
                Ok(StreamPart::text_delta("b")),
            ]
        );
    }

    #[tokio::test]
    async fn test_adapt_stream_result_keeps_call_metadata() {
        let upstream: Vec<ProviderResult<BackendChunk>> = vec![Ok(BackendChunk::text("x"))];
        let mut result = StreamResult::new(stream::iter(upstream).boxed());
        result.raw_call = RawCall {
            url: Some("http://localhost:8000/chat/completions".to_string()),
            body: json!({"stream": true}),
        };
        result.warnings.push("top_p ignored".to_string());

        let adapted = adapt_stream_result(result);
        assert_eq!(adapted.raw_call.body, json!({"stream": true}));
        assert_eq!(adapted.warnings, vec!["top_p ignored".to_string()]);

        let parts: Vec<_> = adapted.stream.map(|p| p.unwrap()).collect().await;
        assert_eq!(parts, vec![StreamPart::text_delta("x")]);
    }
}
