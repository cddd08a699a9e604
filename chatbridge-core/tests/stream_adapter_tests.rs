//! Integration tests for the backend stream adapter

use chatbridge_core::protocol::{BackendChunk, FinishReason, StreamPart, Usage};
use chatbridge_core::stream::{adapt_backend_stream, translate_chunk};
use futures::channel::mpsc;
use futures::{stream, StreamExt};
use proptest::prelude::*;
use serde_json::{json, Value};
use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use test_case::test_case;

/// Parse wire chunks, adapt them, and serialize the parts back to JSON
async fn adapt_wire(chunks: Vec<Value>) -> Vec<Value> {
    let upstream = stream::iter(
        chunks
            .into_iter()
            .map(|c| Ok::<_, Infallible>(serde_json::from_value::<BackendChunk>(c).unwrap())),
    );

    adapt_backend_stream(upstream)
        .map(|part| serde_json::to_value(part.unwrap()).unwrap())
        .collect()
        .await
}

#[tokio::test]
async fn test_text_chunk_becomes_text_delta() {
    let parts = adapt_wire(vec![json!({"type": "text", "content": "Hello"})]).await;
    assert_eq!(parts, vec![json!({"type": "text-delta", "textDelta": "Hello"})]);
}

#[test_case(Some("length"), "length" ; "length")]
#[test_case(Some("stop"), "stop" ; "stop")]
#[test_case(Some("tool-calls"), "tool-calls" ; "tool calls")]
#[test_case(Some("error"), "error" ; "error")]
#[test_case(None, "stop" ; "missing reason")]
#[test_case(Some("content_filter"), "stop" ; "unrecognized reason")]
#[test_case(Some("tool_calls"), "stop" ; "openai tool calls spelling")]
#[test_case(Some("max_output_tokens"), "stop" ; "openai max output tokens")]
#[test_case(Some("function_call"), "stop" ; "openai function call")]
#[test_case(Some("LENGTH"), "stop" ; "wrong case reason")]
#[test_case(Some(""), "stop" ; "empty reason")]
#[tokio::test]
async fn test_finish_reason_mapping(reason: Option<&str>, expected: &str) {
    let chunk = match reason {
        Some(reason) => json!({"type": "finish", "reason": reason}),
        None => json!({"type": "finish"}),
    };

    let parts = adapt_wire(vec![chunk]).await;
    assert_eq!(
        parts,
        vec![json!({
            "type": "finish",
            "finishReason": expected,
            "usage": {"promptTokens": 0, "completionTokens": 0}
        })]
    );
}

#[test_case(json!({"type": "debug", "message": "tick"}) ; "debug")]
#[test_case(json!({"type": "tool-call", "name": "search"}) ; "tool call")]
#[test_case(json!({"type": "TEXT", "content": "shouting"}) ; "wrong case")]
#[tokio::test]
async fn test_unrecognized_chunk_emits_nothing(chunk: Value) {
    assert!(adapt_wire(vec![chunk]).await.is_empty());
}

#[tokio::test]
async fn test_text_text_finish_sequence() {
    let parts = adapt_wire(vec![
        json!({"type": "text", "content": "a"}),
        json!({"type": "text", "content": "b"}),
        json!({"type": "finish"}),
    ])
    .await;

    assert_eq!(
        parts,
        vec![
            json!({"type": "text-delta", "textDelta": "a"}),
            json!({"type": "text-delta", "textDelta": "b"}),
            json!({
                "type": "finish",
                "finishReason": "stop",
                "usage": {"promptTokens": 0, "completionTokens": 0}
            }),
        ]
    );
}

#[tokio::test]
async fn test_error_passes_through_in_place() {
    let upstream = stream::iter(vec![
        Ok(BackendChunk::text("a")),
        Err("upstream closed"),
        Ok(BackendChunk::text("b")),
    ]);

    let items: Vec<Result<StreamPart, &str>> = adapt_backend_stream(upstream).collect().await;
    assert_eq!(
        items,
        vec![
            Ok(StreamPart::text_delta("a")),
            Err("upstream closed"),
            Ok(StreamPart::text_delta("b")),
        ]
    );
}

#[tokio::test]
async fn test_adapter_pulls_only_on_demand() {
    let pulled = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&pulled);
    let upstream = stream::iter((0..100).map(|i| BackendChunk::text(i.to_string())))
        .inspect(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .map(Ok::<_, Infallible>);

    let first: Vec<_> = adapt_backend_stream(upstream).take(2).collect().await;
    assert_eq!(first.len(), 2);
    assert_eq!(pulled.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_dropping_adapter_releases_upstream() {
    let (tx, rx) = mpsc::unbounded::<Result<BackendChunk, Infallible>>();
    tx.unbounded_send(Ok(BackendChunk::text("first"))).unwrap();

    let mut adapted = Box::pin(adapt_backend_stream(rx));
    assert_eq!(
        adapted.next().await,
        Some(Ok(StreamPart::text_delta("first")))
    );
    assert!(!tx.is_closed());

    drop(adapted);
    assert!(tx.is_closed());
}

fn chunk_strategy() -> impl Strategy<Value = BackendChunk> {
    prop_oneof![
        ".{0,12}".prop_map(BackendChunk::text),
        proptest::option::of(prop_oneof![
            Just("stop"),
            Just("length"),
            Just("tool-calls"),
            Just("error"),
            Just("tool_calls"),
            Just("max_output_tokens"),
            Just("bogus"),
        ])
        .prop_map(BackendChunk::finish),
        Just(BackendChunk::Unrecognized),
    ]
}

proptest! {
    // Property: the adapter is exactly a per-chunk filter_map of translate_chunk
    #[test]
    fn prop_adapter_preserves_order(chunks in proptest::collection::vec(chunk_strategy(), 0..40)) {
        let expected: Vec<StreamPart> = chunks.iter().cloned().filter_map(translate_chunk).collect();

        let upstream = stream::iter(chunks.clone().into_iter().map(Ok::<_, Infallible>));
        let actual: Vec<StreamPart> = futures::executor::block_on(
            adapt_backend_stream(upstream).map(|p| p.unwrap()).collect::<Vec<_>>(),
        );

        prop_assert_eq!(&actual, &expected);

        let recognized = chunks
            .iter()
            .filter(|c| !matches!(c, BackendChunk::Unrecognized))
            .count();
        prop_assert_eq!(actual.len(), recognized);
    }

    // Property: every finish part reports zero usage, and only the four wire
    // reasons survive; anything else becomes stop
    #[test]
    fn prop_finish_usage_is_zero(
        reason in proptest::option::of(prop_oneof![
            Just("tool_calls".to_string()),
            Just("max_output_tokens".to_string()),
            Just("function_call".to_string()),
            Just("length".to_string()),
            Just("tool-calls".to_string()),
            Just("error".to_string()),
            ".{0,10}",
        ])
    ) {
        let part = translate_chunk(BackendChunk::finish(reason.as_deref()));
        let expected = match reason.as_deref() {
            Some("length") => FinishReason::Length,
            Some("tool-calls") => FinishReason::ToolCalls,
            Some("error") => FinishReason::Error,
            _ => FinishReason::Stop,
        };
        match part {
            Some(StreamPart::Finish { finish_reason, usage }) => {
                prop_assert_eq!(usage, Usage::unreported());
                prop_assert_eq!(finish_reason, expected);
            }
            other => prop_assert!(false, "unexpected part: {:?}", other),
        }
    }
}
