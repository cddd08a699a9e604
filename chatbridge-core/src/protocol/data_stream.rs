//! Line encoding of stream parts for the UI data stream
//!
//! Each part becomes one `<code>:<json>\n` line. Text and reasoning carry a
//! JSON string, finish carries a JSON object, errors carry the error message.

use super::stream::StreamPart;
use serde_json::json;

/// Response header announcing the data stream protocol
pub const DATA_STREAM_HEADER: (&str, &str) = ("x-vercel-ai-data-stream", "v1");

const TEXT_CODE: char = '0';
const ERROR_CODE: char = '3';
const REASONING_CODE: char = 'g';
const FINISH_MESSAGE_CODE: char = 'd';

/// Encode a single stream part as a data stream line
pub fn encode_part(part: &StreamPart) -> String {
    let (code, payload) = match part {
        StreamPart::TextDelta { text_delta } => (TEXT_CODE, json!(text_delta)),
        StreamPart::Reasoning { text_delta } => (REASONING_CODE, json!(text_delta)),
        StreamPart::Finish {
            finish_reason,
            usage,
        } => (
            FINISH_MESSAGE_CODE,
            json!({
                "finishReason": finish_reason,
                "usage": usage,
            }),
        ),
    };
    format!("{code}:{payload}\n")
}

/// Encode an error surfaced by the stream
pub fn encode_error(error: &impl std::fmt::Display) -> String {
    format!("{ERROR_CODE}:{}\n", json!(error.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::stream::{FinishReason, Usage};

    #[test]
    fn test_text_line_escapes_json() {
        let line = encode_part(&StreamPart::text_delta("say \"hi\"\n"));
        assert_eq!(line, "0:\"say \\\"hi\\\"\\n\"\n");
    }

    #[test]
    fn test_reasoning_line() {
        assert_eq!(encode_part(&StreamPart::reasoning("hmm")), "g:\"hmm\"\n");
    }

    #[test]
    fn test_finish_line() {
        let line = encode_part(&StreamPart::finish(FinishReason::Length, Usage::new(3, 7)));
        let (code, payload) = line.trim_end().split_once(':').unwrap();
        assert_eq!(code, "d");
        let value: serde_json::Value = serde_json::from_str(payload).unwrap();
        assert_eq!(value["finishReason"], "length");
        assert_eq!(value["usage"]["promptTokens"], 3);
        assert_eq!(value["usage"]["completionTokens"], 7);
    }

    #[test]
    fn test_error_line() {
        assert_eq!(encode_error(&"boom"), "3:\"boom\"\n");
    }
}
