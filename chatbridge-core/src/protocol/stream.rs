//! Streaming chunk and stream part types
//!
//! `BackendChunk` is what a chat backend emits natively. `StreamPart` is what
//! the UI layer consumes. Both are tagged on a `type` field on the wire.

use serde::{Deserialize, Serialize};

/// One unit of a backend's native streaming output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendChunk {
    /// A piece of generated text
    Text { content: String },

    /// End of generation, with an optional backend-specific reason
    Finish {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    /// Any chunk whose tag is not known to this crate
    #[serde(other)]
    Unrecognized,
}

impl BackendChunk {
    /// Create a text chunk
    pub fn text(content: impl Into<String>) -> Self {
        BackendChunk::Text {
            content: content.into(),
        }
    }

    /// Create a finish chunk
    pub fn finish(reason: Option<&str>) -> Self {
        BackendChunk::Finish {
            reason: reason.map(str::to_string),
        }
    }
}

/// Why generation stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FinishReason {
    #[default]
    Stop,
    Length,
    ToolCalls,
    Error,
}

impl FinishReason {
    /// Parse a reason reported by an OpenAI endpoint.
    ///
    /// Accepts both `tool-calls` and the OpenAI spellings (`tool_calls`,
    /// `max_output_tokens`). Missing or unrecognized reasons map to `Stop`.
    pub fn parse(reason: Option<&str>) -> Self {
        match reason {
            Some("stop") => FinishReason::Stop,
            Some("length") | Some("max_output_tokens") => FinishReason::Length,
            Some("tool-calls") | Some("tool_calls") | Some("function_call") => {
                FinishReason::ToolCalls
            }
            Some("error") => FinishReason::Error,
            _ => FinishReason::Stop,
        }
    }

    /// Map a reason from the native backend chunk protocol.
    ///
    /// Only the four wire values are recognized. Anything else, including
    /// OpenAI spellings such as `tool_calls`, maps to `Stop`.
    pub fn from_backend(reason: Option<&str>) -> Self {
        match reason {
            Some("length") => FinishReason::Length,
            Some("tool-calls") => FinishReason::ToolCalls,
            Some("error") => FinishReason::Error,
            _ => FinishReason::Stop,
        }
    }

    /// Wire name of this reason
    pub fn as_str(&self) -> &'static str {
        match self {
            FinishReason::Stop => "stop",
            FinishReason::Length => "length",
            FinishReason::ToolCalls => "tool-calls",
            FinishReason::Error => "error",
        }
    }
}

/// Token usage reported with a finish part
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    /// Tokens in the prompt
    pub prompt_tokens: u32,

    /// Tokens in the completion
    pub completion_tokens: u32,
}

impl Usage {
    /// Create a usage record
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
        }
    }

    /// Usage for sources that do not report token counts. Always zero.
    pub fn unreported() -> Self {
        Self::default()
    }

    /// Sum of prompt and completion tokens
    pub fn total_tokens(&self) -> u32 {
        self.prompt_tokens.saturating_add(self.completion_tokens)
    }
}

/// One unit of the standardized streaming protocol consumed by the UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum StreamPart {
    /// Generated answer text
    #[serde(rename_all = "camelCase")]
    TextDelta { text_delta: String },

    /// Reasoning text split out of the answer
    #[serde(rename_all = "camelCase")]
    Reasoning { text_delta: String },

    /// End of the stream
    #[serde(rename_all = "camelCase")]
    Finish {
        finish_reason: FinishReason,
        usage: Usage,
    },
}

impl StreamPart {
    /// Create a text delta part
    pub fn text_delta(text: impl Into<String>) -> Self {
        StreamPart::TextDelta {
            text_delta: text.into(),
        }
    }

    /// Create a reasoning part
    pub fn reasoning(text: impl Into<String>) -> Self {
        StreamPart::Reasoning {
            text_delta: text.into(),
        }
    }

    /// Create a finish part
    pub fn finish(finish_reason: FinishReason, usage: Usage) -> Self {
        StreamPart::Finish {
            finish_reason,
            usage,
        }
    }
}
