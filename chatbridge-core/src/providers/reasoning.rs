//! Reasoning extraction middleware
//!
//! Splits `<tag>…</tag>` segments out of a model's answer text and reports
//! them as reasoning. Works on whole responses and on streams, where a tag may
//! be split across any number of text deltas.

use crate::protocol::StreamPart;
use crate::providers::adapter::{GenerateResult, StreamResult};
use crate::providers::error::ProviderResult;
use crate::providers::middleware::LanguageModelMiddleware;
use futures::StreamExt;
use regex::Regex;

/// Middleware that moves tagged reasoning out of the answer text
#[derive(Debug, Clone)]
pub struct ExtractReasoningMiddleware {
    tag_name: String,
    separator: String,
    start_with_reasoning: bool,
}

impl ExtractReasoningMiddleware {
    /// Create a middleware for `<tag_name>` delimiters
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            separator: "\n".to_string(),
            start_with_reasoning: false,
        }
    }

    /// Set the text placed between joined segments
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Treat output as reasoning until the first closing tag
    pub fn with_start_with_reasoning(mut self, enabled: bool) -> Self {
        self.start_with_reasoning = enabled;
        self
    }

    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }

    fn open_tag(&self) -> String {
        format!("<{}>", self.tag_name)
    }

    fn close_tag(&self) -> String {
        format!("</{}>", self.tag_name)
    }

    /// Split a complete text into (reasoning, answer)
    ///
    /// Text without a complete tagged segment comes back unchanged.
    pub fn extract(&self, original: &str) -> (Option<String>, String) {
        let text = if self.start_with_reasoning {
            format!("{}{}", self.open_tag(), original)
        } else {
            original.to_string()
        };

        let pattern = format!(
            "(?s){}(.*?){}",
            regex::escape(&self.open_tag()),
            regex::escape(&self.close_tag())
        );
        let re = match Regex::new(&pattern) {
            Ok(re) => re,
            Err(e) => {
                tracing::warn!("Invalid reasoning tag '{}': {}", self.tag_name, e);
                return (None, original.to_string());
            }
        };

        if !re.is_match(&text) {
            return (None, original.to_string());
        }

        let matches: Vec<_> = re.captures_iter(&text).collect();
        let reasoning = matches
            .iter()
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .collect::<Vec<_>>()
            .join(&self.separator);

        let mut answer = text.clone();
        for captures in matches.iter().rev() {
            let Some(whole) = captures.get(0) else {
                continue;
            };
            let before = &answer[..whole.start()];
            let after = &answer[whole.end()..];
            let joiner = if !before.is_empty() && !after.is_empty() {
                self.separator.as_str()
            } else {
                ""
            };
            answer = format!("{before}{joiner}{after}");
        }

        (Some(reasoning), answer)
    }

    fn splitter(&self) -> ReasoningSplitter {
        ReasoningSplitter {
            open_tag: self.open_tag(),
            close_tag: self.close_tag(),
            separator: self.separator.clone(),
            in_reasoning: self.start_with_reasoning,
            after_switch: false,
            first_reasoning: true,
            first_text: true,
            buffer: String::new(),
        }
    }
}

impl LanguageModelMiddleware for ExtractReasoningMiddleware {
    fn wrap_generate(&self, mut result: GenerateResult) -> ProviderResult<GenerateResult> {
        let (reasoning, text) = self.extract(&result.text);
        if let Some(extracted) = reasoning {
            result.reasoning = Some(match result.reasoning.take() {
                Some(existing) => format!("{existing}{}{extracted}", self.separator),
                None => extracted,
            });
            result.text = text;
        }
        Ok(result)
    }

    fn wrap_stream(&self, result: StreamResult) -> StreamResult {
        let mut splitter = self.splitter();
        result.map_stream(move |mut upstream| {
            let stream = async_stream::stream! {
                while let Some(item) = upstream.next().await {
                    match item {
                        Ok(StreamPart::TextDelta { text_delta }) => {
                            for part in splitter.push(&text_delta) {
                                yield Ok(part);
                            }
                        }
                        Ok(other) => {
                            for part in splitter.flush() {
                                yield Ok(part);
                            }
                            yield Ok(other);
                        }
                        Err(e) => yield Err(e),
                    }
                }
                for part in splitter.flush() {
                    yield Ok(part);
                }
            };
            stream.boxed()
        })
    }
}

/// Incremental tag scanner for streamed text
struct ReasoningSplitter {
    open_tag: String,
    close_tag: String,
    separator: String,
    in_reasoning: bool,
    after_switch: bool,
    first_reasoning: bool,
    first_text: bool,
    buffer: String,
}

impl ReasoningSplitter {
    /// Feed a text delta, returning the parts that are now unambiguous
    fn push(&mut self, delta: &str) -> Vec<StreamPart> {
        self.buffer.push_str(delta);
        let mut out = Vec::new();

        loop {
            let tag = if self.in_reasoning {
                &self.close_tag
            } else {
                &self.open_tag
            };

            match self.buffer.find(tag.as_str()) {
                Some(idx) => {
                    let tag_len = tag.len();
                    let before: String = self.buffer[..idx].to_string();
                    self.publish(&before, &mut out);
                    self.buffer.drain(..idx + tag_len);
                    self.in_reasoning = !self.in_reasoning;
                    self.after_switch = true;
                }
                None => {
                    // Hold back a trailing fragment that could still become a tag.
                    let keep = partial_tag_suffix(&self.buffer, tag);
                    let ready_len = self.buffer.len() - keep;
                    let ready: String = self.buffer.drain(..ready_len).collect();
                    self.publish(&ready, &mut out);
                    break;
                }
            }
        }

        out
    }

    /// Release whatever is buffered
    fn flush(&mut self) -> Vec<StreamPart> {
        let mut out = Vec::new();
        let rest = std::mem::take(&mut self.buffer);
        self.publish(&rest, &mut out);
        out
    }

    fn publish(&mut self, text: &str, out: &mut Vec<StreamPart>) {
        if text.is_empty() {
            return;
        }

        let first = if self.in_reasoning {
            self.first_reasoning
        } else {
            self.first_text
        };
        let prefix = if self.after_switch && !first {
            self.separator.as_str()
        } else {
            ""
        };
        let content = format!("{prefix}{text}");

        if self.in_reasoning {
            out.push(StreamPart::reasoning(content));
            self.first_reasoning = false;
        } else {
            out.push(StreamPart::text_delta(content));
            self.first_text = false;
        }
        self.after_switch = false;
    }
}

/// Length of the longest suffix of `text` that is a proper prefix of `tag`
fn partial_tag_suffix(text: &str, tag: &str) -> usize {
    (1..tag.len())
        .rev()
        .find(|&len| tag.is_char_boundary(len) && text.ends_with(&tag[..len]))
        .unwrap_or(0)
}
