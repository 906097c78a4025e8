//! Downstream event-stream frames.
//!
//! The caller speaks OpenAI-style chat completion chunks over SSE. Provider
//! lines already use that format and are forwarded as-is; frames the agent
//! writes itself (failure messages, the terminal marker) are built here.

use bytes::Bytes;
use serde_json::{Value, json};

/// The terminal frame, written exactly once per response.
pub const DONE_FRAME: &str = "data: [DONE]\n\n";

/// One unit of the downstream wire protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayFrame {
    /// A non-empty provider line, forwarded verbatim.
    Line(String),
    /// An empty provider line (the SSE event separator).
    Separator,
    /// A content chunk synthesized by the agent.
    Token(String),
    /// `data: [DONE]`.
    Done,
}

impl RelayFrame {
    /// Serializes the frame for the response body.
    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        match self {
            Self::Line(line) => Bytes::from(format!("{line}\n")),
            Self::Separator => Bytes::from_static(b"\n"),
            Self::Token(text) => {
                let chunk = json!({"choices": [{"delta": {"content": text}, "index": 0}]});
                Bytes::from(format!("data: {chunk}\n\n"))
            }
            Self::Done => Bytes::from_static(DONE_FRAME.as_bytes()),
        }
    }
}

/// Whether an upstream line is the provider's own end marker.
#[must_use]
pub fn is_done_line(line: &str) -> bool {
    line.strip_prefix("data:").map(str::trim) == Some("[DONE]")
}

/// Extracts `choices[0].delta.content` from a `data:` line, if it has any.
#[must_use]
pub fn delta_content(line: &str) -> Option<String> {
    let data = line.strip_prefix("data:")?.trim_start();
    let chunk: Value = serde_json::from_str(data).ok()?;
    chunk
        .pointer("/choices/0/delta/content")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(String::from)
}
