//! Provider stream → caller stream.
//!
//! Lines are forwarded one for one as they arrive; nothing is re-batched or
//! buffered beyond the current partial line. Every relay ends with exactly
//! one [`RelayFrame::Done`], however the upstream ends.

use crate::sse::{self, RelayFrame};
use agent_types::ByteStream;
use futures_util::{Stream, StreamExt as _, stream};

enum Phase {
    Reading,
    Terminating,
    Finished,
}

struct Relay {
    upstream: ByteStream,
    buf: Vec<u8>,
    phase: Phase,
    /// The upstream has ended; only `buf` is left.
    eof: bool,
    tokens: usize,
}

impl Relay {
    /// Removes the next complete line from `buf`, without its terminator.
    ///
    /// `\n`, `\r\n` and a lone `\r` all end a line. A `\r` at the very end of
    /// the buffer waits for the next chunk unless the upstream has ended.
    fn take_line(&mut self) -> Option<Vec<u8>> {
        let at = self.buf.iter().position(|&b| b == b'\n' || b == b'\r')?;
        let end = if self.buf[at] == b'\r' {
            match self.buf.get(at + 1) {
                Some(b'\n') => at + 1,
                Some(_) => at,
                None if self.eof => at,
                None => return None,
            }
        } else {
            at
        };
        let mut raw: Vec<u8> = self.buf.drain(..=end).collect();
        raw.truncate(at);
        Some(raw)
    }

    /// Turns one complete upstream line into a frame. Returns `None` for the
    /// upstream's own `[DONE]`, which ends the read instead.
    fn frame(&mut self, raw: &[u8]) -> Option<RelayFrame> {
        let text = String::from_utf8_lossy(raw);
        let line = text.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            return Some(RelayFrame::Separator);
        }
        if sse::is_done_line(line) {
            self.phase = Phase::Terminating;
            return None;
        }
        if sse::delta_content(line).is_some() {
            self.tokens += 1;
        }
        Some(RelayFrame::Line(line.to_string()))
    }
}

/// Relays `upstream` line by line and appends the terminal frame.
///
/// A transport error mid-stream is logged and ends the relay; the partial
/// line it interrupted is dropped.
pub fn relay(upstream: ByteStream) -> impl Stream<Item = RelayFrame> + Send + 'static {
    let state = Relay {
        upstream,
        buf: Vec::new(),
        phase: Phase::Reading,
        eof: false,
        tokens: 0,
    };

    stream::unfold(state, |mut s| async move {
        loop {
            match s.phase {
                Phase::Finished => return None,
                Phase::Terminating => {
                    s.phase = Phase::Finished;
                    tracing::debug!(tokens = s.tokens, "relay finished");
                    return Some((RelayFrame::Done, s));
                }
                Phase::Reading => {}
            }

            if let Some(raw) = s.take_line() {
                if let Some(frame) = s.frame(&raw) {
                    return Some((frame, s));
                }
                continue;
            }

            if s.eof {
                let rest = std::mem::take(&mut s.buf);
                s.phase = Phase::Terminating;
                if !rest.is_empty()
                    && let Some(frame) = s.frame(&rest)
                {
                    return Some((frame, s));
                }
                continue;
            }

            match s.upstream.next().await {
                Some(Ok(chunk)) => s.buf.extend_from_slice(&chunk),
                Some(Err(e)) => {
                    tracing::warn!(error = %e, tokens = s.tokens, "provider stream failed mid-response");
                    s.buf.clear();
                    s.phase = Phase::Terminating;
                }
                None => s.eof = true,
            }
        }
    })
}

/// The two-frame response used when the provider could not be reached or
/// refused the request.
pub fn failure(message: &str) -> impl Stream<Item = RelayFrame> + Send + 'static {
    stream::iter([RelayFrame::Token(message.to_string()), RelayFrame::Done])
}
