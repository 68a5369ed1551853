//! Line decoder for the live message endpoint.
//!
//! The server pushes messages as server-sent events:
//!
//! ```text
//! event: stream-open
//!
//! data: {"event_id": 42, "event_type": "content.created.file", ...}
//!
//! : keep-alive
//! ```
//!
//! - `event:` names the frame. `stream-open` and `stream-error` are control
//!   frames; unnamed frames carry a message.
//! - `data:` lines are joined with `\n` to form the payload.
//! - Lines starting with `:` are comments and are skipped.
//! - A blank line terminates the frame.

use std::io::BufRead;

use tracing::{debug, warn};

use super::Message;

/// Frame name the server sends once the stream is ready.
pub const STREAM_OPEN: &str = "stream-open";

/// Frame name the server sends before closing the stream on error.
pub const STREAM_ERROR: &str = "stream-error";

/// A decoded frame from the live stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamFrame {
    /// The server acknowledged the stream.
    Open,
    /// The server reported an error and will close the stream.
    Error(String),
    /// A live message.
    Message(Box<Message>),
}

/// Errors produced while decoding the stream.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("failed to read live stream: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid message payload: {source}")]
    Decode {
        /// The payload that failed to decode.
        payload: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Incremental decoder: feed it lines, collect frames.
#[derive(Debug, Default)]
pub struct EventStreamDecoder {
    name: Option<String>,
    data: Vec<String>,
}

impl EventStreamDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Push one line (without its terminator).
    ///
    /// Returns a frame when the line completes one.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Decode`] when a completed data frame is not a
    /// valid message.
    pub fn push_line(&mut self, line: &str) -> Result<Option<StreamFrame>, StreamError> {
        let line = line.strip_suffix('\r').unwrap_or(line);

        if line.is_empty() {
            return self.finish_frame();
        }
        if line.starts_with(':') {
            return Ok(None);
        }

        let (field, value) = line.split_once(':').unwrap_or((line, ""));
        let value = value.strip_prefix(' ').unwrap_or(value);
        match field {
            "event" => self.name = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            other => debug!(field = other, "ignoring unknown live stream field"),
        }
        Ok(None)
    }

    /// Flush a frame left open at end of input.
    ///
    /// # Errors
    ///
    /// Same as [`EventStreamDecoder::push_line`].
    pub fn finish(&mut self) -> Result<Option<StreamFrame>, StreamError> {
        self.finish_frame()
    }

    fn finish_frame(&mut self) -> Result<Option<StreamFrame>, StreamError> {
        let name = self.name.take();
        let data = std::mem::take(&mut self.data);

        match name.as_deref() {
            Some(STREAM_OPEN) => return Ok(Some(StreamFrame::Open)),
            Some(STREAM_ERROR) => return Ok(Some(StreamFrame::Error(data.join("\n")))),
            Some(other) => warn!(event = other, "unexpected live stream event name"),
            None => {}
        }

        if data.is_empty() {
            return Ok(None);
        }

        let payload = data.join("\n");
        match serde_json::from_str::<Message>(&payload) {
            Ok(message) => Ok(Some(StreamFrame::Message(Box::new(message)))),
            Err(source) => Err(StreamError::Decode { payload, source }),
        }
    }
}

/// Decode every frame from a buffered reader.
///
/// Decoding continues after a malformed payload; the error is yielded in
/// place of the frame.
pub fn decode_event_stream<R: BufRead>(
    reader: R,
) -> impl Iterator<Item = Result<StreamFrame, StreamError>> {
    let mut decoder = EventStreamDecoder::new();
    let mut lines = reader.lines();
    let mut done = false;

    std::iter::from_fn(move || {
        while !done {
            let step = match lines.next() {
                Some(Ok(line)) => decoder.push_line(&line),
                Some(Err(err)) => {
                    done = true;
                    Err(StreamError::Io(err))
                }
                None => {
                    done = true;
                    decoder.finish()
                }
            };
            match step {
                Ok(None) => {}
                Ok(Some(frame)) => return Some(Ok(frame)),
                Err(err) => return Some(Err(err)),
            }
        }
        None
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const MESSAGE: &str = r#"{"event_id": 5, "event_type": "content.created.file", "created": "2021-04-16T10:00:00Z", "fields": {"content": {"content_id": 10, "content_type": "file", "workspace_id": 1}}}"#;

    fn collect(input: &str) -> Vec<Result<StreamFrame, StreamError>> {
        decode_event_stream(Cursor::new(input.to_string())).collect()
    }

    #[test]
    fn decodes_open_then_message() {
        let input = format!("event: stream-open\n\ndata: {MESSAGE}\n\n");
        let frames = collect(&input);
        assert_eq!(frames.len(), 2);
        assert!(matches!(frames[0], Ok(StreamFrame::Open)));
        match &frames[1] {
            Ok(StreamFrame::Message(message)) => assert_eq!(message.event_id, 5),
            other => panic!("expected message, got {other:?}"),
        }
    }

    #[test]
    fn skips_comments_and_crlf() {
        let input = format!(": keep-alive\r\n\r\ndata:{MESSAGE}\r\n\r\n");
        let frames = collect(&input);
        assert_eq!(frames.len(), 1);
        assert!(matches!(frames[0], Ok(StreamFrame::Message(_))));
    }

    #[test]
    fn empty_unnamed_frames_yield_nothing() {
        assert!(collect(": ping\n\n\n").is_empty());

        let input = format!("\n\n: ping\n\ndata: {MESSAGE}\n\n");
        let frames = collect(&input);
        assert_eq!(frames.len(), 1);
        assert!(matches!(frames[0], Ok(StreamFrame::Message(_))));
    }

    #[test]
    fn joins_multi_line_data() {
        let (head, tail) = MESSAGE.split_at(30);
        let input = format!("data: {head}\ndata: {tail}\n\n");
        let frames = collect(&input);
        assert!(matches!(frames[0], Ok(StreamFrame::Message(_))));
    }

    #[test]
    fn flushes_unterminated_frame_at_eof() {
        let input = format!("data: {MESSAGE}");
        let frames = collect(&input);
        assert_eq!(frames.len(), 1);
        assert!(frames[0].is_ok());
    }

    #[test]
    fn reports_stream_error_frame() {
        let frames = collect("event: stream-error\ndata: session expired\n\n");
        match &frames[0] {
            Ok(StreamFrame::Error(reason)) => assert_eq!(reason, "session expired"),
            other => panic!("expected error frame, got {other:?}"),
        }
    }

    #[test]
    fn malformed_payload_does_not_stop_decoding() {
        let input = format!("data: {{not json\n\ndata: {MESSAGE}\n\n");
        let frames = collect(&input);
        assert_eq!(frames.len(), 2);
        assert!(matches!(frames[0], Err(StreamError::Decode { .. })));
        assert!(matches!(frames[1], Ok(StreamFrame::Message(_))));
    }
}
