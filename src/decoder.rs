//! Incremental decoder from raw response bytes to [`StreamEvent`]s.
//!
//! The transport hands over byte chunks of arbitrary size; frame boundaries
//! are newlines and carry no relation to chunk boundaries. The decoder
//! buffers bytes, cuts complete lines, and turns every `data: ` line into a
//! parsed event.
//!
//! Lines are cut at the byte level *before* UTF-8 decoding. A multi-byte
//! character split across two chunks therefore reassembles in the buffer
//! untouched: `\n` (0x0A) can never appear inside a UTF-8 sequence, so a
//! complete line is always valid on its own.

use crate::events::StreamEvent;

/// Prefix marking a payload-bearing frame. Everything else (comments,
/// blank keep-alive lines) is consumed and ignored.
const DATA_PREFIX: &str = "data: ";

/// Stateful line/frame decoder. One instance per stream session.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes, returning every event completed by it.
    ///
    /// Malformed frames (invalid UTF-8, bad JSON, missing type tag) are
    /// logged and skipped; they never interrupt the stream.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.buf.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            // strip the newline and an optional preceding \r
            let mut end = line.len() - 1;
            if end > 0 && line[end - 1] == b'\r' {
                end -= 1;
            }
            if let Some(event) = decode_line(&line[..end]) {
                events.push(event);
            }
        }
        events
    }

    /// Finish the stream, discarding any trailing unterminated line.
    ///
    /// A well-formed stream always ends with a newline-terminated terminal
    /// frame, so an unterminated tail is noise, not data. The asymmetry
    /// with `feed` is intentional.
    pub fn finish(&mut self) {
        if !self.buf.is_empty() {
            tracing::debug!(
                bytes = self.buf.len(),
                "discarding unterminated trailing line at end of stream"
            );
            self.buf.clear();
        }
    }

    /// Bytes currently held back waiting for a newline.
    #[cfg(test)]
    fn pending(&self) -> usize {
        self.buf.len()
    }
}

/// Decode one complete line into an event, or `None` if the line carries
/// nothing (non-data line, empty payload, malformed frame).
fn decode_line(line: &[u8]) -> Option<StreamEvent> {
    let text = match std::str::from_utf8(line) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(error = %e, "skipping non-UTF-8 frame");
            return None;
        }
    };

    let payload = text.strip_prefix(DATA_PREFIX)?.trim();
    if payload.is_empty() {
        return None;
    }

    match StreamEvent::parse(payload) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::warn!(error = %e, payload, "skipping malformed frame");
            None
        }
    }
}
