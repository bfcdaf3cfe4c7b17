//! Incremental decoder for newline-delimited JSON response bodies
//!
//! Streaming chat endpoints answer with one JSON object per line, each
//! carrying the next fragment of the response in `message.content`:
//!
//! ```text
//! {"message":{"role":"assistant","content":"Hel"},"done":false}
//! {"message":{"role":"assistant","content":"lo"},"done":false}
//! {"message":{"role":"assistant","content":""},"done":true}
//! ```
//!
//! Network chunks do not line up with JSON lines or even with UTF-8
//! character boundaries, so the decoder keeps two buffers: raw bytes that
//! do not yet form a complete character, and decoded text that does not yet
//! form a complete line.

use crate::error::{Result, ThirdBrainError};
use crate::providers::ChunkCallback;
use bytes::Bytes;
use futures::{Stream, StreamExt};

/// Stateful NDJSON decoder
///
/// Feed it raw body chunks in arrival order, then call [`finish`] once the
/// body ends. Malformed lines are skipped with a warning; they never abort
/// decoding.
///
/// [`finish`]: NdjsonDecoder::finish
///
/// # Examples
///
/// ```
/// use thirdbrain::providers::stream::NdjsonDecoder;
///
/// let mut seen = Vec::new();
/// let mut on_chunk = |chunk: &str| seen.push(chunk.to_string());
///
/// let mut decoder = NdjsonDecoder::new();
/// decoder.feed(b"{\"message\":{\"content\":\"Hel\"}}\n{\"mess", &mut on_chunk);
/// decoder.feed(b"age\":{\"content\":\"lo\"}}\n", &mut on_chunk);
/// let text = decoder.finish(&mut on_chunk);
///
/// assert_eq!(text, "Hello");
/// assert_eq!(seen, vec!["Hel", "lo"]);
/// ```
#[derive(Debug, Default)]
pub struct NdjsonDecoder {
    pending: Vec<u8>,
    buffer: String,
    full_text: String,
    chunks: usize,
    skipped_lines: usize,
    saw_done: bool,
}

impl NdjsonDecoder {
    /// Create an empty decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the next body chunk
    ///
    /// Every complete line in the buffered text is parsed; the trailing
    /// partial line is kept for the next call.
    pub fn feed(&mut self, bytes: &[u8], on_chunk: &mut ChunkCallback<'_>) {
        self.decode_utf8(bytes);

        while let Some(pos) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=pos).collect();
            self.process_line(&line, on_chunk);
        }
    }

    /// Flush whatever remains after the body ended and return the full text
    ///
    /// A final line without a terminating newline is still parsed.
    pub fn finish(mut self, on_chunk: &mut ChunkCallback<'_>) -> String {
        if !self.pending.is_empty() {
            let tail = String::from_utf8_lossy(&self.pending).into_owned();
            self.pending.clear();
            self.buffer.push_str(&tail);
        }

        if !self.buffer.trim().is_empty() {
            let line = std::mem::take(&mut self.buffer);
            self.process_line(&line, on_chunk);
        }

        if !self.saw_done {
            tracing::warn!(
                "Response stream ended without a done marker after {} chunks",
                self.chunks
            );
        }

        tracing::debug!(
            "Stream finished: chunks={}, skipped_lines={}, chars={}",
            self.chunks,
            self.skipped_lines,
            self.full_text.chars().count()
        );

        self.full_text
    }

    /// Text accumulated so far
    pub fn full_text(&self) -> &str {
        &self.full_text
    }

    /// Number of content chunks delivered so far
    pub fn chunk_count(&self) -> usize {
        self.chunks
    }

    /// Number of non-blank lines that could not be parsed
    pub fn skipped_lines(&self) -> usize {
        self.skipped_lines
    }

    /// Whether a line with `"done": true` has been seen
    pub fn saw_done(&self) -> bool {
        self.saw_done
    }

    fn decode_utf8(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);

        let mut start = 0;
        loop {
            match std::str::from_utf8(&self.pending[start..]) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    start = self.pending.len();
                    break;
                }
                Err(e) => {
                    let valid_end = start + e.valid_up_to();
                    self.buffer
                        .push_str(&String::from_utf8_lossy(&self.pending[start..valid_end]));
                    match e.error_len() {
                        Some(len) => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            start = valid_end + len;
                        }
                        // Incomplete sequence at the end: wait for more bytes
                        None => {
                            start = valid_end;
                            break;
                        }
                    }
                }
            }
        }

        self.pending.drain(..start);
    }

    fn process_line(&mut self, line: &str, on_chunk: &mut ChunkCallback<'_>) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }

        let value: serde_json::Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                self.skipped_lines += 1;
                tracing::warn!("Skipping malformed stream line {:?}: {}", line, e);
                return;
            }
        };

        if let Some(error) = value.get("error").and_then(|v| v.as_str()) {
            tracing::warn!("Endpoint reported an error mid-stream: {}", error);
        }

        if value.get("done").and_then(|v| v.as_bool()) == Some(true) {
            self.saw_done = true;
        }

        match value.pointer("/message/content").and_then(|v| v.as_str()) {
            Some(content) if !content.is_empty() => {
                self.chunks += 1;
                self.full_text.push_str(content);
                on_chunk(content);
            }
            _ => {}
        }
    }
}

/// Drive an [`NdjsonDecoder`] over a byte stream until it ends
///
/// # Arguments
///
/// * `byte_stream` - The raw response body as a stream of byte chunks
/// * `on_chunk` - Invoked with each content fragment, in order
///
/// # Returns
///
/// Returns the concatenation of every content fragment
///
/// # Errors
///
/// Returns `ThirdBrainError::Stream` if reading the body fails part way
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use thirdbrain::providers::decode_stream;
///
/// # tokio_test::block_on(async {
/// let body = futures::stream::iter(vec![
///     Ok::<_, std::io::Error>(Bytes::from_static(b"{\"message\":{\"content\":\"Hi\"}}\n")),
///     Ok(Bytes::from_static(b"{\"message\":{\"content\":\"!\"},\"done\":true}\n")),
/// ]);
///
/// let mut on_chunk = |_: &str| {};
/// let text = decode_stream(body, &mut on_chunk).await.unwrap();
/// assert_eq!(text, "Hi!");
/// # });
/// ```
pub async fn decode_stream<S, E>(byte_stream: S, on_chunk: &mut ChunkCallback<'_>) -> Result<String>
where
    S: Stream<Item = std::result::Result<Bytes, E>>,
    E: std::fmt::Display,
{
    let mut decoder = NdjsonDecoder::new();

    futures::pin_mut!(byte_stream);

    while let Some(chunk_result) = byte_stream.next().await {
        let chunk = chunk_result.map_err(|e| {
            tracing::error!("Error reading response stream: {}", e);
            ThirdBrainError::Stream(e.to_string())
        })?;
        decoder.feed(&chunk, on_chunk);
    }

    Ok(decoder.finish(on_chunk))
}
