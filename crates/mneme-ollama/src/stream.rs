// SPDX-FileCopyrightText: 2026 Mneme Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! NDJSON parser for streamed `/api/generate` responses.
//!
//! Ollama streams one JSON object per line. Lines may be split across, or
//! packed into, network chunks, so bytes are buffered until a newline.

use std::fmt::Display;

use futures::stream::{Stream, StreamExt};
use mneme_core::{MnemeError, TextStream};

use crate::types::{ApiErrorResponse, GenerateResponse};

/// Turn a byte stream of NDJSON lines into a stream of text fragments.
///
/// Empty fragments are skipped, `done: true` ends the stream, and an
/// `{"error": ...}` line yields one error item and ends the stream.
pub fn parse_ndjson_stream<S, B, E>(bytes: S) -> TextStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    let state = LineReader {
        bytes: Box::pin(bytes),
        buffer: Vec::new(),
        finished: false,
    };

    Box::pin(futures::stream::unfold(state, |mut reader| async move {
        let item = reader.next_fragment().await?;
        Some((item, reader))
    }))
}

struct LineReader<S> {
    bytes: std::pin::Pin<Box<S>>,
    buffer: Vec<u8>,
    finished: bool,
}

impl<S, B, E> LineReader<S>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
{
    async fn next_fragment(&mut self) -> Option<Result<String, MnemeError>> {
        if self.finished {
            return None;
        }

        loop {
            if let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = self.buffer.drain(..=pos).collect();
                match self.decode(&line) {
                    Some(item) => return Some(item),
                    None if self.finished => return None,
                    None => continue,
                }
            }

            match self.bytes.next().await {
                Some(Ok(chunk)) => self.buffer.extend_from_slice(chunk.as_ref()),
                Some(Err(e)) => {
                    self.finished = true;
                    return Some(Err(MnemeError::provider(format!(
                        "stream read failed: {e}"
                    ))));
                }
                None => {
                    // Trailing line without a newline terminator.
                    let rest = std::mem::take(&mut self.buffer);
                    self.finished = true;
                    return self.decode(&rest);
                }
            }
        }
    }

    /// Decode one line. `None` means nothing to emit for it.
    fn decode(&mut self, line: &[u8]) -> Option<Result<String, MnemeError>> {
        let text = String::from_utf8_lossy(line);
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        if let Ok(api_err) = serde_json::from_str::<ApiErrorResponse>(text) {
            self.finished = true;
            return Some(Err(MnemeError::provider(format!(
                "Ollama stream error: {}",
                api_err.error
            ))));
        }

        match serde_json::from_str::<GenerateResponse>(text) {
            Ok(chunk) => {
                if chunk.done {
                    self.finished = true;
                }
                if chunk.response.is_empty() {
                    None
                } else {
                    Some(Ok(chunk.response))
                }
            }
            Err(e) => {
                self.finished = true;
                Some(Err(MnemeError::Provider {
                    message: format!("malformed stream line: {e}"),
                    source: Some(Box::new(e)),
                }))
            }
        }
    }
}
