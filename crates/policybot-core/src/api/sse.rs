//! Line-oriented `data:` decoding for server-sent event bodies.
//!
//! Both the query stream and the upload-processing stream put one payload per
//! `data:` line; blank separator lines and other fields are skipped.

use futures_util::{Stream, StreamExt};
use std::collections::VecDeque;
use std::pin::Pin;

use crate::error::ApiError;

/// Splits an arbitrary chunking of a byte stream into `data:` payloads.
#[derive(Debug, Default)]
pub struct SseLineDecoder {
    buffer: Vec<u8>,
}

impl SseLineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return the payloads of every line it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(data) = parse_data_line(&line) {
                payloads.push(data);
            }
        }
        payloads
    }

    /// Flush a trailing line that was not newline-terminated.
    pub fn finish(&mut self) -> Vec<String> {
        let rest = std::mem::take(&mut self.buffer);
        parse_data_line(&rest).into_iter().collect()
    }
}

fn parse_data_line(raw: &[u8]) -> Option<String> {
    let line = String::from_utf8_lossy(raw);
    let line = line.trim_end_matches(|c| c == '\n' || c == '\r');
    let data = line.strip_prefix("data:")?;
    Some(data.strip_prefix(' ').unwrap_or(data).to_string())
}

/// Pull-based reader of `data:` payloads from a streamed response body.
pub struct SseStream<S> {
    inner: Pin<Box<S>>,
    decoder: SseLineDecoder,
    pending: VecDeque<String>,
    finished: bool,
}

impl<S, B> SseStream<S>
where
    S: Stream<Item = Result<B, reqwest::Error>>,
    B: AsRef<[u8]>,
{
    pub fn new(inner: S) -> Self {
        Self {
            inner: Box::pin(inner),
            decoder: SseLineDecoder::new(),
            pending: VecDeque::new(),
            finished: false,
        }
    }

    /// Next payload; `None` once the body is exhausted. A read error is
    /// reported once and ends the stream.
    pub async fn next_data(&mut self) -> Option<Result<String, ApiError>> {
        loop {
            if let Some(data) = self.pending.pop_front() {
                return Some(Ok(data));
            }
            if self.finished {
                return None;
            }
            match self.inner.next().await {
                Some(Ok(chunk)) => self.pending.extend(self.decoder.push(chunk.as_ref())),
                Some(Err(err)) => {
                    self.finished = true;
                    return Some(Err(ApiError::from(err)));
                }
                None => {
                    self.finished = true;
                    self.pending.extend(self.decoder.finish());
                }
            }
        }
    }
}
