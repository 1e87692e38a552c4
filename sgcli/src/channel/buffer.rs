//! Accumulation buffer for console output.
//!
//! Bytes stay in the buffer until a pattern match consumes them together with
//! everything before the match. The unmatched remainder carries over to the
//! next expect call.

use bytes::{Buf, BytesMut};
use regex::bytes::Regex;

/// Buffer for accumulating output and consuming it at pattern matches.
#[derive(Debug)]
pub struct PatternBuffer {
    buffer: BytesMut,
}

impl PatternBuffer {
    /// Create an empty buffer with the given initial capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
        }
    }

    /// Append received bytes.
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Find the first match of `pattern` anywhere in the buffer.
    ///
    /// Returns the `(start, end)` byte offsets of the match.
    pub fn search(&self, pattern: &Regex) -> Option<(usize, usize)> {
        self.search_from(pattern, 0)
    }

    /// Find the first match of `pattern` starting at or after `from`.
    ///
    /// Bytes before `from` still count as context for `^` and `\b`.
    pub fn search_from(&self, pattern: &Regex, from: usize) -> Option<(usize, usize)> {
        let from = from.min(self.buffer.len());
        pattern
            .find_at(&self.buffer, from)
            .map(|m| (m.start(), m.end()))
    }

    /// Consume everything up to `end`, splitting it at `start`.
    ///
    /// Returns `(before, matched)`; the buffer keeps only bytes after `end`.
    pub fn consume(&mut self, start: usize, end: usize) -> (Vec<u8>, Vec<u8>) {
        let end = end.min(self.buffer.len());
        let start = start.min(end);
        let mut head = self.buffer.split_to(end);
        let before = head.split_to(start).to_vec();
        (before, head.to_vec())
    }

    /// Take ownership of the buffer contents and reset.
    pub fn take(&mut self) -> Vec<u8> {
        let data = self.buffer.to_vec();
        self.buffer.advance(self.buffer.len());
        data
    }

    /// Get a reference to the buffer contents.
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Get the current buffer length.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl Default for PatternBuffer {
    fn default() -> Self {
        Self::with_capacity(4096)
    }
}
