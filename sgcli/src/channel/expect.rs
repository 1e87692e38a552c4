//! Expect engine: read from a transport until one of several patterns matches.

use std::time::Duration;

use log::trace;
use regex::bytes::Regex;
use tokio::time::Instant;

use super::buffer::PatternBuffer;
use super::patterns::PromptKind;
use crate::error::Result;
use crate::transport::Transport;

/// Upper bound for a single transport read.
pub const READ_CHUNK: usize = 1024;

/// Outcome of an [`ExpectChannel::expect`] call.
///
/// End of stream is reported as a match at index `patterns.len()`, one past
/// the last caller-supplied pattern, with the unconsumed buffer as `before`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpectResult {
    /// A pattern matched (or the stream ended).
    Matched {
        /// Position of the matching pattern in the supplied list.
        index: usize,
        /// The matched text.
        matched: String,
        /// Text received before the match, now consumed.
        before: String,
    },
    /// No pattern matched before the deadline.
    Timeout,
}

impl ExpectResult {
    /// Index of the matched pattern, `None` on timeout.
    pub fn index(&self) -> Option<usize> {
        match self {
            ExpectResult::Matched { index, .. } => Some(*index),
            ExpectResult::Timeout => None,
        }
    }

    /// Text before the match, empty on timeout.
    pub fn before(&self) -> &str {
        match self {
            ExpectResult::Matched { before, .. } => before,
            ExpectResult::Timeout => "",
        }
    }
}

/// A pattern handed to [`ExpectChannel::expect_patterns`].
#[derive(Debug, Clone, Copy)]
pub struct Pattern<'a> {
    regex: &'a Regex,
    reach: Option<usize>,
}

impl<'a> Pattern<'a> {
    /// A pattern searched over the whole buffer on every read.
    pub fn anywhere(regex: &'a Regex) -> Self {
        Self { regex, reach: None }
    }

    /// A pattern whose matches span at most `reach` bytes, so only the
    /// fresh data and `reach` bytes before it are searched after a read.
    pub fn bounded(regex: &'a Regex, reach: usize) -> Self {
        Self {
            regex,
            reach: Some(reach),
        }
    }

    /// Where to resume after the buffer was searched up to `searched`.
    fn resume_at(&self, searched: usize) -> usize {
        match self.reach {
            Some(reach) => searched.saturating_sub(reach),
            None => 0,
        }
    }
}

/// An [`ExpectResult`] classified against a list of [`PromptKind`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptEvent {
    /// A known prompt was reached.
    Prompt { kind: PromptKind, before: String },
    /// The peer closed the stream.
    Eof { before: String },
    /// Nothing recognizable arrived in time.
    Timeout,
}

/// A transport wrapped with an accumulation buffer and pattern reads.
pub struct ExpectChannel<T> {
    transport: T,
    buffer: PatternBuffer,
    eof: bool,
}

impl<T: Transport> ExpectChannel<T> {
    /// Wrap a connected transport.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            buffer: PatternBuffer::default(),
            eof: false,
        }
    }

    /// Read until the first pattern, in list order, matches the buffer.
    ///
    /// Priority follows declaration order: when several patterns match, the
    /// lowest index wins even if another match starts earlier in the text.
    /// Only transport failures are errors; a miss returns
    /// [`ExpectResult::Timeout`].
    pub async fn expect(&mut self, patterns: &[&Regex], timeout: Duration) -> Result<ExpectResult> {
        let patterns: Vec<Pattern<'_>> = patterns.iter().map(|re| Pattern::anywhere(re)).collect();
        self.expect_patterns(&patterns, timeout).await
    }

    /// [`expect`](Self::expect) over patterns that may carry a reach.
    ///
    /// The first pass searches the whole buffer. After each read a bounded
    /// pattern is only searched from `reach` bytes before the new data,
    /// which finds the same match because none existed before the read.
    pub async fn expect_patterns(
        &mut self,
        patterns: &[Pattern<'_>],
        timeout: Duration,
    ) -> Result<ExpectResult> {
        let deadline = Instant::now() + timeout;
        // Buffer length at the last pass that found nothing
        let mut searched = 0;

        loop {
            for (index, pattern) in patterns.iter().enumerate() {
                let from = pattern.resume_at(searched);
                if let Some((start, end)) = self.buffer.search_from(pattern.regex, from) {
                    let (before, matched) = self.buffer.consume(start, end);
                    trace!("expect: pattern {} matched {} bytes", index, matched.len());
                    return Ok(ExpectResult::Matched {
                        index,
                        matched: String::from_utf8_lossy(&matched).into_owned(),
                        before: String::from_utf8_lossy(&before).into_owned(),
                    });
                }
            }
            searched = self.buffer.len();

            if self.eof {
                let before = self.buffer.take();
                return Ok(ExpectResult::Matched {
                    index: patterns.len(),
                    matched: String::new(),
                    before: String::from_utf8_lossy(&before).into_owned(),
                });
            }

            if Instant::now() >= deadline {
                return Ok(ExpectResult::Timeout);
            }

            match tokio::time::timeout_at(deadline, self.transport.read(READ_CHUNK)).await {
                Err(_) => return Ok(ExpectResult::Timeout),
                Ok(chunk) => {
                    let chunk = chunk?;
                    if chunk.is_empty() {
                        trace!("expect: end of stream");
                        self.eof = true;
                    } else {
                        self.buffer.extend(&chunk);
                    }
                }
            }
        }
    }

    /// Expect one of `kinds` and classify the result.
    pub async fn expect_prompt(
        &mut self,
        kinds: &[PromptKind],
        timeout: Duration,
    ) -> Result<PromptEvent> {
        let patterns: Vec<Pattern<'_>> = kinds.iter().map(|kind| kind.pattern()).collect();

        Ok(match self.expect_patterns(&patterns, timeout).await? {
            ExpectResult::Timeout => PromptEvent::Timeout,
            ExpectResult::Matched { index, before, .. } => match kinds.get(index) {
                Some(kind) => PromptEvent::Prompt { kind: *kind, before },
                None => PromptEvent::Eof { before },
            },
        })
    }

    /// Write raw bytes.
    pub async fn write(&mut self, data: &[u8]) -> Result<()> {
        self.transport.write(data).await
    }

    /// Write a line terminated by a carriage return.
    pub async fn send_line(&mut self, line: &str) -> Result<()> {
        let mut data = Vec::with_capacity(line.len() + 1);
        data.extend_from_slice(line.as_bytes());
        data.push(b'\r');
        self.transport.write(&data).await
    }

    /// Whether the peer has closed the stream.
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    /// Bytes received but not yet consumed by a match.
    pub fn pending(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    /// Close the underlying transport.
    pub async fn close(mut self) -> Result<()> {
        self.transport.close().await
    }
}
