//! Channel layer for pattern matching over a byte stream.
//!
//! This module holds the prompt pattern library, the accumulation buffer and
//! the expect engine that drives a [`Transport`](crate::transport::Transport).

mod buffer;
mod expect;
pub mod patterns;

pub use buffer::PatternBuffer;
pub use expect::{ExpectChannel, ExpectResult, Pattern, PromptEvent, READ_CHUNK};
pub use patterns::PromptKind;
