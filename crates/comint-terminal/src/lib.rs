//! Terminal stream interpretation for comint
//!
//! Turns raw shell output (text interleaved with ANSI/VT100 control
//! sequences) into a flat, editable content buffer with a write cursor and a
//! parallel set of SGR style spans.

pub mod buffer;
pub mod display;
pub mod emulator;
pub mod parser;
pub mod sgr;
pub mod state;
pub mod utf8;

pub use buffer::ContentBuffer;
pub use display::{render_ansi, styled_runs, StyledRun};
pub use emulator::{BufferConfig, TerminalBuffer};
pub use parser::{split_partial_escape, tokenize, Token, TokenKind, Tokens};
pub use sgr::{SgrCategory, SgrSegment, SpanTracker};
pub use state::BufferSnapshot;
pub use utf8::Utf8Carry;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TerminalError {
    #[error("Invalid indices: start index ({start}) is greater than end index ({end})")]
    InvalidRange { start: usize, end: usize },

    #[error("Cannot delete more data than is in the buffer: start {start}, end {end}, buffer size {len}")]
    DeleteExceedsBuffer { start: usize, end: usize, len: usize },

    #[error("Index {index} is out of bounds for a buffer of length {len}")]
    OutOfBounds { index: usize, len: usize },

    #[error("Cannot write at index {index}, past the end of the buffer (length {len})")]
    WriteOutOfBounds { index: usize, len: usize },
}
