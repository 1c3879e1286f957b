//! Content buffer engine
//!
//! Owns the flat character content, the write cursor and the style spans.
//! All mutation goes through [`ContentBuffer::write`] and
//! [`ContentBuffer::delete`], which keep the span indices in step with the
//! content.

use crate::sgr::{SgrSegment, SpanTracker};
use crate::TerminalError;
use tracing::{debug, warn};

/// Flat terminal transcript with a write cursor
#[derive(Debug, Clone, Default)]
pub struct ContentBuffer {
    /// Characters of the transcript
    content: Vec<char>,

    /// Where the next literal write lands
    write_index: usize,

    /// Style spans over `content`
    spans: SpanTracker,
}

impl ContentBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Current content as a string
    pub fn content(&self) -> String {
        self.content.iter().collect()
    }

    /// Current content as UTF-8 bytes
    pub fn data(&self) -> Vec<u8> {
        self.content().into_bytes()
    }

    /// Content between two character offsets (end exclusive), clamped to
    /// the buffer
    pub fn slice(&self, start: usize, end: usize) -> String {
        let end = end.min(self.content.len());
        let start = start.min(end);
        self.content[start..end].iter().collect()
    }

    /// Length in characters
    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn write_index(&self) -> usize {
        self.write_index
    }

    /// Move the write cursor, e.g. to where local echo should go
    pub fn set_write_index(&mut self, index: usize) -> Result<(), TerminalError> {
        if index > self.content.len() {
            return Err(TerminalError::OutOfBounds {
                index,
                len: self.content.len(),
            });
        }
        self.write_index = index;
        Ok(())
    }

    /// Closed style spans
    pub fn sgr_segments(&self) -> &[SgrSegment] {
        self.spans.closed()
    }

    /// Style spans that have not been terminated yet
    pub fn open_segments(&self) -> &[SgrSegment] {
        self.spans.open()
    }

    /// Apply SGR codes at the write cursor, returning the spans they close
    pub fn process_sgr_codes(&mut self, codes: &[u16]) -> Vec<SgrSegment> {
        self.spans.process_sgr_codes(codes, self.write_index)
    }

    /// Close all open spans at the write cursor
    pub fn finish_spans(&mut self) -> Vec<SgrSegment> {
        self.spans.finish(self.write_index)
    }

    /// Write `text` over the buffer starting at `at`, growing it when the
    /// text runs past the end. Styling in the overwritten range is removed.
    /// Returns the index just after the written text. The write cursor is
    /// left alone.
    pub fn write(&mut self, text: &str, at: usize) -> Result<usize, TerminalError> {
        let len = self.content.len();
        if at > len {
            warn!(at, len, "rejecting write past end of buffer");
            return Err(TerminalError::WriteOutOfBounds { index: at, len });
        }

        let chars: Vec<char> = text.chars().collect();
        let written = chars.len();
        if written == 0 {
            return Ok(at);
        }

        self.spans.overwrite(at, written);

        let overlap = (len - at).min(written);
        self.content.splice(at..at + overlap, chars);
        Ok(at + written)
    }

    /// Remove the inclusive range `[start_index, end_index]`, shifting the
    /// rest of the content, the spans and the cursor left.
    pub fn delete(&mut self, start_index: usize, end_index: usize) -> Result<(), TerminalError> {
        let len = self.content.len();
        if end_index < start_index {
            warn!(start_index, end_index, "rejecting inverted delete range");
            return Err(TerminalError::InvalidRange {
                start: start_index,
                end: end_index,
            });
        }
        let width = end_index - start_index + 1;
        if width > len {
            warn!(start_index, end_index, len, "rejecting oversized delete");
            return Err(TerminalError::DeleteExceedsBuffer {
                start: start_index,
                end: end_index,
                len,
            });
        }
        if end_index >= len {
            warn!(start_index, end_index, len, "rejecting delete past end of buffer");
            return Err(TerminalError::OutOfBounds {
                index: end_index,
                len,
            });
        }

        self.content.drain(start_index..=end_index);
        self.spans.remove(start_index, end_index);

        if self.write_index > end_index {
            self.write_index -= width;
        } else if self.write_index > start_index {
            self.write_index = start_index;
        }
        Ok(())
    }

    /// Write at the cursor and advance it
    pub fn write_at_cursor(&mut self, text: &str) -> Result<(), TerminalError> {
        self.write_index = self.write(text, self.write_index)?;
        Ok(())
    }

    /// Start of the line containing `before`: one past the last newline
    /// strictly before it
    pub fn line_start(&self, before: usize) -> usize {
        let before = before.min(self.content.len());
        self.content[..before]
            .iter()
            .rposition(|&c| c == '\n')
            .map_or(0, |i| i + 1)
    }

    /// End of the line starting at `start`: the index of its newline, or the
    /// buffer length on the last line
    pub fn line_end(&self, start: usize) -> usize {
        let start = start.min(self.content.len());
        self.content[start..]
            .iter()
            .position(|&c| c == '\n')
            .map_or(self.content.len(), |i| start + i)
    }

    /// Bare carriage return: back to the start of the current line
    pub fn carriage_return(&mut self) {
        self.write_index = self.line_start(self.write_index);
        debug!(write_index = self.write_index, "carriage return");
    }

    /// Erase from the cursor to the end of the buffer
    pub fn kill_line(&mut self) -> Result<(), TerminalError> {
        let len = self.content.len();
        if self.write_index < len {
            self.delete(self.write_index, len - 1)?;
        }
        Ok(())
    }

    /// Erase from the start of the current line to the end of the buffer
    pub fn kill_whole_line(&mut self) -> Result<(), TerminalError> {
        let len = self.content.len();
        let start = self.line_start(self.write_index);
        if start < len {
            self.delete(start, len - 1)?;
        }
        Ok(())
    }

    /// Blank the current line from its start through the character under
    /// the cursor. The cursor does not move.
    pub fn kill_line_backward(&mut self) -> Result<(), TerminalError> {
        let start = self.line_start(self.write_index);
        let end = if self.write_index < self.line_end(start) {
            self.write_index + 1
        } else {
            self.write_index
        };
        if end > start {
            let blanks = " ".repeat(end - start);
            self.write(&blanks, start)?;
        }
        Ok(())
    }

    /// Cursor Horizontal Absolute: move to 1-based `column` of the current
    /// line, stopping at the end of the line
    pub fn set_column(&mut self, column: usize) {
        let start = self.line_start(self.write_index);
        let target = start.saturating_add(column.saturating_sub(1));
        self.write_index = target.min(self.line_end(start));
        debug!(column, write_index = self.write_index, "cursor horizontal absolute");
    }

    /// Move the cursor to the end of the content
    pub fn move_to_end(&mut self) {
        self.write_index = self.content.len();
    }
}
