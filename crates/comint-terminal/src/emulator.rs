//! Chunk applier
//!
//! Feeds tokens from each output chunk into the content buffer and span
//! tracker, and carries the state that spans chunk boundaries: a deferred
//! carriage return, SGR codes seen while it is deferred, incomplete UTF-8,
//! and optionally an incomplete escape sequence.

use crate::{
    buffer::ContentBuffer,
    parser::{split_partial_escape, tokenize, Token, TokenKind},
    sgr::SgrSegment,
    state::BufferSnapshot,
    utf8::Utf8Carry,
    TerminalError,
};
use tracing::{debug, trace};

/// Behavior switches for a [`TerminalBuffer`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BufferConfig {
    /// Hold back an escape sequence cut off at the end of a chunk and
    /// prepend it to the next one. When off, the fragment is dropped and
    /// the rest of the sequence arrives as literal text.
    pub carry_partial_escapes: bool,
}

impl BufferConfig {
    pub fn with_carry_partial_escapes(mut self, carry: bool) -> Self {
        self.carry_partial_escapes = carry;
        self
    }
}

/// A shell transcript fed one output chunk at a time
#[derive(Debug, Clone, Default)]
pub struct TerminalBuffer {
    /// Content, cursor and spans
    buffer: ContentBuffer,

    config: BufferConfig,

    /// The previous chunk ended in a lone `\r`
    in_cr: bool,

    /// SGR codes that arrived while a carriage return was deferred
    pending_sgr: Vec<u16>,

    /// Incomplete escape prefix from the previous chunk
    partial_escape: String,

    utf8: Utf8Carry,
}

impl TerminalBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: BufferConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &BufferConfig {
        &self.config
    }

    /// Apply one chunk of shell output. Returns the spans it closed.
    pub fn apply_chunk(&mut self, chunk: &str) -> Result<Vec<SgrSegment>, TerminalError> {
        let joined;
        let chunk = if self.partial_escape.is_empty() {
            chunk
        } else {
            joined = std::mem::take(&mut self.partial_escape) + chunk;
            joined.as_str()
        };

        let chunk = if self.config.carry_partial_escapes {
            let (head, tail) = split_partial_escape(chunk);
            if !tail.is_empty() {
                debug!(len = tail.len(), "carrying partial escape sequence");
                self.partial_escape = tail.to_string();
            }
            head
        } else {
            chunk
        };

        let mut closed = Vec::new();
        for token in tokenize(chunk) {
            self.handle_token(&token, chunk.len(), &mut closed)?;
        }
        Ok(closed)
    }

    /// Apply raw PTY bytes, decoding UTF-8 across reads
    pub fn apply_bytes(&mut self, bytes: &[u8]) -> Result<Vec<SgrSegment>, TerminalError> {
        let text = self.decode(bytes);
        self.apply_chunk(&text)
    }

    /// Decode raw PTY bytes with this stream's UTF-8 carry, without
    /// applying them
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        self.utf8.decode(bytes)
    }

    /// End of stream: replay pending codes and close every open span
    pub fn finish(&mut self) -> Vec<SgrSegment> {
        let held = self.utf8.flush();
        if held > 0 {
            debug!(held, "discarding incomplete utf-8 at end of stream");
        }
        if !self.partial_escape.is_empty() {
            debug!("discarding partial escape sequence at end of stream");
            self.partial_escape.clear();
        }

        let mut closed = self.flush_pending_sgr();
        closed.extend(self.buffer.finish_spans());
        closed
    }

    fn handle_token(
        &mut self,
        token: &Token<'_>,
        chunk_len: usize,
        closed: &mut Vec<SgrSegment>,
    ) -> Result<(), TerminalError> {
        trace!(
            kind = ?token.kind,
            raw = ?token.raw,
            start = token.start_index,
            end = token.end_index,
            "token"
        );

        match &token.kind {
            TokenKind::CrLf => {
                // The newline supersedes any deferred return
                self.in_cr = false;
                closed.extend(self.flush_pending_sgr());
                self.buffer.write_at_cursor(token.output())?;
            }
            TokenKind::CarriageReturn => {
                self.in_cr = true;
                // At the end of a chunk a leading `\n` in the next one would
                // make this a CRLF, so the move waits
                if !token.ends_chunk(chunk_len) {
                    closed.extend(self.resolve_carriage_return());
                }
            }
            TokenKind::KillLine => {
                closed.extend(self.resolve_carriage_return());
                self.buffer.kill_line()?;
            }
            TokenKind::KillLineBackward => {
                closed.extend(self.resolve_carriage_return());
                self.buffer.kill_line_backward()?;
            }
            TokenKind::KillWholeLine => {
                closed.extend(self.resolve_carriage_return());
                self.buffer.kill_whole_line()?;
            }
            TokenKind::CursorColumn(column) => {
                closed.extend(self.resolve_carriage_return());
                self.buffer.set_column(*column);
            }
            TokenKind::Sgr(codes) => self.apply_sgr(codes, closed),
            TokenKind::IndependentReset => self.apply_sgr(&[0], closed),
            TokenKind::Ignored => debug!(raw = ?token.raw, "ignoring escape sequence"),
            TokenKind::Unprintable => trace!(raw = ?token.raw, "dropping unprintable"),
            TokenKind::Text => {
                if self.in_cr && token.raw.starts_with('\n') {
                    // The deferred return and this newline were one CRLF
                    self.in_cr = false;
                    closed.extend(self.flush_pending_sgr());
                } else {
                    closed.extend(self.resolve_carriage_return());
                }
                self.buffer.write_at_cursor(token.output())?;
            }
        }
        Ok(())
    }

    fn apply_sgr(&mut self, codes: &[u16], closed: &mut Vec<SgrSegment>) {
        if self.in_cr {
            // Where these take effect depends on how the return resolves
            self.pending_sgr.extend_from_slice(codes);
        } else {
            closed.extend(self.buffer.process_sgr_codes(codes));
        }
    }

    /// Carry out a deferred carriage return, then the codes queued behind it
    fn resolve_carriage_return(&mut self) -> Vec<SgrSegment> {
        if self.in_cr {
            self.buffer.carriage_return();
            self.in_cr = false;
        }
        self.flush_pending_sgr()
    }

    fn flush_pending_sgr(&mut self) -> Vec<SgrSegment> {
        if self.pending_sgr.is_empty() {
            return Vec::new();
        }
        let codes = std::mem::take(&mut self.pending_sgr);
        self.buffer.process_sgr_codes(&codes)
    }

    /// Overwrite at `at` without moving the cursor. Used for local edits.
    pub fn write(&mut self, text: &str, at: usize) -> Result<usize, TerminalError> {
        self.buffer.write(text, at)
    }

    /// Delete the inclusive range. Used for local edits.
    pub fn delete(&mut self, start_index: usize, end_index: usize) -> Result<(), TerminalError> {
        self.buffer.delete(start_index, end_index)
    }

    pub fn set_write_index(&mut self, index: usize) -> Result<(), TerminalError> {
        self.buffer.set_write_index(index)
    }

    /// Move the cursor to the end of the content, dropping any deferred
    /// carriage return
    pub fn move_to_end(&mut self) {
        self.in_cr = false;
        self.buffer.move_to_end();
        self.flush_pending_sgr();
    }

    pub fn content(&self) -> String {
        self.buffer.content()
    }

    pub fn data(&self) -> Vec<u8> {
        self.buffer.data()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn slice(&self, start: usize, end: usize) -> String {
        self.buffer.slice(start, end)
    }

    pub fn write_index(&self) -> usize {
        self.buffer.write_index()
    }

    pub fn in_cr(&self) -> bool {
        self.in_cr
    }

    pub fn sgr_segments(&self) -> &[SgrSegment] {
        self.buffer.sgr_segments()
    }

    pub fn open_segments(&self) -> &[SgrSegment] {
        self.buffer.open_segments()
    }

    pub fn buffer(&self) -> &ContentBuffer {
        &self.buffer
    }

    pub fn snapshot(&self) -> BufferSnapshot {
        BufferSnapshot {
            content: self.buffer.content(),
            write_index: self.buffer.write_index(),
            in_cr: self.in_cr,
            sgr_segments: self.buffer.sgr_segments().to_vec(),
            open_segments: self.buffer.open_segments().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn seg(code: u16, start_index: usize, end_index: usize) -> SgrSegment {
        SgrSegment {
            code,
            start_index,
            end_index,
        }
    }

    #[test]
    fn test_bare_cr_overwrites_line_start() {
        let mut term = TerminalBuffer::new();
        term.apply_chunk("AAAA\rBB").unwrap();
        assert_eq!(term.content(), "BBAA");
        assert_eq!(term.write_index(), 2);
        assert!(!term.in_cr());
    }

    #[test]
    fn test_trailing_cr_is_deferred() {
        let mut term = TerminalBuffer::new();
        term.apply_chunk("foo\r").unwrap();
        assert!(term.in_cr());
        assert_eq!(term.write_index(), 3);

        term.apply_chunk("\r\nbar").unwrap();
        assert!(!term.in_cr());
        assert_eq!(term.content(), "foo\nbar");
    }

    #[test]
    fn test_crlf_split_across_chunks() {
        let mut term = TerminalBuffer::new();
        term.apply_chunk("line one\r").unwrap();
        term.apply_chunk("\nline two").unwrap();
        assert_eq!(term.content(), "line one\nline two");
        assert!(!term.in_cr());
    }

    #[test]
    fn test_deferred_cr_resolves_on_text() {
        let mut term = TerminalBuffer::new();
        term.apply_chunk("password\rsafe").unwrap();
        assert_eq!(term.content(), "safeword");

        term.apply_chunk("ty first!\r\n").unwrap();
        assert_eq!(term.content(), "safety first!\n");
        assert!(!term.in_cr());
    }

    #[test]
    fn test_sgr_span() {
        let mut term = TerminalBuffer::new();
        let closed = term.apply_chunk("\x1b[31mred\x1b[0m plain").unwrap();
        assert_eq!(term.content(), "red plain");
        assert_eq!(closed, vec![seg(31, 0, 2)]);
        assert_eq!(term.sgr_segments(), &[seg(31, 0, 2)]);
    }

    #[test]
    fn test_sgr_after_deferred_cr_lands_at_line_start() {
        let mut term = TerminalBuffer::new();
        term.apply_chunk("old line\r").unwrap();
        term.apply_chunk("\x1b[32mnew\x1b[0m").unwrap();
        assert_eq!(term.content(), "new line");
        assert_eq!(term.sgr_segments(), &[seg(32, 0, 2)]);
    }

    #[test]
    fn test_sgr_after_deferred_cr_then_crlf() {
        let mut term = TerminalBuffer::new();
        term.apply_chunk("\x1b[31mred\r").unwrap();
        term.apply_chunk("\x1b[0m\r\n").unwrap();
        assert_eq!(term.content(), "red\n");
        assert_eq!(term.sgr_segments(), &[seg(31, 0, 2)]);
    }

    #[test]
    fn test_cursor_column() {
        let mut term = TerminalBuffer::new();
        term.apply_chunk("abc\nhello\x1b[2GEY").unwrap();
        assert_eq!(term.content(), "abc\nhEYlo");
        assert_eq!(term.write_index(), 7);
    }

    #[test]
    fn test_cursor_column_past_any_line_clamps() {
        let mut term = TerminalBuffer::new();
        term.apply_chunk("ab\ncd\x1b[18446744073709551615GX").unwrap();
        assert_eq!(term.content(), "ab\ncdX");

        let mut term = TerminalBuffer::new();
        term.apply_chunk("ab\ncdef\x1b[99999999999999999999999GX").unwrap();
        assert_eq!(term.content(), "ab\ncdefX");
        assert_eq!(term.write_index(), 8);
    }

    #[test]
    fn test_independent_reset_closes_spans() {
        let mut term = TerminalBuffer::new();
        term.apply_chunk("\x1b[1mbold\x1bc").unwrap();
        assert_eq!(term.sgr_segments(), &[seg(1, 0, 3)]);
        assert!(term.open_segments().is_empty());
    }

    #[test]
    fn test_finish_closes_open_spans() {
        let mut term = TerminalBuffer::new();
        term.apply_chunk("\x1b[44mblue").unwrap();
        assert_eq!(term.open_segments(), &[seg(44, 0, 0)]);
        assert_eq!(term.finish(), vec![seg(44, 0, 3)]);
        assert!(term.open_segments().is_empty());
    }

    #[test]
    fn test_split_escape_without_carry() {
        let mut term = TerminalBuffer::new();
        term.apply_chunk("a\x1b[3").unwrap();
        term.apply_chunk("1mb").unwrap();
        assert_eq!(term.content(), "a1mb");
        assert!(term.open_segments().is_empty());
    }

    #[test]
    fn test_split_escape_with_carry() {
        let mut term =
            TerminalBuffer::with_config(BufferConfig::default().with_carry_partial_escapes(true));
        term.apply_chunk("a\x1b[3").unwrap();
        term.apply_chunk("1mb\x1b").unwrap();
        term.apply_chunk("[0m").unwrap();
        assert_eq!(term.content(), "ab");
        assert_eq!(term.sgr_segments(), &[seg(31, 1, 1)]);
    }

    #[test]
    fn test_apply_bytes_across_split_character() {
        let mut term = TerminalBuffer::new();
        let bytes = "né\r".as_bytes();
        term.apply_bytes(&bytes[..2]).unwrap();
        assert_eq!(term.content(), "n");
        term.apply_bytes(&bytes[2..]).unwrap();
        assert_eq!(term.content(), "né");
        assert!(term.in_cr());
    }

    #[test]
    fn test_local_write_and_delete() {
        let mut term = TerminalBuffer::new();
        term.apply_chunk("$ ").unwrap();
        let next = term.write("ls\n", term.write_index()).unwrap();
        assert_eq!(next, 5);
        term.set_write_index(next).unwrap();
        term.delete(2, 4).unwrap();
        assert_eq!(term.content(), "$ ");
        assert_eq!(term.write_index(), 2);
    }
}
