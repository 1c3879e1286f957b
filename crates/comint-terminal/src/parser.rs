//! Output chunk tokenizer
//!
//! Splits a chunk of shell output into contiguous tokens: literal text runs,
//! carriage returns, SGR codes, the handful of cursor/erase sequences the
//! buffer understands, and everything else that gets dropped.

use once_cell::sync::Lazy;
use regex::{CaptureMatches, Captures, Regex};

/// Every recognised sequence, most specific first. Alternation is
/// leftmost-first, so earlier groups win at a given position.
static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?P<reset>\x1bc)",
        r"|(?P<csi>\x1b\[(?P<csi_n>[0-9]*)(?P<csi_op>[A-GJKST]))",
        r"|(?P<mode>\x1b\[\?(?:25|2004)[hl])",
        r"|(?P<sgr>\x1b\[(?P<sgr_params>[0-9;]*)m)",
        r"|(?P<unprintable>[\x00-\x09\x0b\x0c\x0e-\x1a\x1c-\x1f]+)",
        r"|(?P<cr>\r+\n?)",
        r"|(?P<other_csi>\x1b\[[0-?]*[ -/]*[@-~])",
        r"|(?P<osc>\x1b\][^\x07\x1b]*(?:\x07|\x1b\\))",
        r"|(?P<esc>\x1b[()*+][0-9A-Za-z]|\x1b[=>78DEHMNOZ\\])",
    ))
    .expect("token pattern is valid")
});

/// An escape sequence that was cut off by the end of the chunk.
static PARTIAL_ESCAPE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\x1b(?:\[[0-?]*[ -/]*|\][^\x07\x1b]*\x1b?|[()*+])?\z")
        .expect("partial escape pattern is valid")
});

/// Classification of a token, decided once by the tokenizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Printable text, written as-is
    Text,
    /// One or more `\r` not followed by `\n`
    CarriageReturn,
    /// `\r+\n`, normalized to a single newline
    CrLf,
    /// Select Graphic Rendition codes, in order
    Sgr(Vec<u16>),
    /// Cursor Horizontal Absolute, 1-based column
    CursorColumn(usize),
    /// `ESC[K` / `ESC[0K`
    KillLine,
    /// `ESC[1K`
    KillLineBackward,
    /// `ESC[2K`
    KillWholeLine,
    /// `ESC c`, treated like SGR 0
    IndependentReset,
    /// Any other escape sequence
    Ignored,
    /// Control bytes other than `\r`, `\n` and `ESC`
    Unprintable,
}

/// A classified slice of a chunk. Indices are byte offsets into the chunk,
/// `end_index` inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub raw: &'a str,
    pub start_index: usize,
    pub end_index: usize,
    pub kind: TokenKind,
}

impl Token<'_> {
    /// Text this token contributes to the buffer
    pub fn output(&self) -> &str {
        match self.kind {
            TokenKind::Text => self.raw,
            TokenKind::CrLf => "\n",
            _ => "",
        }
    }

    /// Whether this token is the last one in a chunk of `chunk_len` bytes
    pub fn ends_chunk(&self, chunk_len: usize) -> bool {
        self.end_index + 1 == chunk_len
    }
}

/// Lazily tokenize a chunk
pub fn tokenize(chunk: &str) -> Tokens<'_> {
    Tokens {
        chunk,
        matches: TOKEN_RE.captures_iter(chunk),
        pending: None,
        pos: 0,
        exhausted: false,
    }
}

/// Split `chunk` into the part that can be tokenized now and a trailing
/// escape prefix that may complete in the next chunk.
pub fn split_partial_escape(chunk: &str) -> (&str, &str) {
    match PARTIAL_ESCAPE_RE.find(chunk) {
        Some(m) => chunk.split_at(m.start()),
        None => (chunk, ""),
    }
}

/// Iterator over the tokens of a chunk. Tokens are contiguous and together
/// cover the whole chunk.
pub struct Tokens<'a> {
    chunk: &'a str,
    matches: CaptureMatches<'static, 'a>,
    pending: Option<Token<'a>>,
    pos: usize,
    exhausted: bool,
}

impl<'a> Tokens<'a> {
    fn next_match_start(&mut self) -> usize {
        if let Some(token) = &self.pending {
            return token.start_index;
        }
        if !self.exhausted {
            match self.matches.next().and_then(|caps| classify(self.chunk, &caps)) {
                Some(token) => {
                    let start = token.start_index;
                    self.pending = Some(token);
                    return start;
                }
                None => self.exhausted = true,
            }
        }
        self.chunk.len()
    }

    /// Literal run between recognised sequences. A stray `ESC` starts a new
    /// run, and a run that starts with one is dropped.
    fn literal(&mut self, end: usize) -> Token<'a> {
        let start = self.pos;
        let text = &self.chunk[start..end];
        let (end, kind) = if text.starts_with('\x1b') {
            (end, TokenKind::Ignored)
        } else {
            match text.find('\x1b') {
                Some(offset) => (start + offset, TokenKind::Text),
                None => (end, TokenKind::Text),
            }
        };
        self.pos = end;
        Token {
            raw: &self.chunk[start..end],
            start_index: start,
            end_index: end - 1,
            kind,
        }
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let next_start = self.next_match_start();
        if self.pos < next_start {
            return Some(self.literal(next_start));
        }
        let token = self.pending.take()?;
        self.pos = token.end_index + 1;
        Some(token)
    }
}

/// 1-based column of a CHA sequence. Missing or zero means the first
/// column; a value too large for `usize` saturates.
fn parse_column(n: &str) -> usize {
    if n.is_empty() {
        return 1;
    }
    n.parse::<usize>().unwrap_or(usize::MAX).max(1)
}

fn classify<'a>(chunk: &'a str, caps: &Captures<'a>) -> Option<Token<'a>> {
    let whole = caps.get(0)?;
    let kind = if caps.name("reset").is_some() {
        TokenKind::IndependentReset
    } else if caps.name("csi").is_some() {
        let n = caps.name("csi_n").map_or("", |m| m.as_str());
        let op = caps.name("csi_op").map_or("", |m| m.as_str());
        match (op, n) {
            ("K", "" | "0") => TokenKind::KillLine,
            ("K", "1") => TokenKind::KillLineBackward,
            ("K", "2") => TokenKind::KillWholeLine,
            ("G", n) => TokenKind::CursorColumn(parse_column(n)),
            _ => TokenKind::Ignored,
        }
    } else if let Some(params) = caps.name("sgr_params") {
        TokenKind::Sgr(parse_sgr_params(params.as_str()))
    } else if caps.name("unprintable").is_some() {
        TokenKind::Unprintable
    } else if let Some(cr) = caps.name("cr") {
        if cr.as_str().ends_with('\n') {
            TokenKind::CrLf
        } else {
            TokenKind::CarriageReturn
        }
    } else {
        TokenKind::Ignored
    };

    Some(Token {
        raw: &chunk[whole.start()..whole.end()],
        start_index: whole.start(),
        end_index: whole.end() - 1,
        kind,
    })
}

/// Parse the parameter list of an SGR sequence. Empty parameters mean 0;
/// parameters too large for a code are skipped. Extended colors (`38;5;n`,
/// `38;2;r;g;b` and the `48` forms) yield a single 38/48 code.
fn parse_sgr_params(params: &str) -> Vec<u16> {
    let mut codes = Vec::new();
    let mut iter = params.split(';').map(|p| {
        if p.is_empty() {
            Some(0)
        } else {
            p.parse::<u16>().ok()
        }
    });

    while let Some(param) = iter.next() {
        let Some(code) = param else { continue };
        codes.push(code);
        if code == 38 || code == 48 {
            let skip = match iter.next() {
                Some(Some(5)) => 1,
                Some(Some(2)) => 3,
                _ => 0,
            };
            for _ in 0..skip {
                iter.next();
            }
        }
    }
    codes
}
