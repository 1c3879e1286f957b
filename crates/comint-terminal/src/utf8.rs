//! Incremental UTF-8 decoding for PTY reads
//!
//! A read can end in the middle of a multi-byte character; the incomplete
//! tail is held until the next read completes it.

use tracing::debug;

/// Carries an incomplete trailing UTF-8 sequence between reads
#[derive(Debug, Clone, Default)]
pub struct Utf8Carry {
    pending: Vec<u8>,
}

impl Utf8Carry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes held back from the previous call
    pub fn pending(&self) -> &[u8] {
        &self.pending
    }

    /// Decode `bytes` after whatever was held back. Invalid sequences become
    /// U+FFFD; an incomplete sequence at the end is kept for the next call.
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        let mut input = std::mem::take(&mut self.pending);
        input.extend_from_slice(bytes);

        let mut out = String::with_capacity(input.len());
        let mut rest = input.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    out.push_str(text);
                    break;
                }
                Err(e) => {
                    let (valid, tail) = rest.split_at(e.valid_up_to());
                    if let Ok(text) = std::str::from_utf8(valid) {
                        out.push_str(text);
                    }
                    match e.error_len() {
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &tail[bad..];
                        }
                        None => {
                            debug!(held = tail.len(), "holding incomplete utf-8 sequence");
                            self.pending = tail.to_vec();
                            break;
                        }
                    }
                }
            }
        }
        out
    }

    /// Drop any held bytes, returning how many there were
    pub fn flush(&mut self) -> usize {
        let held = self.pending.len();
        self.pending.clear();
        held
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_multibyte_character() {
        let mut carry = Utf8Carry::new();
        let bytes = "añb".as_bytes();

        assert_eq!(carry.decode(&bytes[..2]), "a");
        assert_eq!(carry.pending(), &bytes[1..2]);
        assert_eq!(carry.decode(&bytes[2..]), "ñb");
        assert!(carry.pending().is_empty());
    }

    #[test]
    fn test_invalid_bytes_are_replaced() {
        let mut carry = Utf8Carry::new();
        assert_eq!(carry.decode(b"a\xffb"), "a\u{FFFD}b");
    }

    #[test]
    fn test_flush_discards_tail() {
        let mut carry = Utf8Carry::new();
        assert_eq!(carry.decode(&[b'x', 0xe2, 0x82]), "x");
        assert_eq!(carry.flush(), 2);
        assert_eq!(carry.decode(b"y"), "y");
    }
}
