use anyhow::Result;
use comint_terminal::{TerminalBuffer, TerminalError};
use similar::{ChangeTag, TextDiff};

/// Raw output with every escape sequence removed
pub fn strip_ansi(raw: &str) -> String {
    let stripped = strip_ansi_escapes::strip(raw);
    String::from_utf8_lossy(&stripped).into_owned()
}

/// Split `text` into chunks of at most `size` characters
pub fn chunks_of(text: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(size.max(1))
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// A fresh buffer with every chunk applied in order
pub fn apply_chunks<S: AsRef<str>>(chunks: &[S]) -> Result<TerminalBuffer, TerminalError> {
    let mut terminal = TerminalBuffer::new();
    for chunk in chunks {
        terminal.apply_chunk(chunk.as_ref())?;
    }
    Ok(terminal)
}

pub struct TerminalComparator;

impl Default for TerminalComparator {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalComparator {
    pub fn new() -> Self {
        Self
    }

    /// Compare two transcripts line by line, ignoring styling and trailing
    /// whitespace
    pub fn compare_output(&self, expected: &str, actual: &str) -> Result<()> {
        let expected_clean = self.normalize_output(expected);
        let actual_clean = self.normalize_output(actual);

        if expected_clean == actual_clean {
            return Ok(());
        }

        let diff = TextDiff::from_lines(&expected_clean, &actual_clean);
        let mut diff_output = String::new();

        for change in diff.iter_all_changes() {
            let sign = match change.tag() {
                ChangeTag::Delete => "-",
                ChangeTag::Insert => "+",
                ChangeTag::Equal => " ",
            };
            diff_output.push_str(&format!("{sign}{change}"));
            if change.missing_newline() {
                diff_output.push('\n');
            }
        }

        anyhow::bail!(
            "Terminal output mismatch:\n\nExpected:\n{}\n\nActual:\n{}\n\nDiff:\n{}",
            expected_clean,
            actual_clean,
            diff_output
        )
    }

    pub fn assert_contains(&self, haystack: &str, needle: &str) -> Result<()> {
        let haystack_clean = self.normalize_output(haystack);
        let needle_clean = self.normalize_output(needle);

        if !haystack_clean.contains(&needle_clean) {
            anyhow::bail!(
                "Output does not contain expected text:\nExpected to find:\n{}\n\nIn output:\n{}",
                needle_clean,
                haystack_clean
            );
        }

        Ok(())
    }

    fn normalize_output(&self, output: &str) -> String {
        output
            .lines()
            .map(|line| self.normalize_line(line))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn normalize_line(&self, line: &str) -> String {
        strip_ansi(line).trim_end().to_string()
    }
}
