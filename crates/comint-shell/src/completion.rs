//! Completion through readline's `insert-completions`

/// Asks the shell for the completions of a partial command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    input: String,
}

impl CompletionRequest {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// Keys to send: the input, `M-*` to insert every completion, `C-a` and
    /// `echo '` to turn the line into an echo, `C-e` and return to run it
    pub fn command(&self) -> String {
        format!("{}\x1b*'\x01echo '\x05\n", self.input)
    }

    /// Candidates from the captured output, with the echoed input removed
    pub fn parse_candidates(&self, output: &str) -> Vec<String> {
        let output = output.strip_prefix(self.input.as_str()).unwrap_or(output);
        output.split_whitespace().map(str::to_string).collect()
    }
}
