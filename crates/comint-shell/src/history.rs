//! Command history ring

/// Previously submitted commands, stepped through with wraparound
#[derive(Debug, Clone, Default)]
pub struct InputRing {
    entries: Vec<String>,
    index: usize,
}

impl InputRing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a command. The position moves one past the newest entry.
    pub fn push(&mut self, command: impl Into<String>) {
        self.entries.push(command.into());
        self.index = self.entries.len();
    }

    /// Entry at the current position, empty when past the end
    pub fn current(&self) -> &str {
        self.entries.get(self.index).map_or("", String::as_str)
    }

    /// Step back, wrapping from the oldest entry to the newest
    pub fn previous(&mut self) -> &str {
        self.index = match self.index {
            0 => self.entries.len().saturating_sub(1),
            i => i - 1,
        };
        self.current()
    }

    /// Step forward, wrapping from the newest entry to the oldest
    pub fn next(&mut self) -> &str {
        self.index += 1;
        if self.index >= self.entries.len() {
            self.index = 0;
        }
        self.current()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}
