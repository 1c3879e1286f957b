use comint_shell::ProcessInput;
use std::io;
use std::sync::{Arc, Mutex};

/// Records everything a session sends to its shell. Clones share the log.
#[derive(Debug, Clone, Default)]
pub struct RecordingProcess {
    sent: Arc<Mutex<Vec<String>>>,
}

impl RecordingProcess {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every write, in order
    pub fn sent(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// All writes joined together
    pub fn sent_text(&self) -> String {
        self.sent().concat()
    }
}

impl ProcessInput for RecordingProcess {
    fn send(&mut self, data: &str) -> io::Result<()> {
        self.sent
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "recording lock poisoned"))?
            .push(data.to_string());
        Ok(())
    }
}
