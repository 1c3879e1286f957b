//! Shell session layer for comint
//!
//! Wraps a [`comint_terminal::TerminalBuffer`] with what an interactive
//! shell buffer needs on top of output interpretation: echoing submitted
//! input, a command history ring, prompt detection, password prompt
//! detection, and output redirection for completion.

pub mod actor;
pub mod completion;
pub mod config;
pub mod history;
pub mod process;
pub mod prompt;
pub mod session;

pub use actor::SessionHandle;
pub use completion::CompletionRequest;
pub use config::ShellConfig;
pub use history::InputRing;
pub use process::{NullProcess, ProcessInput, WriterProcess};
pub use prompt::{password_prompt, PromptMatcher, DEFAULT_PROMPT_REGEX};
pub use session::{ChunkOutcome, ShellSession};

use comint_terminal::TerminalError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Terminal buffer error: {0}")]
    Terminal(#[from] TerminalError),

    #[error("Invalid prompt pattern: {0}")]
    InvalidPrompt(#[from] regex::Error),

    #[error("Process I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("An output redirection is already in progress")]
    RedirectInProgress,

    #[error("Session task has stopped")]
    Closed,
}
