//! Shell session configuration

use crate::prompt::DEFAULT_PROMPT_REGEX;
use comint_terminal::BufferConfig;
use std::process::Command;

/// How to start the shell and how to read its output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    /// Shell executable
    pub shell_file: String,

    /// Arguments passed to the shell
    pub shell_args: Vec<String>,

    /// Commands sent to the shell right after it starts
    pub init_commands: Vec<String>,

    /// Pattern for prompts, matched per line
    pub prompt_regex: String,

    /// Output interpretation switches
    pub buffer: BufferConfig,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            shell_file: "bash".to_string(),
            shell_args: Vec::new(),
            init_commands: Vec::new(),
            prompt_regex: DEFAULT_PROMPT_REGEX.to_string(),
            buffer: BufferConfig::default(),
        }
    }
}

impl ShellConfig {
    pub fn with_shell(mut self, shell_file: impl Into<String>, shell_args: Vec<String>) -> Self {
        self.shell_file = shell_file.into();
        self.shell_args = shell_args;
        self
    }

    pub fn with_init_commands(mut self, init_commands: Vec<String>) -> Self {
        self.init_commands = init_commands;
        self
    }

    pub fn with_prompt_regex(mut self, prompt_regex: impl Into<String>) -> Self {
        self.prompt_regex = prompt_regex.into();
        self
    }

    pub fn with_buffer(mut self, buffer: BufferConfig) -> Self {
        self.buffer = buffer;
        self
    }

    /// Command for the PTY host to spawn
    pub fn command(&self) -> Command {
        let mut command = Command::new(&self.shell_file);
        command.args(&self.shell_args);
        command
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ShellConfig::default();
        assert_eq!(config.shell_file, "bash");
        assert_eq!(config.prompt_regex, DEFAULT_PROMPT_REGEX);
        assert!(!config.buffer.carry_partial_escapes);
    }

    #[test]
    fn test_command() {
        let config = ShellConfig::default().with_shell("zsh", vec!["-i".to_string()]);
        let command = config.command();
        assert_eq!(command.get_program(), "zsh");
        assert_eq!(command.get_args().collect::<Vec<_>>(), vec!["-i"]);
    }
}
