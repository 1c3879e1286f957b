//! Interactive shell session
//!
//! A [`ShellSession`] owns the terminal buffer for one shell and everything
//! the host does to it besides applying output: echoing submitted commands,
//! stepping through history, finding prompts, and capturing output for
//! completion.

use crate::{
    completion::CompletionRequest,
    config::ShellConfig,
    history::InputRing,
    process::ProcessInput,
    prompt::{self, PromptMatcher},
    SessionError,
};
use comint_terminal::{BufferSnapshot, SgrSegment, TerminalBuffer};
use std::ops::Range;
use tracing::{debug, info};

/// What happened to a chunk of shell output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkOutcome {
    /// Applied to the buffer
    Applied {
        /// Spans the chunk closed
        closed: Vec<SgrSegment>,
        /// Password prompt the content now ends with
        password_prompt: Option<String>,
    },

    /// Held by an output redirection that is still waiting for a prompt
    Captured,

    /// The redirection saw a prompt. Carries everything captured before
    /// the prompt line.
    RedirectFinished(String),
}

/// One shell's transcript plus its input side
#[derive(Debug)]
pub struct ShellSession<P> {
    terminal: TerminalBuffer,
    process: P,
    config: ShellConfig,
    prompt: PromptMatcher,
    ring: InputRing,

    /// Output captured by an active redirection
    redirect: Option<String>,
}

impl<P: ProcessInput> ShellSession<P> {
    pub fn new(config: ShellConfig, process: P) -> Result<Self, SessionError> {
        let prompt = PromptMatcher::new(&config.prompt_regex)?;
        Ok(Self {
            terminal: TerminalBuffer::with_config(config.buffer.clone()),
            process,
            config,
            prompt,
            ring: InputRing::new(),
            redirect: None,
        })
    }

    /// Send the configured init commands
    pub fn start(&mut self) -> Result<(), SessionError> {
        info!(
            shell = %self.config.shell_file,
            init_commands = self.config.init_commands.len(),
            "starting shell session"
        );
        for command in &self.config.init_commands {
            self.process.send(&format!("{command}\n"))?;
        }
        Ok(())
    }

    /// Route a chunk of shell output to the active redirection, or apply it
    /// to the buffer
    pub fn dispatch_output(&mut self, chunk: &str) -> Result<ChunkOutcome, SessionError> {
        if let Some(captured) = self.redirect.as_mut() {
            captured.push_str(chunk);
            if !self.prompt.matches_trailing_line(captured) {
                return Ok(ChunkOutcome::Captured);
            }

            let mut captured = self.redirect.take().unwrap_or_default();
            captured.truncate(captured.rfind('\n').unwrap_or(0));
            debug!(len = captured.len(), "redirection finished");
            return Ok(ChunkOutcome::RedirectFinished(captured));
        }

        let closed = self.terminal.apply_chunk(chunk)?;
        let password_prompt = self.password_prompt();
        if let Some(prompt) = &password_prompt {
            info!(%prompt, "password prompt");
        }
        Ok(ChunkOutcome::Applied {
            closed,
            password_prompt,
        })
    }

    /// Like [`Self::dispatch_output`], for raw bytes that may split UTF-8
    /// sequences between reads
    pub fn dispatch_bytes(&mut self, bytes: &[u8]) -> Result<ChunkOutcome, SessionError> {
        let text = self.terminal.decode(bytes);
        self.dispatch_output(&text)
    }

    /// The password prompt the content ends with, if any
    pub fn password_prompt(&self) -> Option<String> {
        let buffer = self.terminal.buffer();
        // Only the tail can hold the prompt; skip trailing blank lines
        let mut line = buffer.line_start(buffer.len());
        while line > 0 && buffer.slice(line, buffer.len()).trim().is_empty() {
            line = buffer.line_start(line - 1);
        }
        prompt::password_prompt(&buffer.slice(line, buffer.len())).map(str::to_string)
    }

    /// Reply to a password prompt. The secret never reaches the buffer.
    pub fn answer_password(&mut self, secret: &str) -> Result<(), SessionError> {
        debug!("answering password prompt");
        self.process.send(&format!("{secret}\n"))?;
        Ok(())
    }

    /// Submit a command: send it, replace the pending input with it in the
    /// buffer, and record it in the history ring
    pub fn push_input(&mut self, command: &str) -> Result<(), SessionError> {
        let line = format!("{command}\n");
        self.process.send(&line)?;
        let range = self.last_prompt_input_range();
        self.replace_range(range, &line)?;
        self.ring.push(command);
        debug!(%command, "pushed input");
        Ok(())
    }

    /// Send characters to the shell as they are
    pub fn send_chars(&mut self, chars: &str) -> Result<(), SessionError> {
        self.process.send(chars)?;
        Ok(())
    }

    /// Every prompt in the content, as character ranges
    pub fn prompt_ranges(&self) -> Vec<Range<usize>> {
        self.prompt.ranges(&self.terminal.content())
    }

    /// Input on the line holding `offset`: what follows the prompt, or the
    /// whole line when it has none
    pub fn input_on_line(&self, offset: usize) -> String {
        let buffer = self.terminal.buffer();
        let start = buffer.line_start(offset);
        let end = buffer.line_end(start);
        let input_start = self
            .prompt_ranges()
            .into_iter()
            .find(|p| p.start <= end && p.end >= start)
            .map_or(start, |p| p.end.max(start));
        buffer.slice(input_start, end)
    }

    /// Input typed after the last prompt, when that prompt is on the last
    /// line. Otherwise the empty range at the end of the content.
    pub fn last_prompt_input_range(&self) -> Range<usize> {
        let len = self.terminal.len();
        let last_line = self.terminal.buffer().line_start(len);
        match self.prompt_ranges().last() {
            Some(p) if p.start >= last_line => p.end.min(len)..len,
            _ => len..len,
        }
    }

    /// Text in [`Self::last_prompt_input_range`]
    pub fn current_input(&self) -> String {
        let range = self.last_prompt_input_range();
        self.terminal.slice(range.start, range.end)
    }

    /// Step back through history and show the entry as the pending input
    pub fn input_ring_previous(&mut self) -> Result<String, SessionError> {
        let entry = self.ring.previous().to_string();
        self.replace_input(&entry)?;
        Ok(entry)
    }

    /// Step forward through history and show the entry as the pending input
    pub fn input_ring_next(&mut self) -> Result<String, SessionError> {
        let entry = self.ring.next().to_string();
        self.replace_input(&entry)?;
        Ok(entry)
    }

    /// Replace the pending input after the last prompt
    pub fn replace_input(&mut self, text: &str) -> Result<(), SessionError> {
        let range = self.last_prompt_input_range();
        self.replace_range(range, text)
    }

    /// Overwrite at `at` without moving the cursor. Returns the index after
    /// the written text.
    pub fn write(&mut self, text: &str, at: usize) -> Result<usize, SessionError> {
        Ok(self.terminal.write(text, at)?)
    }

    /// Delete the inclusive character range
    pub fn delete(&mut self, start_index: usize, end_index: usize) -> Result<(), SessionError> {
        self.terminal.delete(start_index, end_index)?;
        Ok(())
    }

    /// Drop every line but the last
    pub fn clear(&mut self) -> Result<(), SessionError> {
        let buffer = self.terminal.buffer();
        let last_line = buffer.line_start(buffer.len());
        if last_line > 0 {
            self.terminal.delete(0, last_line - 1)?;
        }
        Ok(())
    }

    /// Send `command` and capture the output it produces, up to the next
    /// prompt, instead of applying it
    pub fn begin_redirect(&mut self, command: &str) -> Result<(), SessionError> {
        if self.redirect.is_some() {
            return Err(SessionError::RedirectInProgress);
        }
        self.redirect = Some(String::new());
        if let Err(e) = self.process.send(command) {
            self.redirect = None;
            return Err(e.into());
        }
        Ok(())
    }

    pub fn is_redirecting(&self) -> bool {
        self.redirect.is_some()
    }

    /// Ask the shell to complete `input`. The candidates arrive as a
    /// [`ChunkOutcome::RedirectFinished`], to be parsed with the request.
    pub fn request_completion(&mut self, input: &str) -> Result<CompletionRequest, SessionError> {
        let request = CompletionRequest::new(input);
        self.begin_redirect(&request.command())?;
        debug!(%input, "requested completion");
        Ok(request)
    }

    /// End of output: close every open span
    pub fn finish(&mut self) -> Vec<SgrSegment> {
        self.terminal.finish()
    }

    pub fn terminal(&self) -> &TerminalBuffer {
        &self.terminal
    }

    pub fn snapshot(&self) -> BufferSnapshot {
        self.terminal.snapshot()
    }

    pub fn input_ring(&self) -> &InputRing {
        &self.ring
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    pub fn process(&self) -> &P {
        &self.process
    }

    pub fn into_process(self) -> P {
        self.process
    }

    /// Put `text` in place of `range` and leave the cursor after it
    fn replace_range(&mut self, range: Range<usize>, text: &str) -> Result<(), SessionError> {
        if range.end > range.start {
            self.terminal.delete(range.start, range.end - 1)?;
        }
        self.terminal.write(text, range.start)?;
        self.terminal.move_to_end();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::WriterProcess;
    use pretty_assertions::assert_eq;

    type TestSession = ShellSession<WriterProcess<Vec<u8>>>;

    fn session() -> TestSession {
        ShellSession::new(ShellConfig::default(), WriterProcess::new(Vec::new())).unwrap()
    }

    fn sent(session: TestSession) -> String {
        String::from_utf8(session.into_process().into_inner()).unwrap()
    }

    #[test]
    fn test_start_sends_init_commands() {
        let config = ShellConfig::default()
            .with_init_commands(vec!["export PAGER=cat".to_string(), "cd /tmp".to_string()]);
        let mut session = ShellSession::new(config, WriterProcess::new(Vec::new())).unwrap();
        session.start().unwrap();
        assert_eq!(sent(session), "export PAGER=cat\ncd /tmp\n");
    }

    #[test]
    fn test_invalid_prompt_regex() {
        let config = ShellConfig::default().with_prompt_regex("[");
        let result = ShellSession::new(config, WriterProcess::new(Vec::new()));
        assert!(matches!(result, Err(SessionError::InvalidPrompt(_))));
    }

    #[test]
    fn test_dispatch_applies_output() {
        let mut session = session();
        let outcome = session.dispatch_output("\x1b[31mred\x1b[0m plain\r\n$ ").unwrap();
        assert_eq!(
            outcome,
            ChunkOutcome::Applied {
                closed: vec![SgrSegment {
                    code: 31,
                    start_index: 0,
                    end_index: 2
                }],
                password_prompt: None,
            }
        );
        assert_eq!(session.terminal().content(), "red plain\n$ ");
    }

    #[test]
    fn test_password_prompt_reported() {
        let mut session = session();
        let outcome = session
            .dispatch_output("$ sudo true\r\n[sudo] password for me: ")
            .unwrap();
        let ChunkOutcome::Applied {
            password_prompt, ..
        } = outcome
        else {
            panic!("expected applied chunk");
        };
        assert_eq!(password_prompt.as_deref(), Some("[sudo] password for me:"));

        session.answer_password("hunter2").unwrap();
        assert!(!session.terminal().content().contains("hunter2"));
        assert_eq!(sent(session), "hunter2\n");
    }

    #[test]
    fn test_push_input_echoes_and_records() {
        let mut session = session();
        session.dispatch_output("user@host:~$ ").unwrap();
        session.push_input("ls -la").unwrap();

        assert_eq!(session.terminal().content(), "user@host:~$ ls -la\n");
        assert_eq!(session.terminal().write_index(), session.terminal().len());
        assert_eq!(session.input_ring().entries(), ["ls -la"]);
        assert_eq!(sent(session), "ls -la\n");
    }

    #[test]
    fn test_prompt_ranges_and_input() {
        let mut session = session();
        session.dispatch_output("~ $ make\nok\n~ $ ").unwrap();
        assert_eq!(session.prompt_ranges(), vec![0..4, 12..16]);
        assert_eq!(session.input_on_line(2), "make");
        assert_eq!(session.input_on_line(9), "ok");
        assert_eq!(session.last_prompt_input_range(), 16..16);
    }

    #[test]
    fn test_input_range_without_prompt_on_last_line() {
        let mut session = session();
        session.dispatch_output("~ $ make\nbuilding").unwrap();
        assert_eq!(session.last_prompt_input_range(), 17..17);
        assert_eq!(session.current_input(), "");
    }

    #[test]
    fn test_input_ring_replaces_pending_input() {
        let mut session = session();
        session.dispatch_output("$ ").unwrap();
        session.push_input("echo one").unwrap();
        session.dispatch_output("one\r\n$ ").unwrap();
        session.push_input("echo two").unwrap();
        session.dispatch_output("two\r\n$ ").unwrap();

        assert_eq!(session.input_ring_previous().unwrap(), "echo two");
        assert_eq!(session.current_input(), "echo two");
        assert_eq!(session.input_ring_previous().unwrap(), "echo one");
        assert_eq!(session.current_input(), "echo one");
        assert_eq!(session.input_ring_next().unwrap(), "echo two");
        assert_eq!(
            session.terminal().content(),
            "$ echo one\none\n$ echo two\ntwo\n$ echo two"
        );
    }

    #[test]
    fn test_clear_keeps_last_line() {
        let mut session = session();
        session.dispatch_output("one\ntwo\n$ ").unwrap();
        session.clear().unwrap();
        assert_eq!(session.terminal().content(), "$ ");
        assert_eq!(session.terminal().write_index(), 2);
    }

    #[test]
    fn test_completion_redirect() {
        let mut session = session();
        session.dispatch_output("$ ").unwrap();
        let request = session.request_completion("ca").unwrap();
        assert!(matches!(
            session.request_completion("ls"),
            Err(SessionError::RedirectInProgress)
        ));

        assert_eq!(
            session.dispatch_output("ca cal cat\r\n").unwrap(),
            ChunkOutcome::Captured
        );
        let outcome = session.dispatch_output("cal cat\r\n$ ").unwrap();
        let ChunkOutcome::RedirectFinished(output) = outcome else {
            panic!("expected finished redirection");
        };
        assert_eq!(
            request.parse_candidates(&output),
            vec!["cal", "cat", "cal", "cat"]
        );
        assert_eq!(session.terminal().content(), "$ ");
        assert!(!session.is_redirecting());
    }

    #[test]
    fn test_dispatch_bytes_split_utf8() {
        let mut session = session();
        let bytes = "héllo".as_bytes();
        session.dispatch_bytes(&bytes[..2]).unwrap();
        session.dispatch_bytes(&bytes[2..]).unwrap();
        assert_eq!(session.terminal().content(), "héllo");
    }

    #[test]
    fn test_split_utf8_carries_into_redirect() {
        let mut session = session();
        session.dispatch_output("$ ").unwrap();
        let bytes = "café".as_bytes();
        session.dispatch_bytes(&bytes[..4]).unwrap();
        assert_eq!(session.terminal().content(), "$ caf");

        session.begin_redirect("ls\n").unwrap();
        session.dispatch_bytes(&bytes[4..]).unwrap();
        let outcome = session.dispatch_bytes(b" files\r\n$ ").unwrap();
        assert_eq!(outcome, ChunkOutcome::RedirectFinished("é files\r".to_string()));
        assert_eq!(session.terminal().content(), "$ caf");
    }
}
