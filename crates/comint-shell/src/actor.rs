//! Serialized access to a session from async hosts
//!
//! One task owns the [`ShellSession`]; output chunks and local edits reach
//! it as commands over a channel, so they are applied strictly in the order
//! they were sent.

use crate::{
    completion::CompletionRequest,
    process::ProcessInput,
    session::{ChunkOutcome, ShellSession},
    SessionError,
};
use comint_terminal::{BufferSnapshot, SgrSegment};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

type Reply<T> = oneshot::Sender<Result<T, SessionError>>;

/// Requests handled by the session task
enum Command {
    Output(String, Reply<ChunkOutcome>),
    OutputBytes(Vec<u8>, Reply<ChunkOutcome>),
    PushInput(String, Reply<()>),
    SendChars(String, Reply<()>),
    AnswerPassword(String, Reply<()>),
    ReplaceInput(String, Reply<()>),
    Write(String, usize, Reply<usize>),
    Delete(usize, usize, Reply<()>),
    Clear(Reply<()>),
    RingPrevious(Reply<String>),
    RingNext(Reply<String>),
    Complete(String, Reply<Vec<String>>),
    Snapshot(Reply<BufferSnapshot>),
    Finish(Reply<Vec<SgrSegment>>),
}

impl Command {
    /// For logging; payloads may hold secrets
    fn name(&self) -> &'static str {
        match self {
            Command::Output(..) => "output",
            Command::OutputBytes(..) => "output_bytes",
            Command::PushInput(..) => "push_input",
            Command::SendChars(..) => "send_chars",
            Command::AnswerPassword(..) => "answer_password",
            Command::ReplaceInput(..) => "replace_input",
            Command::Write(..) => "write",
            Command::Delete(..) => "delete",
            Command::Clear(_) => "clear",
            Command::RingPrevious(_) => "ring_previous",
            Command::RingNext(_) => "ring_next",
            Command::Complete(..) => "complete",
            Command::Snapshot(_) => "snapshot",
            Command::Finish(_) => "finish",
        }
    }
}

/// Cloneable handle to a session running on its own task
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<Command>,
}

impl SessionHandle {
    /// Move `session` onto a new task. The task ends, handing the session
    /// back, once every handle is dropped.
    pub fn spawn<P>(session: ShellSession<P>) -> (Self, JoinHandle<ShellSession<P>>)
    where
        P: ProcessInput + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(32);
        let task = tokio::spawn(run(session, rx));
        (Self { tx }, task)
    }

    /// Apply a chunk of shell output
    pub async fn output(&self, chunk: impl Into<String>) -> Result<ChunkOutcome, SessionError> {
        let chunk = chunk.into();
        self.request(|reply| Command::Output(chunk, reply)).await
    }

    /// Apply raw output bytes
    pub async fn output_bytes(&self, bytes: Vec<u8>) -> Result<ChunkOutcome, SessionError> {
        self.request(|reply| Command::OutputBytes(bytes, reply)).await
    }

    pub async fn push_input(&self, command: impl Into<String>) -> Result<(), SessionError> {
        let command = command.into();
        self.request(|reply| Command::PushInput(command, reply)).await
    }

    /// Send characters to the shell as they are
    pub async fn send_chars(&self, chars: impl Into<String>) -> Result<(), SessionError> {
        let chars = chars.into();
        self.request(|reply| Command::SendChars(chars, reply)).await
    }

    pub async fn answer_password(&self, secret: impl Into<String>) -> Result<(), SessionError> {
        let secret = secret.into();
        self.request(|reply| Command::AnswerPassword(secret, reply)).await
    }

    /// Replace the pending input after the last prompt
    pub async fn replace_input(&self, text: impl Into<String>) -> Result<(), SessionError> {
        let text = text.into();
        self.request(|reply| Command::ReplaceInput(text, reply)).await
    }

    /// Local overwrite at `at`; returns the index after the written text
    pub async fn write(&self, text: impl Into<String>, at: usize) -> Result<usize, SessionError> {
        let text = text.into();
        self.request(|reply| Command::Write(text, at, reply)).await
    }

    /// Local delete of the inclusive range
    pub async fn delete(&self, start_index: usize, end_index: usize) -> Result<(), SessionError> {
        self.request(|reply| Command::Delete(start_index, end_index, reply))
            .await
    }

    /// Drop every line but the last
    pub async fn clear(&self) -> Result<(), SessionError> {
        self.request(Command::Clear).await
    }

    pub async fn ring_previous(&self) -> Result<String, SessionError> {
        self.request(Command::RingPrevious).await
    }

    pub async fn ring_next(&self) -> Result<String, SessionError> {
        self.request(Command::RingNext).await
    }

    /// Completion candidates for `input`. Resolves once the shell's answer
    /// has been fed in through [`Self::output`].
    pub async fn complete(&self, input: impl Into<String>) -> Result<Vec<String>, SessionError> {
        let input = input.into();
        self.request(|reply| Command::Complete(input, reply)).await
    }

    pub async fn snapshot(&self) -> Result<BufferSnapshot, SessionError> {
        self.request(Command::Snapshot).await
    }

    /// End of output: close every open span
    pub async fn finish(&self) -> Result<Vec<SgrSegment>, SessionError> {
        self.request(Command::Finish).await
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(Reply<T>) -> Command,
    ) -> Result<T, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(command(reply))
            .await
            .map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)?
    }
}

async fn run<P: ProcessInput>(
    mut session: ShellSession<P>,
    mut rx: mpsc::Receiver<Command>,
) -> ShellSession<P> {
    let mut completion: Option<(CompletionRequest, Reply<Vec<String>>)> = None;

    while let Some(command) = rx.recv().await {
        trace!(command = command.name(), "session command");
        match command {
            Command::Output(chunk, reply) => {
                let outcome = session.dispatch_output(&chunk);
                resolve_completion(&mut completion, &outcome);
                let _ = reply.send(outcome);
            }
            Command::OutputBytes(bytes, reply) => {
                let outcome = session.dispatch_bytes(&bytes);
                resolve_completion(&mut completion, &outcome);
                let _ = reply.send(outcome);
            }
            Command::PushInput(line, reply) => {
                let _ = reply.send(session.push_input(&line));
            }
            Command::SendChars(chars, reply) => {
                let _ = reply.send(session.send_chars(&chars));
            }
            Command::AnswerPassword(secret, reply) => {
                let _ = reply.send(session.answer_password(&secret));
            }
            Command::ReplaceInput(text, reply) => {
                let _ = reply.send(session.replace_input(&text));
            }
            Command::Write(text, at, reply) => {
                let _ = reply.send(session.write(&text, at));
            }
            Command::Delete(start, end, reply) => {
                let _ = reply.send(session.delete(start, end));
            }
            Command::Clear(reply) => {
                let _ = reply.send(session.clear());
            }
            Command::RingPrevious(reply) => {
                let _ = reply.send(session.input_ring_previous());
            }
            Command::RingNext(reply) => {
                let _ = reply.send(session.input_ring_next());
            }
            Command::Complete(input, reply) => match session.request_completion(&input) {
                Ok(request) => completion = Some((request, reply)),
                Err(e) => {
                    let _ = reply.send(Err(e));
                }
            },
            Command::Snapshot(reply) => {
                let _ = reply.send(Ok(session.snapshot()));
            }
            Command::Finish(reply) => {
                let _ = reply.send(Ok(session.finish()));
            }
        }
    }

    debug!("all session handles dropped");
    session
}

fn resolve_completion(
    completion: &mut Option<(CompletionRequest, Reply<Vec<String>>)>,
    outcome: &Result<ChunkOutcome, SessionError>,
) {
    if let Ok(ChunkOutcome::RedirectFinished(output)) = outcome {
        if let Some((request, reply)) = completion.take() {
            let _ = reply.send(Ok(request.parse_candidates(output)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::ShellConfig, process::WriterProcess};
    use pretty_assertions::assert_eq;

    fn spawn() -> (
        SessionHandle,
        JoinHandle<ShellSession<WriterProcess<Vec<u8>>>>,
    ) {
        let session =
            ShellSession::new(ShellConfig::default(), WriterProcess::new(Vec::new())).unwrap();
        SessionHandle::spawn(session)
    }

    #[tokio::test]
    async fn test_commands_apply_in_order() {
        let (handle, task) = spawn();
        handle.output("$ ").await.unwrap();
        handle.push_input("echo hi").await.unwrap();
        handle.output("hi\r\n$ ").await.unwrap();

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.content, "$ echo hi\nhi\n$ ");

        assert_eq!(handle.ring_previous().await.unwrap(), "echo hi");
        drop(handle);

        let session = task.await.unwrap();
        assert_eq!(session.terminal().content(), "$ echo hi\nhi\n$ echo hi");
        let sent = session.into_process().into_inner();
        assert_eq!(sent, b"echo hi\n");
    }

    #[tokio::test]
    async fn test_completion_resolves_on_prompt() {
        let (handle, _task) = spawn();
        handle.output("$ ").await.unwrap();

        let feed = async {
            assert_eq!(
                handle.output("gi git gitk\r\n").await.unwrap(),
                ChunkOutcome::Captured
            );
            handle.output("git gitk\r\n$ ").await.unwrap();
        };
        let (candidates, ()) = tokio::join!(handle.complete("gi"), feed);
        assert_eq!(candidates.unwrap(), vec!["git", "gitk", "git", "gitk"]);
        assert_eq!(handle.snapshot().await.unwrap().content, "$ ");
    }

    #[tokio::test]
    async fn test_local_edits_interleave_with_output() {
        let (handle, task) = spawn();
        handle.output("build log\r\n$ ").await.unwrap();
        handle.replace_input("make al").await.unwrap();
        handle.delete(0, 9).await.unwrap();
        assert_eq!(handle.snapshot().await.unwrap().content, "$ make al");

        handle.replace_input("make all").await.unwrap();
        handle.send_chars("make all\n").await.unwrap();
        handle.output("\r\ndone\r\n$ ").await.unwrap();
        let next = handle.write("X", 0).await.unwrap();
        assert_eq!(next, 1);
        handle.clear().await.unwrap();
        assert_eq!(handle.snapshot().await.unwrap().content, "$ ");

        assert!(matches!(
            handle.delete(5, 2).await,
            Err(SessionError::Terminal(_))
        ));
        drop(handle);
        let session = task.await.unwrap();
        assert_eq!(session.into_process().into_inner(), b"make all\n");
    }

    #[tokio::test]
    async fn test_finish_closes_spans() {
        let (handle, _task) = spawn();
        handle.output("\x1b[32mok").await.unwrap();
        let closed = handle.finish().await.unwrap();
        assert_eq!(
            closed,
            vec![SgrSegment {
                code: 32,
                start_index: 0,
                end_index: 1
            }]
        );
    }

    #[tokio::test]
    async fn test_closed_session() {
        let (handle, task) = spawn();
        task.abort();
        let _ = task.await;
        assert!(matches!(
            handle.snapshot().await,
            Err(SessionError::Closed)
        ));
    }
}
