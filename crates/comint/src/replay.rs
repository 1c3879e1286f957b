//! Replaying recorded output through a session

use anyhow::{Context, Result};
use comint_shell::{ChunkOutcome, NullProcess, SessionHandle, ShellConfig, ShellSession};
use comint_terminal::BufferSnapshot;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct ReplayOptions {
    /// Bytes per chunk, as if read from the PTY this many at a time
    pub chunk_size: usize,

    pub config: ShellConfig,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            chunk_size: 4096,
            config: ShellConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayResult {
    /// Final state, after end of stream
    pub snapshot: BufferSnapshot,

    /// Password prompts seen at the end of a chunk, in order
    pub password_prompts: Vec<String>,

    pub chunks: usize,
}

/// Feed `raw` through a fresh session in fixed-size chunks
pub async fn replay(raw: &[u8], options: ReplayOptions) -> Result<ReplayResult> {
    let session = ShellSession::new(options.config, NullProcess)
        .context("Failed to create shell session")?;
    let (handle, task) = SessionHandle::spawn(session);

    let mut password_prompts = Vec::new();
    let mut chunks = 0;
    for chunk in raw.chunks(options.chunk_size.max(1)) {
        chunks += 1;
        match handle.output_bytes(chunk.to_vec()).await? {
            ChunkOutcome::Applied {
                password_prompt: Some(prompt),
                ..
            } => {
                warn!(%prompt, chunk = chunks, "transcript stops at a password prompt");
                password_prompts.push(prompt);
            }
            ChunkOutcome::Applied { closed, .. } => {
                debug!(chunk = chunks, closed = closed.len(), "applied chunk");
            }
            outcome => debug!(?outcome, "chunk not applied"),
        }
    }

    let closed = handle.finish().await?;
    let snapshot = handle.snapshot().await?;
    drop(handle);
    task.await.context("Session task failed")?;

    info!(
        chunks,
        chars = snapshot.content.chars().count(),
        spans = snapshot.sgr_segments.len(),
        closed_at_end = closed.len(),
        "replay finished"
    );

    Ok(ReplayResult {
        snapshot,
        password_prompts,
        chunks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use comint_terminal::{BufferConfig, SgrSegment};
    use pretty_assertions::assert_eq;

    fn options(chunk_size: usize) -> ReplayOptions {
        let buffer = BufferConfig::default().with_carry_partial_escapes(true);
        ReplayOptions {
            chunk_size,
            config: ShellConfig::default().with_buffer(buffer),
        }
    }

    #[tokio::test]
    async fn test_replay_chunk_sizes_agree() {
        let raw = "\x1b[32mok\x1b[0m\r\n50%\r100%\r\nhéllo wörld\r\n$ ".as_bytes();
        let whole = replay(raw, options(4096)).await.unwrap();
        assert_eq!(whole.chunks, 1);
        assert_eq!(whole.snapshot.content, "ok\n100%\nhéllo wörld\n$ ");

        for size in [1, 3, 5] {
            let chunked = replay(raw, options(size)).await.unwrap();
            assert_eq!(chunked.snapshot, whole.snapshot, "size {size}");
        }
    }

    #[tokio::test]
    async fn test_replay_closes_open_spans() {
        let result = replay(b"\x1b[1;31mbold red", options(4096)).await.unwrap();
        assert_eq!(
            result.snapshot.sgr_segments,
            vec![
                SgrSegment {
                    code: 1,
                    start_index: 0,
                    end_index: 7
                },
                SgrSegment {
                    code: 31,
                    start_index: 0,
                    end_index: 7
                },
            ]
        );
        assert!(result.snapshot.open_segments.is_empty());
    }

    #[tokio::test]
    async fn test_replay_reports_password_prompts() {
        let raw = b"$ ssh host\r\nme@host's password: ";
        let result = replay(raw, options(4096)).await.unwrap();
        assert_eq!(result.password_prompts, vec!["me@host's password:"]);
    }
}
