//! Write side of the shell process
//!
//! The PTY itself lives with the host; the session only needs somewhere to
//! send typed input.

use std::io::{self, Write};

/// Bytes destined for the shell's stdin
pub trait ProcessInput {
    fn send(&mut self, data: &str) -> io::Result<()>;
}

/// Adapts any writer, e.g. a PTY master
#[derive(Debug)]
pub struct WriterProcess<W> {
    writer: W,
}

impl<W: Write> WriterProcess<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ProcessInput for WriterProcess<W> {
    fn send(&mut self, data: &str) -> io::Result<()> {
        self.writer.write_all(data.as_bytes())?;
        self.writer.flush()
    }
}

/// Discards input, for replaying recorded output
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProcess;

impl ProcessInput for NullProcess {
    fn send(&mut self, _data: &str) -> io::Result<()> {
        Ok(())
    }
}
