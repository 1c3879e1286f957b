//! Argument parsing and logging setup

use crate::render::{write_ansi, write_plain, write_spans};
use crate::replay::{replay, ReplayOptions};
use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use comint_shell::{ShellConfig, DEFAULT_PROMPT_REGEX};
use comint_terminal::BufferConfig;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// How the final transcript is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Content only
    Plain,
    /// Content with its styles, for a terminal
    Ansi,
    /// One line per style span
    Spans,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "comint - interpret shell output like an emacs comint buffer")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log level
    #[arg(long, value_enum, default_value = "warn", global = true)]
    log_level: LogLevel,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Feed a recorded transcript through a session and print the result
    Replay(ReplayArgs),
}

#[derive(ClapArgs, Debug)]
struct ReplayArgs {
    /// Raw shell output, e.g. from `script`
    file: PathBuf,

    /// Bytes per output chunk
    #[arg(long, default_value = "4096")]
    chunk_size: usize,

    /// Output format
    #[arg(long, value_enum, default_value = "plain")]
    format: OutputFormat,

    /// Carry escape sequences cut off at a chunk boundary
    #[arg(long)]
    carry_partial_escapes: bool,

    /// Prompt pattern, matched per line
    #[arg(long, default_value = DEFAULT_PROMPT_REGEX)]
    prompt_regex: String,
}

impl ReplayArgs {
    fn options(&self) -> ReplayOptions {
        let buffer = BufferConfig::default().with_carry_partial_escapes(self.carry_partial_escapes);
        ReplayOptions {
            chunk_size: self.chunk_size,
            config: ShellConfig::default()
                .with_prompt_regex(self.prompt_regex.clone())
                .with_buffer(buffer),
        }
    }
}

pub async fn run() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = match args.log_level {
        LogLevel::Trace => tracing::Level::TRACE,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Error => tracing::Level::ERROR,
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(io::stderr)
        .init();

    match args.command {
        Command::Replay(replay_args) => run_replay(replay_args).await,
    }
}

async fn run_replay(args: ReplayArgs) -> Result<()> {
    if args.chunk_size == 0 {
        anyhow::bail!("--chunk-size must be at least 1");
    }

    let raw = tokio::fs::read(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    info!(file = %args.file.display(), bytes = raw.len(), "replaying transcript");

    let result = replay(&raw, args.options()).await?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.format {
        OutputFormat::Plain => write_plain(&mut out, &result.snapshot)?,
        OutputFormat::Ansi => write_ansi(&mut out, &result.snapshot)?,
        OutputFormat::Spans => write_spans(&mut out, &result.snapshot)?,
    }
    out.flush()?;
    Ok(())
}
