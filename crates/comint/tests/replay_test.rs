//! Replaying recorded transcripts end to end

use comint::render::{write_plain, write_spans};
use comint::replay::{replay, ReplayOptions};
use comint_shell::ShellConfig;
use comint_terminal::BufferConfig;
use comint_test_utils::{fixtures::data, init_test_logging, TerminalComparator, TestFixtures};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_replay_transcript_file() {
    init_test_logging();
    let fixtures = TestFixtures::new().unwrap();

    let mut transcript = String::from("$ pv big.iso > /dev/null\r\n");
    for chunk in data::PV_CHUNKS {
        transcript.push_str(chunk);
    }
    transcript.push_str("$ ");
    let path = fixtures
        .create_transcript("pv.log", transcript.as_bytes())
        .unwrap();

    let raw = tokio::fs::read(&path).await.unwrap();
    let result = replay(&raw, ReplayOptions::default()).await.unwrap();

    let mut out = Vec::new();
    write_plain(&mut out, &result.snapshot).unwrap();
    let expected = format!("$ pv big.iso > /dev/null\n{}$ ", data::PV_CONTENT[4]);
    assert_eq!(String::from_utf8(out).unwrap(), expected);
}

#[tokio::test]
async fn test_replay_npm_spans() {
    init_test_logging();
    let raw: String = data::NPM_CHUNKS.concat();
    let result = replay(raw.as_bytes(), ReplayOptions::default()).await.unwrap();

    assert_eq!(result.snapshot.content, "\nup to date.");
    let mut out = Vec::new();
    write_spans(&mut out, &result.snapshot).unwrap();
    assert!(out.is_empty());
}

#[tokio::test]
async fn test_replay_colors_match_stripped_output() {
    init_test_logging();
    let raw = format!("{}{}", data::ANSI_COLORS, data::UNICODE_TEST);
    let result = replay(
        raw.as_bytes(),
        ReplayOptions {
            chunk_size: 3,
            config: ShellConfig::default()
                .with_buffer(BufferConfig::default().with_carry_partial_escapes(true)),
        },
    )
    .await
    .unwrap();

    TerminalComparator::new()
        .compare_output("Red Green Blue\n🦀 Rust 日本語 العربية\n", &result.snapshot.content)
        .unwrap();
}
