use anyhow::Result;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct TestFixtures {
    temp_dir: TempDir,
}

impl TestFixtures {
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp_dir: TempDir::new()?,
        })
    }

    /// Write a raw output transcript, e.g. for the replay command
    pub fn create_transcript(&self, name: &str, content: &[u8]) -> Result<PathBuf> {
        let path = self.temp_dir.path().join(name);
        std::fs::write(&path, content)?;
        Ok(path)
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }
}

// Recorded shell output
pub mod data {
    pub const ANSI_COLORS: &str = "\x1b[31mRed\x1b[0m \x1b[32mGreen\x1b[0m \x1b[34mBlue\x1b[0m\n";

    pub const UNICODE_TEST: &str = "🦀 Rust 日本語 العربية\n";

    /// `pv` progress updates, one chunk per redraw
    pub const PV_CHUNKS: [&str; 5] = [
        "  720MiB 0:00:01 [ 720MiB/s] [=======>                          ] 25% ETA 0:00:02\r",
        " 1.43GiB 0:00:02 [ 739MiB/s] [================>                 ] 51% ETA 0:00:01\r",
        " 2.12GiB 0:00:03 [ 714MiB/s] [========================>         ] 75% ETA 0:00:00\r",
        " 2.73GiB 0:00:04 [ 624MiB/s] [===============================>  ] 97% ETA 0:00:00\r",
        " 2.79GiB 0:00:04 [ 699MiB/s] [================================>] 100%            \r\r\n",
    ];

    /// Content after each of [`PV_CHUNKS`]
    pub const PV_CONTENT: [&str; 5] = [
        "  720MiB 0:00:01 [ 720MiB/s] [=======>                          ] 25% ETA 0:00:02",
        " 1.43GiB 0:00:02 [ 739MiB/s] [================>                 ] 51% ETA 0:00:01",
        " 2.12GiB 0:00:03 [ 714MiB/s] [========================>         ] 75% ETA 0:00:00",
        " 2.73GiB 0:00:04 [ 624MiB/s] [===============================>  ] 97% ETA 0:00:00",
        " 2.79GiB 0:00:04 [ 699MiB/s] [================================>] 100%            \n",
    ];

    /// `npm install` spinner lines, each erased with `ESC[K` and a return
    pub const NPM_CHUNKS: [&str; 4] = [
        "[\x1b[100;90m..................\x1b[0m] \\ reify: \x1b[43;40mtiming\x1b[0m \x1b[35marborist:longer-name\x1b[0m Completed in 0ms\x1b[0m\x1b[K\r",
        "[\x1b[107;97m#########\x1b[0m\x1b[100;90m.........\x1b[0m] \\ idealTree: \x1b[43;40mtiming\x1b[0m \x1b[35midealTree\x1b[0m Completed in 80ms\x1b[0m\x1b[K\r",
        "\r\x1b[K\x1b[?25h",
        "\r\nup to date.",
    ];

    /// Content after each of [`NPM_CHUNKS`]
    pub const NPM_CONTENT: [&str; 4] = [
        "[..................] \\ reify: timing arborist:longer-name Completed in 0ms",
        "[#########.........] \\ idealTree: timing idealTree Completed in 80ms",
        "",
        "\nup to date.",
    ];

    /// A return inside a chunk, then text that continues the line
    pub const SAFEWORD_CHUNKS: [&str; 2] = ["password\rsafe", "ty first!\r\n"];

    pub const SAFEWORD_CONTENT: [&str; 2] = ["safeword", "safety first!\n"];

    pub fn generate_text_lines(count: usize) -> String {
        (0..count)
            .map(|i| format!("Line {i}: The quick brown fox jumps over the lazy dog\r\n"))
            .collect()
    }
}
