pub mod fixtures;
pub mod process;
pub mod terminal;

pub use fixtures::TestFixtures;
pub use process::RecordingProcess;
pub use terminal::{apply_chunks, chunks_of, strip_ansi, TerminalComparator};

use std::sync::Once;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new("comint=debug,comint_terminal=debug,comint_shell=debug")
            }))
            .with_test_writer()
            .init();
    });
}
