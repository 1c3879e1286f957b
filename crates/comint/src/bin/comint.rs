#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let result = comint::cli::run().await;

    use std::io::{self, Write};
    let _ = io::stderr().flush();
    let _ = io::stdout().flush();

    result
}
