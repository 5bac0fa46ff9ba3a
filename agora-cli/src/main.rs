//! Agora command-line interface.
//!
//! Entry point for the agora-cli binary. Parses command-line arguments and
//! delegates to the appropriate command handler.

use agora_cli::run_cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    run_cli().await
}
