//! ## herald
//! **Status banner reporter**
//!
//! Live sessions driven from stdin, deterministic scenario replay and seeded
//! fuzzing of the reporter state machine.

use clap::Parser;

mod commands;
mod terminal;

use commands::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    commands::run_command(cli).await
}
