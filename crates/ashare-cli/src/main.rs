mod cli;
mod commands;
mod error;
mod output;

use ashare_core::Outcome;
use clap::Parser;
use serde_json::Value;

use crate::cli::Cli;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        // Invokers parse one JSON line per run; a pre-flight failure
        // still owes them that line before the non-zero exit.
        let envelope: Outcome<Value> = Outcome::fail(error.to_string());
        let _ = output::render(&envelope);
        eprintln!("error: {error}");
        std::process::exit(error.exit_code());
    }
}

async fn run() -> Result<(), CliError> {
    let cli = Cli::parse();
    let envelope = commands::run(cli).await?;
    output::render(&envelope)
}
