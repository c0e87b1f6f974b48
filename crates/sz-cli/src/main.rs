//! sz CLI - compress files and directories into Snappy streams, and
//! restore them.

mod cli;
mod commands;
mod error;
mod output;
mod progress;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    if let Some(shell) = cli.completions {
        commands::completion::execute(shell);
        return Ok(());
    }

    let formatter = output::create_formatter(cli.json, cli.quiet);

    // Per-input failures are reported by the formatter; the batch always
    // exits successfully.
    commands::transcode::execute(&cli.paths, cli.quiet || cli.json, &*formatter);
    Ok(())
}
