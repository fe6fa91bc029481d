//! Stepwise CLI - Command-line interface for stepwise migrations.

use clap::Parser;

use stepwise_cli::cli::{Cli, Command};
use stepwise_cli::commands;
use stepwise_cli::error::CliResult;
use stepwise_cli::logging;
use stepwise_cli::output;

#[tokio::main]
async fn main() {
    logging::init();

    if let Err(e) = run().await {
        output::newline();
        output::error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Migrate(args) => commands::migrate::run(args).await,
        Command::Info(args) => commands::info::run(args).await,
        Command::Version => commands::version::run().await,
    }
}
