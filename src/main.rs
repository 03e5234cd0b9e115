use anyhow::Context as _;
use clap::{CommandFactory, Parser};
use std::io::{self, IsTerminal};
use tracing::info;

use confradar::cli::{self, Cli, Commands, Context};
use confradar::config::resolve_data_dir;
use confradar::logging;

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let command = match cli.command {
        Some(command) => command,
        None if io::stdin().is_terminal() => Commands::Interactive,
        None => {
            Cli::command().print_help()?;
            return Ok(());
        }
    };

    let data_dir = resolve_data_dir(cli.data_dir).context("Failed to resolve data directory")?;
    let interactive = matches!(command, Commands::Interactive);
    let guard = logging::init_logging(&data_dir.join("logs"), !interactive, cli.verbose);
    info!("Using data directory {}", data_dir.display());

    let ctx = Context::load(data_dir);
    let code = cli::run(command, &ctx, &mut io::stdout().lock())?;

    // process::exit skips destructors; flush the log writer first
    drop(guard);
    std::process::exit(code);
}
