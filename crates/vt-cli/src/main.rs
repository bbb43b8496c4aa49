use std::io::Write;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use vt_cli::commands::{balances, calendar, count, request, set_balance, suggest};
use vt_cli::{Cli, Commands, Config};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        // No subcommand, show help
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let mut stdout = std::io::stdout().lock();
    match command {
        Commands::Balances(args) => balances::run(&mut stdout, args, &config)?,
        Commands::SetBalance(args) => set_balance::run(&mut stdout, args, &config)?,
        Commands::Count(args) => count::run(&mut stdout, args, &config)?,
        Commands::Suggest(args) => suggest::run(&mut stdout, args, &config)?,
        Commands::Request(action) => request::run(&mut stdout, action, &config)?,
        Commands::Calendar(action) => calendar::run(&mut stdout, action, &config)?,
    }
    stdout.flush()?;

    Ok(())
}
