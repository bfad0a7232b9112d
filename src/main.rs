use clap::{CommandFactory, Parser};
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::io;

use carrier_dispatch::DispatchError;
use carrier_dispatch::config::Config;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn setup_logging(config: &Config) -> Result<()> {
    let log_level = config.log_level;
    let log_dir = config.log_dir();
    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("carrier-dispatch.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    // RUST_LOG env var takes precedence, otherwise use config log_level
    let mut builder = env_logger::Builder::new();

    if std::env::var("RUST_LOG").is_ok() {
        builder.parse_default_env();
    } else {
        builder.filter_level(log_level.to_level_filter());
    }

    builder.target(env_logger::Target::Pipe(target)).init();

    info!("Logging initialized, writing to: {}", log_file.display());
    info!(
        "Log level: {} (from {})",
        log_level.as_filter(),
        if std::env::var("RUST_LOG").is_ok() { "RUST_LOG env" } else { "config" }
    );
    Ok(())
}

fn run(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Carriers { action } => commands::carriers::run(action, &config),
        Commands::Run {
            carrier,
            action,
            data,
            fields,
            field,
            timeout,
        } => commands::run::run(&carrier, &action, &data, fields.as_deref(), &field, timeout, &config),
        Commands::Track {
            carrier,
            codes,
            token,
            timeout,
        } => commands::run::track(&carrier, &codes, token.as_deref(), timeout, &config),
        Commands::Config { action } => commands::config::run(action, &config),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "carrier-dispatch", &mut io::stdout());
            Ok(())
        }
    }
}

fn main() -> Result<()> {
    // Parse CLI arguments first
    let cli = Cli::parse();

    // Load configuration (before logging, so log messages in Config::load are silent)
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    setup_logging(&config).context("Failed to setup logging")?;

    info!("Starting carrier-dispatch with config from: {:?}", cli.config);

    if let Err(e) = run(cli, config) {
        // Dispatch failures are expected outcomes; report them with a stable exit code
        if let Some(dispatch_err) = e.downcast_ref::<DispatchError>() {
            log::warn!("Dispatch failed at {} stage: {}", dispatch_err.stage(), e);
            eprintln!("{} {}", "✗".red(), e);
            let mut source = std::error::Error::source(dispatch_err);
            while let Some(cause) = source {
                eprintln!("  {} {}", "caused by:".dimmed(), cause);
                source = cause.source();
            }
            std::process::exit(dispatch_err.exit_code());
        }
        return Err(e).context("Command failed");
    }

    Ok(())
}
