//! vimeops entry point.

mod app;
mod cli;
mod config;
mod prompt;
mod remote;
mod report;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use vimeops_batch::Direction;

use crate::cli::{Cli, Command};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout is reserved for operator output.
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "starting vimeops");

    let mut config = config::Config::load(cli.config.as_deref())?;
    config.apply_env(|name| std::env::var(name).ok());

    match cli.command {
        Command::Rename(args) => {
            args.apply(&mut config);
            app::rename(&config)
        }
        Command::Upload(args) => {
            args.apply(&mut config);
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(app::transfer(
                &config,
                Direction::Outbound,
                None,
                cli.suppress_confirmation,
            ))
        }
        Command::Download(args) => {
            args.apply(&mut config);
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(app::transfer(
                &config,
                Direction::Inbound,
                args.video_uri,
                cli.suppress_confirmation,
            ))
        }
    }
}
