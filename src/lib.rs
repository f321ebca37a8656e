pub mod calendar;
pub mod cli;
pub mod commands;
pub mod config;
pub mod state;

use anyhow::Result;
use env_logger::Env;
use log::*;

pub fn run(cli: cli::Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(dir) = cli.data_dir {
        config.storage.data_dir = Some(dir);
    }

    let data_dir = config.data_dir()?;
    info!("Using data directory {}", data_dir.display());
    let store = calendar::open_store(&data_dir)?;

    let mut ctx = commands::CommandContext::new(config, store);
    commands::execute(&mut ctx, cli.command)
}

pub fn init_logger() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

// Re-export commonly used types
pub use calendar::{Event, EventDraft, EventId, EventStore};
pub use config::Config;
