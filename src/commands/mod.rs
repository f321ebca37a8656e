use crate::calendar::{EventStore, parse_canonical_date};
use crate::cli::Commands;
use crate::config::Config;
use crate::state::FileStorage;
use anyhow::{Result, anyhow};
use chrono::{Local, NaiveDate};

pub mod calendar;
pub mod events;
pub mod transfer;

/// Everything a command needs while it runs
pub struct CommandContext {
    pub config: Config,
    pub store: EventStore<FileStorage>,
    pub today: NaiveDate,
}

impl CommandContext {
    pub fn new(config: Config, store: EventStore<FileStorage>) -> Self {
        Self {
            config,
            store,
            today: Local::now().date_naive(),
        }
    }

    /// Parse an optional YYYY-MM-DD argument, falling back to today
    pub fn date_or_today(&self, date: Option<&str>) -> Result<NaiveDate> {
        match date {
            Some(raw) => parse_date_arg(raw),
            None => Ok(self.today),
        }
    }
}

pub fn parse_date_arg(raw: &str) -> Result<NaiveDate> {
    parse_canonical_date(raw)
        .ok_or_else(|| anyhow!("Invalid date '{}'. Expected format: YYYY-MM-DD", raw))
}

// Command executor trait for handling commands
pub trait CommandExecutor {
    fn can_handle(&self, command: &Commands) -> bool;
    fn execute(&self, ctx: &mut CommandContext, command: Commands) -> Result<()>;
}

pub fn execute(ctx: &mut CommandContext, command: Commands) -> Result<()> {
    let executors: [&dyn CommandExecutor; 3] =
        [&calendar::CalendarCommand, &events::EventCommand, &transfer::TransferCommand];

    match executors.iter().find(|e| e.can_handle(&command)) {
        Some(executor) => executor.execute(ctx, command),
        None => Err(anyhow!("No handler for command {:?}", command)),
    }
}
