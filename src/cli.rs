use crate::calendar::{Category, EventKind};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// pocketcal - a personal calendar that lives in your terminal
#[derive(Debug, Parser)]
#[command(name = "pocketcal")]
#[command(
    about = "Personal calendar with conflict warnings and JSON import/export",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the data directory from the config file
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show the events of one day (today by default)
    #[command(alias = "today")]
    Day {
        /// Date (YYYY-MM-DD)
        date: Option<String>,
    },

    /// Show the week containing a date
    Week {
        /// Date (YYYY-MM-DD)
        date: Option<String>,
    },

    /// Show a month grid
    Month {
        /// Month (YYYY-MM)
        month: Option<String>,
    },

    /// List overlapping timed events on a day
    Conflicts {
        /// Date (YYYY-MM-DD)
        date: Option<String>,
    },

    /// Create a new event
    #[command(alias = "create")]
    Add {
        /// Event title
        #[arg(required = true)]
        title: String,

        /// Event date (YYYY-MM-DD)
        #[arg(required = true)]
        date: String,

        /// Start time (HH:MM); omit for an all-day event
        time: Option<String>,

        /// Duration in minutes
        #[arg(long)]
        duration: Option<u32>,

        /// Event category
        #[arg(long, value_parser = parse_category)]
        category: Option<Category>,

        /// Event description
        #[arg(long)]
        description: Option<String>,
    },

    /// Change fields of an existing event
    Edit {
        /// Event id
        #[arg(required = true)]
        id: String,

        #[arg(long)]
        title: Option<String>,

        /// New date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,

        /// New start time (HH:MM or all-day)
        #[arg(long)]
        time: Option<String>,

        #[arg(long)]
        duration: Option<u32>,

        #[arg(long = "type", value_parser = parse_kind)]
        kind: Option<EventKind>,

        #[arg(long, value_parser = parse_category)]
        category: Option<Category>,

        #[arg(long)]
        description: Option<String>,
    },

    /// Delete an event
    #[command(alias = "remove")]
    Delete {
        /// Event id
        #[arg(required = true)]
        id: String,
    },

    /// Import events from a JSON file
    Import {
        /// File to import
        #[arg(required = true)]
        file: PathBuf,

        /// Commit the valid events without asking
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Export every event to a timestamped JSON file
    Export {
        /// Target directory
        #[arg(default_value = ".")]
        dir: PathBuf,
    },

    /// Print an example import file
    Sample,
}

fn parse_category(s: &str) -> Result<Category, String> {
    s.to_lowercase().parse()
}

fn parse_kind(s: &str) -> Result<EventKind, String> {
    s.to_lowercase().parse()
}
