use crate::state::{EventStorage, FileStorage};
use anyhow::Result;
use log::debug;

mod calendar_import;
mod calendar_types;
mod calendar_validation;
mod date_utils;
mod event_store;
mod seed;
mod view;

pub use calendar_import::*;
pub use calendar_types::*;
pub use calendar_validation::*;
pub use date_utils::*;
pub use event_store::*;
pub use seed::static_events;
pub use view::*;

/// Custom error type for calendar operations
#[derive(Debug, thiserror::Error)]
pub enum CalendarError {
    #[error("Event {0} is built in and cannot be modified")]
    ReadOnlyEvent(EventId),
    #[error("Invalid import file: {0}")]
    InvalidImportFile(String),
    #[error("File size too large ({size} bytes). Please select a file smaller than {limit} bytes")]
    FileTooLarge { size: u64, limit: u64 },
    #[error("Invalid JSON format: {0}")]
    InvalidJson(String),
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Open the file-backed store in `data_dir` and load it.
pub fn open_store(data_dir: &std::path::Path) -> Result<EventStore<FileStorage>> {
    debug!("Opening event store in {}", data_dir.display());
    let mut store = EventStore::new(EventStorage::new(FileStorage::new(data_dir)?));
    store.load_events();
    Ok(store)
}
