//! JSON import for the calendar module.
//
// Raw bytes come in through `FileAccess`, are parsed into records, validated and
// normalized one by one, and finally committed to the event store in a single batch.

use super::calendar_types::EventDraft;
use super::calendar_validation::{EventDefaults, normalize_event_data, validate_event_data};
use super::event_store::{EventStore, export_file_name};
use super::{CalendarError, Event};
use crate::state::KeyValueStorage;
use anyhow::{Result, anyhow};
use chrono::Local;
use log::{debug, info, warn};
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};

/// Largest import file accepted (5MB)
pub const MAX_IMPORT_BYTES: u64 = 5 * 1024 * 1024;

/// Access to files, kept behind a trait so importing can be tested without a disk.
pub trait FileAccess {
    fn file_size(&self, path: &Path) -> Result<u64>;
    fn read_file(&self, path: &Path) -> Result<Vec<u8>>;
    fn write_file(&mut self, path: &Path, bytes: &[u8]) -> Result<()>;
}

/// The local filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct FsFileAccess;

impl FileAccess for FsFileAccess {
    fn file_size(&self, path: &Path) -> Result<u64> {
        Ok(fs::metadata(path)?.len())
    }

    fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        Ok(fs::read(path)?)
    }

    fn write_file(&mut self, path: &Path, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(fs::write(path, bytes)?)
    }
}

/// Result of processing one import payload
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImportReport {
    pub total_events: usize,
    pub valid_events: Vec<EventDraft>,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImportOutcome {
    Success(usize),
    PartialSuccess { valid: usize, errors: usize },
    Failure,
}

impl ImportReport {
    /// A payload that could not be read as records at all
    pub fn structural_failure(message: impl Into<String>) -> Self {
        Self {
            total_events: 0,
            valid_events: Vec::new(),
            errors: vec![message.into()],
        }
    }

    pub fn outcome(&self) -> ImportOutcome {
        match (self.valid_events.len(), self.errors.len()) {
            (0, _) => ImportOutcome::Failure,
            (valid, 0) => ImportOutcome::Success(valid),
            (valid, errors) => ImportOutcome::PartialSuccess { valid, errors },
        }
    }
}

/// Validate and normalize every record with the default field values.
pub fn process_imported_events(records: &[Value]) -> ImportReport {
    process_imported_events_with(records, &EventDefaults::default())
}

/// Validate and normalize every record. A bad record is reported by its 1-based
/// position and never stops the rest of the batch.
pub fn process_imported_events_with(records: &[Value], defaults: &EventDefaults) -> ImportReport {
    let mut report = ImportReport {
        total_events: records.len(),
        ..Default::default()
    };

    for (index, record) in records.iter().enumerate() {
        if !validate_event_data(record) {
            report.errors.push(format!("Event {}: Invalid event data structure", index + 1));
            continue;
        }
        match normalize_event_data(record, defaults) {
            Ok(draft) => report.valid_events.push(draft),
            Err(e) => report.errors.push(format!("Event {}: {}", index + 1, e)),
        }
    }

    debug!(
        "Processed {} import records: {} valid, {} rejected",
        report.total_events,
        report.valid_events.len(),
        report.errors.len()
    );
    report
}

/// Parse an import payload. A single object is treated as a one-element list.
pub fn parse_import_payload(bytes: &[u8]) -> Result<Vec<Value>> {
    let data: Value = serde_json::from_slice(bytes)
        .map_err(|e| anyhow!(CalendarError::InvalidJson(e.to_string())))?;
    match data {
        Value::Array(records) => Ok(records),
        record @ Value::Object(_) => Ok(vec![record]),
        _ => Err(anyhow!(CalendarError::InvalidImportFile(
            "expected an event object or a list of events".to_string()
        ))),
    }
}

/// Read an import file: `.json` extension, at most `max_bytes`, valid JSON.
pub fn read_json_file(files: &impl FileAccess, path: &Path, max_bytes: u64) -> Result<Vec<Value>> {
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if !is_json {
        return Err(anyhow!(CalendarError::InvalidImportFile(
            "Please select a valid JSON file".to_string()
        )));
    }

    let size = files.file_size(path)?;
    if size > max_bytes {
        return Err(anyhow!(CalendarError::FileTooLarge {
            size,
            limit: max_bytes
        }));
    }

    let bytes = files.read_file(path)?;
    parse_import_payload(&bytes)
}

/// Where an import currently stands
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ImportState {
    #[default]
    Idle,
    Processing,
    Ready(ImportReport),
}

/// One import at a time: process a payload, then commit the valid events or discard them.
/// Processing a new payload replaces whatever was pending.
#[derive(Debug, Default)]
pub struct ImportSession {
    state: ImportState,
    defaults: EventDefaults,
}

impl ImportSession {
    pub fn new(defaults: EventDefaults) -> Self {
        Self {
            state: ImportState::Idle,
            defaults,
        }
    }

    pub fn state(&self) -> &ImportState {
        &self.state
    }

    pub fn report(&self) -> Option<&ImportReport> {
        match &self.state {
            ImportState::Ready(report) => Some(report),
            _ => None,
        }
    }

    fn finish(&mut self, report: ImportReport) -> &ImportReport {
        self.state = ImportState::Ready(report);
        match &self.state {
            ImportState::Ready(report) => report,
            _ => unreachable!("state was just set to Ready"),
        }
    }

    /// Process pasted or already-read JSON text.
    pub fn process_text(&mut self, text: &str) -> &ImportReport {
        self.state = ImportState::Processing;
        let report = match parse_import_payload(text.as_bytes()) {
            Ok(records) => process_imported_events_with(&records, &self.defaults),
            Err(e) => ImportReport::structural_failure(e.to_string()),
        };
        self.finish(report)
    }

    /// Process a file. Format problems become a failed report; I/O errors are returned.
    pub fn process_file(
        &mut self,
        files: &impl FileAccess,
        path: &Path,
        max_bytes: u64,
    ) -> Result<&ImportReport> {
        self.state = ImportState::Processing;
        let report = match read_json_file(files, path, max_bytes) {
            Ok(records) => process_imported_events_with(&records, &self.defaults),
            Err(e) if e.downcast_ref::<CalendarError>().is_some() => {
                ImportReport::structural_failure(e.to_string())
            }
            Err(e) => {
                self.state = ImportState::Idle;
                return Err(e);
            }
        };
        Ok(self.finish(report))
    }

    /// Hand the valid events to the store. On a storage error the report stays pending.
    pub fn commit<S: KeyValueStorage>(
        &mut self,
        store: &mut EventStore<S>,
    ) -> Result<Vec<Event>> {
        let ImportState::Ready(report) = std::mem::take(&mut self.state) else {
            warn!("Nothing to import");
            return Ok(Vec::new());
        };

        match store.import_events(report.valid_events.clone()) {
            Ok(events) => Ok(events),
            Err(e) => {
                self.state = ImportState::Ready(report);
                Err(e)
            }
        }
    }

    pub fn discard(&mut self) {
        if self.state != ImportState::Idle {
            info!("Import discarded");
        }
        self.state = ImportState::Idle;
    }
}

/// Write the store's full collection to a timestamped file inside `dir`.
pub fn export_events<S: KeyValueStorage>(
    store: &EventStore<S>,
    files: &mut impl FileAccess,
    dir: &Path,
) -> Result<PathBuf> {
    let path = dir.join(export_file_name(Local::now().naive_local()));
    files.write_file(&path, store.export_json()?.as_bytes())?;
    info!("Exported {} events to {}", store.events().len(), path.display());
    Ok(path)
}

/// Example import file showing every supported field
pub fn generate_sample_json() -> Result<String> {
    let sample = json!([
        {
            "title": "Team Meeting",
            "date": "2025-01-15",
            "time": "10:00",
            "duration": 60,
            "type": "timed",
            "category": "meeting",
            "description": "Weekly team sync meeting"
        },
        {
            "title": "Doctor Appointment",
            "date": "2025-01-16",
            "time": "14:30",
            "duration": 30,
            "type": "timed",
            "category": "health",
            "description": "Annual checkup"
        },
        {
            "title": "Holiday",
            "date": "2025-01-20",
            "time": "all-day",
            "duration": 0,
            "type": "all-day",
            "category": "personal",
            "description": "National holiday"
        }
    ]);
    Ok(serde_json::to_string_pretty(&sample)?)
}
