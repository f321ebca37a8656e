use crate::calendar::{CalendarError, Event, EventDraft, EventId, EventPatch, Origin};
use anyhow::{Result, anyhow};
use chrono::Utc;
use log::{debug, error, warn};
use std::collections::{HashMap, HashSet};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Key of the single document holding every user event
pub const EVENTS_KEY: &str = "calendar-events";
// Maximum allowed size for state files to prevent DoS attacks (10MB)
const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Whole-document key-value persistence, the local equivalent of browser storage.
pub trait KeyValueStorage {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Stores each key as `<key>.json` inside a state directory.
pub struct FileStorage {
    state_dir: PathBuf,
}

impl FileStorage {
    pub fn new(state_dir: impl Into<PathBuf>) -> Result<Self> {
        let state_dir = state_dir.into();
        fs::create_dir_all(&state_dir)?;
        Ok(Self { state_dir })
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.state_dir.join(format!("{}.json", key))
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }

        // Check file size before loading to prevent DoS attacks
        let metadata = fs::metadata(&path)?;
        if metadata.len() > MAX_FILE_SIZE {
            return Err(anyhow!(CalendarError::Storage(format!(
                "{} exceeds security limits",
                path.display()
            ))));
        }

        let mut content = String::with_capacity(metadata.len() as usize);
        File::open(&path)?.read_to_string(&mut content)?;
        Ok(Some(content))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        // Write a sibling file first so a failed write never leaves a truncated document
        let tmp_path = path.with_extension("json.tmp");
        {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            writer.write_all(value.as_bytes())?;
            writer.flush()?;
        }
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }
}

/// Volatile storage, used by tests and by embedders that persist elsewhere.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Reads and writes the persisted list of user events.
///
/// Every mutation loads the whole collection, changes it in memory and writes the
/// whole collection back.
pub struct EventStorage<S> {
    backend: S,
}

impl<S: KeyValueStorage> EventStorage<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Forgiving read used when (re)building the in-memory view: any failure, including
    /// a backend that cannot be read, yields an empty collection.
    pub fn load(&self) -> Vec<Event> {
        self.try_load().unwrap_or_else(|e| {
            warn!("Failed to read stored events, starting empty: {}", e);
            Vec::new()
        })
    }

    /// Read used by every read-modify-write path. Backend failures propagate so a
    /// mutation never overwrites data it could not read; missing, unparseable or
    /// non-array data still counts as an empty collection.
    pub fn try_load(&self) -> Result<Vec<Event>> {
        let Some(raw) = self.backend.get(EVENTS_KEY)? else {
            return Ok(Vec::new());
        };

        let json_value: serde_json::Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!("Stored events are not valid JSON, starting empty: {}", e);
                return Ok(Vec::new());
            }
        };

        let Some(array) = json_value.as_array() else {
            warn!("Stored events are not an array, starting empty");
            return Ok(Vec::new());
        };

        Ok(array
            .iter()
            .filter_map(|item| match serde_json::from_value::<Event>(item.clone()) {
                Ok(mut event) => {
                    event.origin = Origin::User;
                    Some(event)
                }
                Err(e) => {
                    warn!("Skipping unreadable stored event: {}", e);
                    None
                }
            })
            .collect())
    }

    /// Overwrites the persisted collection entirely.
    pub fn save(&mut self, events: &[Event]) -> Result<()> {
        let content = serde_json::to_string(events)?;
        self.backend.set(EVENTS_KEY, &content).map_err(|e| {
            error!("Error saving events to storage: {}", e);
            e
        })?;
        debug!("Saved {} events", events.len());
        Ok(())
    }

    pub fn append(&mut self, draft: EventDraft) -> Result<Event> {
        let mut events = self.try_load()?;
        let taken: HashSet<EventId> = events.iter().map(|e| e.id.clone()).collect();
        let event = draft.into_event(next_event_id(&taken), Origin::User);
        events.push(event.clone());
        self.save(&events)?;
        Ok(event)
    }

    /// Returns `None` when no persisted event has this id.
    pub fn update(&mut self, id: &EventId, patch: &EventPatch) -> Result<Option<Event>> {
        let mut events = self.try_load()?;
        let Some(event) = events.iter_mut().find(|e| &e.id == id) else {
            return Ok(None);
        };
        patch.apply(event);
        let updated = event.clone();
        self.save(&events)?;
        Ok(Some(updated))
    }

    /// Removing an unknown id is a no-op.
    pub fn remove(&mut self, id: &EventId) -> Result<()> {
        let mut events = self.try_load()?;
        events.retain(|e| &e.id != id);
        self.save(&events)
    }
}

fn now_millis() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default()
}

/// Millisecond timestamp, bumped forward past any id already taken.
pub fn next_event_id(taken: &HashSet<EventId>) -> EventId {
    let mut candidate = now_millis();
    while taken.contains(&EventId::Number(candidate)) {
        candidate += 1;
    }
    EventId::Number(candidate)
}

/// Ids for a batch created within the same instant: a shared timestamp plus a random
/// component, distinct from each other and from `taken`.
pub fn batch_event_ids(count: usize, taken: &HashSet<EventId>) -> Vec<EventId> {
    let stamp = now_millis();
    let mut seen = taken.clone();
    let mut ids = Vec::with_capacity(count);
    while ids.len() < count {
        let random = Uuid::new_v4().simple().to_string();
        let id = EventId::Text(format!("{}-{}", stamp, &random[..12]));
        if seen.insert(id.clone()) {
            ids.push(id);
        }
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    /// Backend whose reads fail, like a file that exists but cannot be read
    struct UnreadableStorage(MemoryStorage);

    impl KeyValueStorage for UnreadableStorage {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(anyhow!("permission denied"))
        }

        fn set(&mut self, key: &str, value: &str) -> Result<()> {
            self.0.set(key, value)
        }
    }

    fn draft(title: &str, time: &str) -> EventDraft {
        EventDraft::new(title, "2025-01-15", time)
    }

    #[test]
    fn test_file_storage_round_trip() -> Result<()> {
        let temp_dir = tempdir()?;
        let mut storage = EventStorage::new(FileStorage::new(temp_dir.path())?);

        let event = storage.append(draft("Test Event", "14:30"))?;
        let events = storage.load();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title, "Test Event");
        assert_eq!(events[0].id, event.id);
        assert!(temp_dir.path().join("calendar-events.json").exists());
        assert!(!temp_dir.path().join("calendar-events.json.tmp").exists());

        Ok(())
    }

    #[test]
    fn test_corrupt_data_loads_as_empty() -> Result<()> {
        let mut backend = MemoryStorage::new();
        backend.set(EVENTS_KEY, "{not json")?;
        assert!(EventStorage::new(backend.clone()).load().is_empty());

        backend.set(EVENTS_KEY, r#"{"title":"object, not array"}"#)?;
        assert!(EventStorage::new(backend).load().is_empty());
        Ok(())
    }

    #[test]
    fn test_read_failure_blocks_mutations() -> Result<()> {
        let mut backend = MemoryStorage::new();
        backend.set(EVENTS_KEY, r#"[{"id":1,"title":"kept","date":"2025-01-01"}]"#)?;
        let mut storage = EventStorage::new(UnreadableStorage(backend));

        assert!(storage.load().is_empty());
        assert!(storage.try_load().is_err());
        assert!(storage.append(draft("New", "09:00")).is_err());
        assert!(storage.update(&EventId::Number(1), &EventPatch::default()).is_err());
        assert!(storage.remove(&EventId::Number(1)).is_err());

        let stored = storage.backend().0.get(EVENTS_KEY)?;
        assert_eq!(stored.as_deref(), Some(r#"[{"id":1,"title":"kept","date":"2025-01-01"}]"#));
        Ok(())
    }

    #[test]
    fn test_oversized_file_is_not_overwritten() -> Result<()> {
        let temp_dir = tempdir()?;
        let path = temp_dir.path().join("calendar-events.json");
        let file = File::create(&path)?;
        file.set_len(MAX_FILE_SIZE + 1)?;

        let mut storage = EventStorage::new(FileStorage::new(temp_dir.path())?);
        assert!(storage.try_load().is_err());
        assert!(storage.append(draft("New", "09:00")).is_err());
        assert_eq!(fs::metadata(&path)?.len(), MAX_FILE_SIZE + 1);
        Ok(())
    }

    #[test]
    fn test_unreadable_elements_are_skipped() -> Result<()> {
        let mut backend = MemoryStorage::new();
        backend.set(
            EVENTS_KEY,
            r#"[{"id":1,"title":"ok","date":"2025-01-01","time":"10:00"},{"bogus":true}]"#,
        )?;
        let events = EventStorage::new(backend).load();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].origin, Origin::User);
        Ok(())
    }

    #[test]
    fn test_save_of_load_is_idempotent() -> Result<()> {
        let mut storage = EventStorage::new(MemoryStorage::new());
        storage.append(draft("A", "09:00"))?;
        storage.append(draft("B", "all-day"))?;
        let before = storage.backend().get(EVENTS_KEY)?;

        let loaded = storage.load();
        storage.save(&loaded)?;
        assert_eq!(storage.backend().get(EVENTS_KEY)?, before);
        Ok(())
    }

    #[test]
    fn test_update_merges_and_reports_missing() -> Result<()> {
        let mut storage = EventStorage::new(MemoryStorage::new());
        let event = storage.append(draft("Gym", "18:00"))?;

        let patch = EventPatch {
            title: Some("Gym session".to_string()),
            ..Default::default()
        };
        let updated = storage.update(&event.id, &patch)?.expect("event exists");
        assert_eq!(updated.title, "Gym session");
        assert_eq!(updated.time, "18:00");
        assert_eq!(storage.load()[0].title, "Gym session");

        assert!(storage.update(&EventId::Number(1), &patch)?.is_none());
        Ok(())
    }

    #[test]
    fn test_remove_missing_id_is_noop() -> Result<()> {
        let mut storage = EventStorage::new(MemoryStorage::new());
        storage.append(draft("Keep", "08:00"))?;
        storage.remove(&EventId::Text("nope".to_string()))?;
        assert_eq!(storage.load().len(), 1);
        Ok(())
    }

    #[test]
    fn test_rapid_appends_get_distinct_ids() -> Result<()> {
        let mut storage = EventStorage::new(MemoryStorage::new());
        let a = storage.append(draft("A", "09:00"))?;
        let b = storage.append(draft("B", "09:00"))?;
        assert_ne!(a.id, b.id);
        Ok(())
    }

    #[test]
    fn test_batch_ids_are_distinct() {
        let taken: HashSet<EventId> = [EventId::Number(1)].into_iter().collect();
        let ids = batch_event_ids(50, &taken);
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), 50);
        assert!(!ids.contains(&EventId::Number(1)));
    }
}
