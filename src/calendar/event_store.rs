//! The in-memory event collection and the only place that mutates it.
//
// The collection always equals the static seed events followed by the persisted user
// events. Every mutation goes through the storage adapter first and touches memory only
// once persistence succeeded, so memory never holds something storage does not.

use super::calendar_types::{Event, EventDraft, EventId, EventPatch, Origin};
use super::date_utils::{events_on_date, find_conflicts, time_to_minutes};
use super::seed::static_events;
use super::CalendarError;
use crate::state::{EventStorage, KeyValueStorage, batch_event_ids};
use anyhow::{Result, anyhow};
use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, info, warn};
use std::cmp::Ordering;
use std::collections::HashSet;

/// What changed in the store, delivered to subscribers after each mutation
#[derive(Debug, Clone, PartialEq)]
pub enum StoreChange {
    Loaded { count: usize },
    Added(EventId),
    Updated(EventId),
    Deleted(EventId),
    Imported(Vec<EventId>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(usize);

type Observer = Box<dyn FnMut(&StoreChange)>;

pub struct EventStore<S> {
    storage: EventStorage<S>,
    seeds: Vec<Event>,
    events: Vec<Event>,
    observers: Vec<(SubscriptionId, Observer)>,
    next_subscription: usize,
}

impl<S: KeyValueStorage> EventStore<S> {
    /// A store seeded with the built-in events. Call [`EventStore::load_events`] before use.
    pub fn new(storage: EventStorage<S>) -> Self {
        Self::with_seeds(storage, static_events())
    }

    pub fn with_seeds(storage: EventStorage<S>, seeds: Vec<Event>) -> Self {
        let seeds = seeds
            .into_iter()
            .map(|mut e| {
                e.origin = Origin::Static;
                e
            })
            .collect();
        Self {
            storage,
            seeds,
            events: Vec::new(),
            observers: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn storage(&self) -> &EventStorage<S> {
        &self.storage
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&StoreChange) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sid, _)| *sid != id);
        self.observers.len() != before
    }

    fn notify(&mut self, change: StoreChange) {
        for (_, observer) in self.observers.iter_mut() {
            observer(&change);
        }
    }

    fn is_static(&self, id: &EventId) -> bool {
        self.seeds.iter().chain(self.events.iter()).any(|e| &e.id == id && e.is_static())
    }

    /// Rebuild memory from the seeds and whatever storage holds. Safe to call repeatedly.
    pub fn load_events(&mut self) {
        let stored = self.storage.load();
        let mut events = self.seeds.clone();
        events.extend(stored);
        debug!("Loaded {} events ({} built in)", events.len(), self.seeds.len());
        self.events = events;
        let count = self.events.len();
        self.notify(StoreChange::Loaded { count });
    }

    pub fn add_event(&mut self, draft: EventDraft) -> Result<Event> {
        let event = self.storage.append(draft)?;
        info!("Added event '{}' ({})", event.title, event.id);
        self.events.push(event.clone());
        self.notify(StoreChange::Added(event.id.clone()));
        Ok(event)
    }

    /// `Ok(None)` when no user event has this id. Built-in events cannot be edited.
    pub fn update_event(&mut self, id: &EventId, patch: &EventPatch) -> Result<Option<Event>> {
        if self.is_static(id) {
            return Err(anyhow!(CalendarError::ReadOnlyEvent(id.clone())));
        }

        let Some(updated) = self.storage.update(id, patch)? else {
            warn!("Update skipped, event {} not found", id);
            return Ok(None);
        };

        if let Some(slot) = self.events.iter_mut().find(|e| &e.id == id) {
            *slot = updated.clone();
        }
        self.notify(StoreChange::Updated(id.clone()));
        Ok(Some(updated))
    }

    /// Returns `false` for built-in events, which are never deleted.
    pub fn delete_event(&mut self, id: &EventId) -> Result<bool> {
        if self.is_static(id) {
            debug!("Refusing to delete built-in event {}", id);
            return Ok(false);
        }

        self.storage.remove(id)?;
        self.events.retain(|e| &e.id != id);
        self.notify(StoreChange::Deleted(id.clone()));
        Ok(true)
    }

    /// Add a batch of validated events with a single write. Either the whole batch is
    /// persisted and visible, or nothing changes.
    pub fn import_events(&mut self, drafts: Vec<EventDraft>) -> Result<Vec<Event>> {
        if drafts.is_empty() {
            return Ok(Vec::new());
        }

        let mut persisted = self.storage.try_load()?;
        let taken: HashSet<EventId> =
            persisted.iter().chain(self.seeds.iter()).map(|e| e.id.clone()).collect();
        let ids = batch_event_ids(drafts.len(), &taken);

        let imported: Vec<Event> = drafts
            .into_iter()
            .zip(ids)
            .map(|(draft, id)| draft.into_event(id, Origin::User))
            .collect();

        persisted.extend(imported.iter().cloned());
        self.storage.save(&persisted)?;

        info!("Imported {} events", imported.len());
        self.events.extend(imported.iter().cloned());
        self.notify(StoreChange::Imported(imported.iter().map(|e| e.id.clone()).collect()));
        Ok(imported)
    }

    /// Events on `date`: all-day first, then by start time. Equal times keep their order.
    pub fn events_for_date(&self, date: NaiveDate) -> Vec<Event> {
        let mut day: Vec<Event> = events_on_date(&self.events, date)
            .into_iter()
            .cloned()
            .collect();
        day.sort_by(compare_start);
        day
    }

    pub fn conflicts(&self, date: NaiveDate) -> Vec<(Event, Event)> {
        find_conflicts(&self.events, date)
            .into_iter()
            .map(|(a, b)| (a.clone(), b.clone()))
            .collect()
    }

    /// The full collection in the import file format
    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.events)?)
    }
}

/// All-day events first, then parsed start time, then unparseable times by raw text
fn start_key(event: &Event) -> (bool, bool, Option<u32>, &str) {
    if event.is_all_day() {
        return (false, false, None, "");
    }
    match time_to_minutes(&event.time) {
        Some(minutes) => (true, false, Some(minutes), ""),
        None => (true, true, None, event.time.as_str()),
    }
}

fn compare_start(a: &Event, b: &Event) -> Ordering {
    start_key(a).cmp(&start_key(b))
}

/// File name for an export taken at `now`
pub fn export_file_name(now: NaiveDateTime) -> String {
    format!("calendar-events-{}.json", now.format("%Y-%m-%d-%H%M%S"))
}
