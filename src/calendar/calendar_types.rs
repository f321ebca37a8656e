//! Event types shared by the storage layer, the event store and the importer.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sentinel stored in `time` for events that span the whole day
pub const ALL_DAY: &str = "all-day";

/// Identifier of an event.
///
/// Built-in events use small fixed numbers, events created one at a time use a
/// millisecond timestamp, and imported events use a timestamp plus a random suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventId {
    Number(u64),
    Text(String),
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventId::Number(n) => write!(f, "{}", n),
            EventId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl FromStr for EventId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.parse::<u64>() {
            Ok(n) => EventId::Number(n),
            Err(_) => EventId::Text(s.to_string()),
        })
    }
}

impl From<u64> for EventId {
    fn from(n: u64) -> Self {
        EventId::Number(n)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Work,
    Personal,
    Meeting,
    Social,
    Health,
    Travel,
    Entertainment,
    #[default]
    Other,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Work,
        Category::Personal,
        Category::Meeting,
        Category::Social,
        Category::Health,
        Category::Travel,
        Category::Entertainment,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Work => "work",
            Category::Personal => "personal",
            Category::Meeting => "meeting",
            Category::Social => "social",
            Category::Health => "health",
            Category::Travel => "travel",
            Category::Entertainment => "entertainment",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("Unknown category: '{}'", s))
    }
}

/// Serialized as the `type` field: `"timed"` or `"all-day"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    #[default]
    Timed,
    AllDay,
}

impl EventKind {
    pub fn for_time(time: &str) -> Self {
        if time == ALL_DAY {
            EventKind::AllDay
        } else {
            EventKind::Timed
        }
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "timed" => Ok(EventKind::Timed),
            "all-day" => Ok(EventKind::AllDay),
            other => Err(format!("Unknown event type: '{}'", other)),
        }
    }
}

/// Where an event came from. Never persisted; set when events enter memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Origin {
    /// Shipped with the application, read-only
    Static,
    /// Created or imported by the user, persisted
    #[default]
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub date: String,
    pub time: String,
    #[serde(default)]
    pub duration: u32,
    #[serde(rename = "type", default)]
    pub kind: EventKind,
    #[serde(default, deserialize_with = "lenient_category")]
    pub category: Category,
    #[serde(default)]
    pub description: String,
    #[serde(skip)]
    pub origin: Origin,
}

impl Event {
    pub fn is_all_day(&self) -> bool {
        self.time == ALL_DAY
    }

    pub fn is_static(&self) -> bool {
        self.origin == Origin::Static
    }
}

/// An event that has not been assigned an id yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDraft {
    pub title: String,
    pub date: String,
    pub time: String,
    #[serde(default)]
    pub duration: u32,
    #[serde(rename = "type", default)]
    pub kind: EventKind,
    #[serde(default, deserialize_with = "lenient_category")]
    pub category: Category,
    #[serde(default)]
    pub description: String,
}

impl EventDraft {
    pub fn new(title: &str, date: &str, time: &str) -> Self {
        Self {
            title: title.to_string(),
            date: date.to_string(),
            time: time.to_string(),
            duration: if time == ALL_DAY { 0 } else { 60 },
            kind: EventKind::for_time(time),
            category: Category::Other,
            description: String::new(),
        }
    }

    pub fn into_event(self, id: EventId, origin: Origin) -> Event {
        Event {
            id,
            title: self.title,
            date: self.date,
            time: self.time,
            duration: self.duration,
            kind: self.kind,
            category: self.category,
            description: self.description,
            origin,
        }
    }
}

/// Partial update merged into an existing event. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventPatch {
    pub title: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub duration: Option<u32>,
    #[serde(rename = "type")]
    pub kind: Option<EventKind>,
    pub category: Option<Category>,
    pub description: Option<String>,
}

impl EventPatch {
    pub fn is_empty(&self) -> bool {
        *self == EventPatch::default()
    }

    pub fn apply(&self, event: &mut Event) {
        if let Some(title) = &self.title {
            event.title = title.clone();
        }
        if let Some(date) = &self.date {
            event.date = date.clone();
        }
        if let Some(time) = &self.time {
            event.time = time.clone();
            // keep `type` in agreement with `time` unless the patch sets it too
            if self.kind.is_none() {
                event.kind = EventKind::for_time(time);
            }
        }
        if let Some(duration) = self.duration {
            event.duration = duration;
        }
        if let Some(kind) = self.kind {
            event.kind = kind;
        }
        if let Some(category) = self.category {
            event.category = category;
        }
        if let Some(description) = &self.description {
            event.description = description.clone();
        }
    }
}

fn lenient_category<'de, D>(deserializer: D) -> Result<Category, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.parse().ok()).unwrap_or_default())
}
