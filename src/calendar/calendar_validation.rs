//! Validation and normalization of event records supplied from outside the app.
//
// Records arrive as raw JSON so that wrong field types can be rejected before they are
// turned into typed drafts.

use super::calendar_types::{ALL_DAY, Category, EventDraft, EventKind};
use anyhow::{Result, anyhow};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date pattern is valid"));
static TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([01]?\d|2[0-3]):[0-5]\d$").expect("time pattern is valid"));

/// Values used to fill fields an imported record leaves out
#[derive(Debug, Clone, PartialEq)]
pub struct EventDefaults {
    pub time: String,
    pub duration_minutes: u32,
    pub category: Category,
}

impl Default for EventDefaults {
    fn default() -> Self {
        Self {
            time: "09:00".to_string(),
            duration_minutes: 60,
            category: Category::Other,
        }
    }
}

/// Validate date string has format YYYY-MM-DD and names a real day
pub fn validate_date_format(date: &str) -> bool {
    DATE_RE.is_match(date) && NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok()
}

/// Validate time string has format HH:MM (hour may be a single digit)
pub fn validate_time_format(time: &str) -> bool {
    TIME_RE.is_match(time)
}

/// A field counts as absent when missing, null or an empty string
fn present<'a>(record: &'a Value, field: &str) -> Option<&'a Value> {
    record.get(field).filter(|v| !v.is_null() && v.as_str() != Some(""))
}

/// Check an imported record against the import rules.
pub fn validate_event_data(record: &Value) -> bool {
    if !record.is_object() {
        return false;
    }

    // Required fields
    match record.get("title").and_then(Value::as_str) {
        Some(title) if !title.trim().is_empty() => {}
        _ => return false,
    }
    match record.get("date").and_then(Value::as_str) {
        Some(date) if validate_date_format(date) => {}
        _ => return false,
    }

    let time = match present(record, "time") {
        Some(time) => match time.as_str() {
            Some(t) if t == ALL_DAY || validate_time_format(t) => Some(t),
            _ => return false,
        },
        None => None,
    };

    // An explicit type must be known and must agree with the time
    if let Some(kind) = present(record, "type") {
        let Some(kind) = kind.as_str().and_then(|k| k.parse::<EventKind>().ok()) else {
            return false;
        };
        if time.is_some_and(|t| EventKind::for_time(t) != kind) {
            return false;
        }
    }

    if let Some(duration) = present(record, "duration") {
        match duration.as_f64() {
            Some(minutes) if minutes.is_finite() && minutes >= 0.0 => {}
            _ => return false,
        }
    }

    if let Some(category) = present(record, "category") {
        match category.as_str() {
            Some(c) if c.parse::<Category>().is_ok() => {}
            _ => return false,
        }
    }

    true
}

fn duration_minutes(value: &Value) -> Option<u32> {
    let minutes = match value.as_u64() {
        Some(n) => n,
        None => value.as_f64()?.round() as u64,
    };
    Some(u32::try_from(minutes).unwrap_or(u32::MAX))
}

/// Fill defaults and tidy strings on a record that passed [`validate_event_data`].
pub fn normalize_event_data(record: &Value, defaults: &EventDefaults) -> Result<EventDraft> {
    let title = record
        .get("title")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("Missing title"))?
        .trim()
        .to_string();
    let date = record
        .get("date")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("Missing date"))?
        .to_string();

    let explicit_kind = present(record, "type")
        .and_then(Value::as_str)
        .and_then(|t| t.parse::<EventKind>().ok());
    let time = match present(record, "time").and_then(Value::as_str) {
        Some(time) => time.to_string(),
        None if explicit_kind == Some(EventKind::AllDay) => ALL_DAY.to_string(),
        None => defaults.time.clone(),
    };
    // a validated record's explicit type always agrees with its time
    let kind = EventKind::for_time(&time);

    let duration = if kind == EventKind::AllDay {
        0
    } else {
        match record.get("duration").and_then(duration_minutes) {
            Some(0) | None => defaults.duration_minutes,
            Some(minutes) => minutes,
        }
    };

    let category = present(record, "category")
        .and_then(Value::as_str)
        .and_then(|c| c.parse().ok())
        .unwrap_or(defaults.category);

    let description = record
        .get("description")
        .and_then(Value::as_str)
        .map(|d| d.trim().to_string())
        .unwrap_or_default();

    Ok(EventDraft {
        title,
        date,
        time,
        duration,
        kind,
        category,
        description,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    #[test_case("2025-01-15" => true)]
    #[test_case("2024-02-29" => true ; "leap day")]
    #[test_case("2025-02-29" => false ; "not a leap year")]
    #[test_case("2025-1-15" => false)]
    #[test_case("15/01/2025" => false)]
    #[test_case("" => false)]
    fn test_validate_date_format(date: &str) -> bool {
        validate_date_format(date)
    }

    #[test_case("09:00" => true)]
    #[test_case("9:00" => true ; "single digit hour")]
    #[test_case("23:59" => true)]
    #[test_case("24:00" => false)]
    #[test_case("12:60" => false)]
    #[test_case("noon" => false)]
    fn test_validate_time_format(time: &str) -> bool {
        validate_time_format(time)
    }

    #[test]
    fn test_validate_event_data() {
        assert!(validate_event_data(&json!({"title": "A", "date": "2025-01-15"})));
        assert!(validate_event_data(&json!({
            "title": "A",
            "date": "2025-01-15",
            "time": "all-day",
            "duration": 0,
            "category": "travel"
        })));

        assert!(!validate_event_data(&json!({"date": "2025-01-16"})));
        assert!(!validate_event_data(&json!({"title": "   ", "date": "2025-01-16"})));
        assert!(!validate_event_data(&json!({"title": 5, "date": "2025-01-16"})));
        assert!(!validate_event_data(&json!(["not", "an", "object"])));
    }

    #[test_case(json!({"time": "25:00"}) => false ; "out of range time")]
    #[test_case(json!({"time": 900}) => false ; "numeric time")]
    #[test_case(json!({"time": ""}) => true ; "empty time is absent")]
    #[test_case(json!({"duration": -5}) => false ; "negative duration")]
    #[test_case(json!({"duration": "60"}) => false ; "string duration")]
    #[test_case(json!({"duration": 1e12}) => true ; "huge duration")]
    #[test_case(json!({"category": "chores"}) => false ; "unknown category")]
    #[test_case(json!({"category": ""}) => true ; "empty category is absent")]
    #[test_case(json!({"type": "all-day", "time": "10:00"}) => false ; "type disagrees with time")]
    #[test_case(json!({"type": "timed", "time": "all-day"}) => false ; "timed type on all-day")]
    #[test_case(json!({"type": "someday"}) => false ; "unknown type")]
    #[test_case(json!({"type": "all-day"}) => true ; "type without time")]
    #[test_case(json!({"type": "timed", "time": "10:00"}) => true ; "type agrees with time")]
    fn test_validate_optional_fields(extra: Value) -> bool {
        let mut record = json!({"title": "A", "date": "2025-01-16"});
        if let (Some(record), Some(extra)) = (record.as_object_mut(), extra.as_object()) {
            record.extend(extra.clone());
        }
        validate_event_data(&record)
    }

    #[test]
    fn test_normalize_treats_empty_strings_as_missing() -> Result<()> {
        let record = json!({"title": "A", "date": "2025-01-15", "time": "", "category": ""});
        assert!(validate_event_data(&record));

        let draft = normalize_event_data(&record, &EventDefaults::default())?;
        assert_eq!(draft.time, "09:00");
        assert_eq!(draft.kind, EventKind::Timed);
        assert_eq!(draft.category, Category::Other);
        Ok(())
    }

    #[test]
    fn test_normalize_fills_defaults() -> Result<()> {
        let draft = normalize_event_data(
            &json!({"title": "  Dentist  ", "date": "2025-01-15", "description": "  bring card "}),
            &EventDefaults::default(),
        )?;
        assert_eq!(
            draft,
            EventDraft {
                title: "Dentist".to_string(),
                date: "2025-01-15".to_string(),
                time: "09:00".to_string(),
                duration: 60,
                kind: EventKind::Timed,
                category: Category::Other,
                description: "bring card".to_string(),
            }
        );
        Ok(())
    }

    #[test]
    fn test_normalize_all_day() -> Result<()> {
        let defaults = EventDefaults::default();
        let draft = normalize_event_data(
            &json!({"title": "Holiday", "date": "2025-01-20", "time": "all-day", "duration": 0}),
            &defaults,
        )?;
        assert_eq!(draft.kind, EventKind::AllDay);
        assert_eq!(draft.duration, 0);

        let by_type = normalize_event_data(
            &json!({"title": "Trip", "date": "2025-01-20", "type": "all-day"}),
            &defaults,
        )?;
        assert_eq!(by_type.time, ALL_DAY);
        assert_eq!(by_type.kind, EventKind::AllDay);
        Ok(())
    }

    #[test]
    fn test_normalize_keeps_explicit_values() -> Result<()> {
        let draft = normalize_event_data(
            &json!({
                "title": "Run",
                "date": "2025-01-15",
                "time": "07:15",
                "duration": 45,
                "category": "health"
            }),
            &EventDefaults::default(),
        )?;
        assert_eq!(draft.time, "07:15");
        assert_eq!(draft.duration, 45);
        assert_eq!(draft.category, Category::Health);
        Ok(())
    }

    #[test]
    fn test_normalize_clamps_huge_duration() -> Result<()> {
        let record = json!({
            "title": "Long",
            "date": "2025-03-01",
            "time": "10:00",
            "duration": 1e12
        });
        let draft = normalize_event_data(&record, &EventDefaults::default())?;
        assert_eq!(draft.duration, u32::MAX);
        Ok(())
    }

    #[test]
    fn test_normalize_requires_title() {
        let record = json!({"date": "2025-01-15"});
        assert!(normalize_event_data(&record, &EventDefaults::default()).is_err());
    }
}
