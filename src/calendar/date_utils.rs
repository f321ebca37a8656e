//! Pure calendar math and the interval logic behind conflict warnings.
//
// All date comparisons go through the canonical "YYYY-MM-DD" key rather than timestamps,
// so local-time conversions can never move an event to a neighbouring day.

use super::calendar_types::{ALL_DAY, Event};
use chrono::{Datelike, Duration, NaiveDate, NaiveTime};

/// Format a date as its canonical "YYYY-MM-DD" key
pub fn canonical_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse a canonical key back into a date
pub fn parse_canonical_date(key: &str) -> Option<NaiveDate> {
    if key.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(key, "%Y-%m-%d").ok()
}

pub fn is_same_day(a: &impl Datelike, b: &impl Datelike) -> bool {
    a.year() == b.year() && a.ordinal() == b.ordinal()
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Zero-based months past December roll into the following years.
fn normalize_month(month: u32, year: i32) -> (u32, i32) {
    (month % 12, year + (month / 12) as i32)
}

/// Number of days in a month. `month` is zero-based (0 = January).
pub fn days_in_month(month: u32, year: i32) -> u32 {
    let (month, year) = normalize_month(month, year);
    match month + 1 {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        _ if is_leap_year(year) => 29,
        _ => 28,
    }
}

/// Weekday of the first day of a month, 0 = Sunday .. 6 = Saturday.
/// `month` is zero-based (0 = January).
pub fn first_weekday_of_month(month: u32, year: i32) -> u32 {
    // Sakamoto's method
    const OFFSETS: [i32; 12] = [0, 3, 2, 5, 0, 3, 5, 1, 4, 6, 2, 4];
    let (month, year) = normalize_month(month, year);
    let y = if month < 2 { year - 1 } else { year };
    let day = y + y.div_euclid(4) - y.div_euclid(100) + y.div_euclid(400)
        + OFFSETS[month as usize]
        + 1;
    day.rem_euclid(7) as u32
}

/// The Sunday-first week containing `date`
pub fn week_days(date: NaiveDate) -> [NaiveDate; 7] {
    let start = date - Duration::days(i64::from(date.weekday().num_days_from_sunday()));
    std::array::from_fn(|i| start + Duration::days(i as i64))
}

/// Minutes since midnight for "H:MM"/"HH:MM"; `None` for "all-day" or garbage
pub fn time_to_minutes(time: &str) -> Option<u32> {
    let (hours, minutes) = time.split_once(':')?;
    let hours: u32 = hours.parse().ok()?;
    let minutes: u32 = minutes.parse().ok()?;
    (hours < 24 && minutes < 60).then_some(hours * 60 + minutes)
}

/// "14:30" -> "2:30 PM"
pub fn format_display_time(time: &str) -> String {
    if time == ALL_DAY {
        return "All day".to_string();
    }
    match NaiveTime::parse_from_str(time, "%H:%M") {
        Ok(t) => t.format("%-I:%M %p").to_string(),
        Err(_) => time.to_string(),
    }
}

/// Half-open `[start, end)` interval of a timed event, in minutes since midnight
fn interval(event: &Event) -> Option<(u32, u32)> {
    if event.is_all_day() {
        return None;
    }
    let start = time_to_minutes(&event.time)?;
    // saturate so huge imported durations never wrap around
    Some((start, start.saturating_add(event.duration)))
}

/// Events whose canonical date matches `date`, in collection order
pub fn events_on_date(events: &[Event], date: NaiveDate) -> Vec<&Event> {
    let key = canonical_date(date);
    events.iter().filter(|e| e.date == key).collect()
}

/// Two timed events on the same date whose intervals intersect
pub fn overlaps(a: &Event, b: &Event) -> bool {
    if a.date != b.date {
        return false;
    }
    match (interval(a), interval(b)) {
        (Some((start1, end1)), Some((start2, end2))) => start1 < end2 && start2 < end1,
        _ => false,
    }
}

/// Every unordered pair of overlapping timed events on `date`.
///
/// Quadratic in the number of events that day, which stays in the tens.
pub fn find_conflicts(events: &[Event], date: NaiveDate) -> Vec<(&Event, &Event)> {
    let timed: Vec<&Event> =
        events_on_date(events, date).into_iter().filter(|e| !e.is_all_day()).collect();

    let mut conflicts = Vec::new();
    for (i, first) in timed.iter().enumerate() {
        for second in &timed[i + 1..] {
            if first.id != second.id && overlaps(first, second) {
                conflicts.push((*first, *second));
            }
        }
    }
    conflicts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{EventDraft, EventId, Origin};
    use test_case::test_case;

    fn event(id: u64, date: &str, time: &str, duration: u32) -> Event {
        let mut draft = EventDraft::new(&format!("Event {}", id), date, time);
        draft.duration = duration;
        draft.into_event(EventId::Number(id), Origin::User)
    }

    fn date(key: &str) -> NaiveDate {
        parse_canonical_date(key).unwrap()
    }

    #[test]
    fn test_canonical_date() {
        let d = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        assert_eq!(canonical_date(d), "2025-03-01");
        assert_eq!(parse_canonical_date("2025-03-01"), Some(d));
        assert_eq!(parse_canonical_date("2025-3-1"), None);
        assert_eq!(parse_canonical_date("2025-02-30"), None);
    }

    #[test]
    fn test_is_same_day() {
        let morning = date("2025-03-01").and_hms_opt(8, 0, 0).unwrap();
        let night = date("2025-03-01").and_hms_opt(23, 59, 0).unwrap();
        assert!(is_same_day(&morning, &night));
        assert!(!is_same_day(&date("2025-03-01"), &date("2024-03-01")));
    }

    #[test_case(0, 2025 => 31 ; "january")]
    #[test_case(1, 2025 => 28 ; "february")]
    #[test_case(1, 2024 => 29 ; "leap february")]
    #[test_case(1, 1900 => 28 ; "century february")]
    #[test_case(1, 2000 => 29 ; "quadricentennial february")]
    #[test_case(3, 2025 => 30 ; "april")]
    #[test_case(12, 2024 => 31 ; "rolls into next january")]
    fn test_days_in_month(month: u32, year: i32) -> u32 {
        days_in_month(month, year)
    }

    #[test]
    fn test_first_weekday_matches_chrono() {
        for year in [1999, 2000, 2024, 2025, 2100] {
            for month in 0..12u32 {
                let expected = NaiveDate::from_ymd_opt(year, month + 1, 1)
                    .unwrap()
                    .weekday()
                    .num_days_from_sunday();
                let actual = first_weekday_of_month(month, year);
                assert_eq!(actual, expected, "{}-{}", year, month + 1);
            }
        }
    }

    #[test]
    fn test_week_days_start_on_sunday() {
        let days = week_days(date("2025-03-05"));
        assert_eq!(days[0], date("2025-03-02"));
        assert_eq!(days[6], date("2025-03-08"));
    }

    #[test]
    fn test_format_display_time() {
        assert_eq!(format_display_time("14:30"), "2:30 PM");
        assert_eq!(format_display_time("09:05"), "9:05 AM");
        assert_eq!(format_display_time("all-day"), "All day");
    }

    #[test]
    fn test_overlap_examples() {
        let a = event(1, "2025-03-01", "09:00", 60);
        let b = event(2, "2025-03-01", "09:30", 30);
        let c = event(3, "2025-03-01", "10:00", 15);

        assert!(overlaps(&a, &b));
        assert!(overlaps(&b, &a));
        assert!(!overlaps(&a, &c));
        assert!(!overlaps(&c, &a));

        let events = vec![a.clone(), b.clone(), c];
        let conflicts = find_conflicts(&events, date("2025-03-01"));
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].0.id, a.id);
        assert_eq!(conflicts[0].1.id, b.id);
    }

    #[test]
    fn test_different_dates_never_overlap() {
        let a = event(1, "2025-03-01", "09:00", 60);
        let b = event(2, "2025-03-02", "09:00", 60);
        assert!(!overlaps(&a, &b));
    }

    #[test]
    fn test_all_day_events_never_conflict() {
        let all_day = event(1, "2025-03-01", ALL_DAY, 1440);
        let timed = event(2, "2025-03-01", "09:00", 60);
        assert!(!overlaps(&all_day, &timed));

        let events = vec![all_day, timed.clone(), event(3, "2025-03-01", "09:15", 10)];
        let conflicts = find_conflicts(&events, date("2025-03-01"));
        assert_eq!(conflicts.len(), 1);
        assert!(conflicts.iter().all(|(x, y)| !x.is_all_day() && !y.is_all_day()));
    }

    #[test]
    fn test_no_self_pairs() {
        let a = event(1, "2025-03-01", "09:00", 60);
        let events = vec![a.clone(), a];
        assert!(find_conflicts(&events, date("2025-03-01")).is_empty());
    }

    #[test]
    fn test_events_on_date_filters_by_key() {
        let events = vec![
            event(1, "2025-03-01", "09:00", 60),
            event(2, "2025-03-02", "09:00", 60),
            event(3, "2025-03-01", ALL_DAY, 0),
        ];
        let ids: Vec<_> = events_on_date(&events, date("2025-03-01"))
            .iter()
            .map(|e| e.id.clone())
            .collect();
        assert_eq!(ids, vec![EventId::Number(1), EventId::Number(3)]);
    }

    #[test]
    fn test_huge_duration_does_not_overflow() {
        let long = event(1, "2025-03-01", "10:00", u32::MAX);
        let late = event(2, "2025-03-01", "23:30", 30);
        let early = event(3, "2025-03-01", "08:00", 60);

        assert!(overlaps(&long, &late));
        assert!(overlaps(&late, &long));
        assert!(!overlaps(&long, &early));

        let events = vec![long, late, early];
        let conflicts = find_conflicts(&events, date("2025-03-01"));
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].0.id, EventId::Number(1));
        assert_eq!(conflicts[0].1.id, EventId::Number(2));
    }
}
