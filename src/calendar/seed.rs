//! Built-in example events shipped with the application.

use super::calendar_types::{ALL_DAY, Category, Event, EventDraft, EventId, Origin};

fn seed(
    id: u64,
    title: &str,
    date: &str,
    time: &str,
    duration: u32,
    category: Category,
    description: &str,
) -> Event {
    let mut draft = EventDraft::new(title, date, time);
    draft.duration = duration;
    draft.category = category;
    draft.description = description.to_string();
    draft.into_event(EventId::Number(id), Origin::Static)
}

/// The read-only events every calendar starts with. Ids stay in a small fixed range.
pub fn static_events() -> Vec<Event> {
    vec![
        seed(
            1,
            "Team Standup",
            "2025-01-15",
            "09:30",
            15,
            Category::Meeting,
            "Daily sync with the team",
        ),
        seed(
            2,
            "Project Review",
            "2025-01-15",
            "09:30",
            60,
            Category::Work,
            "Quarterly project review",
        ),
        seed(3, "Lunch with Sarah", "2025-01-16", "12:30", 60, Category::Social, ""),
        seed(4, "Yoga Class", "2025-01-18", "07:00", 45, Category::Health, "Bring a mat"),
        seed(
            5,
            "Company Offsite",
            "2025-01-24",
            ALL_DAY,
            0,
            Category::Travel,
            "Whole team, details to follow",
        ),
        seed(6, "Movie Night", "2025-01-25", "20:00", 150, Category::Entertainment, ""),
    ]
}
