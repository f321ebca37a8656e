use crate::calendar::{
    ALL_DAY, CalendarError, EventDraft, EventId, EventKind, EventPatch, validate_date_format,
    validate_time_format,
};
use crate::cli::Commands;
use crate::commands::calendar::format_event_line;
use crate::commands::{CommandContext, CommandExecutor};
use anyhow::{Result, anyhow};
use log::info;

pub struct EventCommand;

impl CommandExecutor for EventCommand {
    fn can_handle(&self, command: &Commands) -> bool {
        matches!(
            command,
            Commands::Add { .. } | Commands::Edit { .. } | Commands::Delete { .. }
        )
    }

    fn execute(&self, ctx: &mut CommandContext, command: Commands) -> Result<()> {
        match command {
            Commands::Add {
                title,
                date,
                time,
                duration,
                category,
                description,
            } => {
                let defaults = ctx.config.event_defaults();
                let time = time.unwrap_or_else(|| ALL_DAY.to_string());
                let mut draft = EventDraft::new(title.trim(), &date, &time);
                draft.duration = match draft.kind {
                    EventKind::AllDay => 0,
                    EventKind::Timed => duration.unwrap_or(defaults.duration_minutes),
                };
                draft.category = category.unwrap_or(defaults.category);
                draft.description = description
                    .map(|d| d.trim().to_string())
                    .unwrap_or_default();
                add_event(ctx, draft)
            }
            Commands::Edit {
                id,
                title,
                date,
                time,
                duration,
                kind,
                category,
                description,
            } => {
                let patch = EventPatch {
                    title,
                    date,
                    time,
                    duration,
                    kind,
                    category,
                    description,
                };
                edit_event(ctx, id.parse()?, patch)
            }
            Commands::Delete { id } => delete_event(ctx, id.parse()?),
            _ => Ok(()),
        }
    }
}

fn check_fields(title: Option<&str>, date: Option<&str>, time: Option<&str>) -> Result<()> {
    if title.is_some_and(|t| t.trim().is_empty()) {
        return Err(anyhow!("Event title cannot be empty"));
    }
    if let Some(date) = date {
        if !validate_date_format(date) {
            return Err(anyhow!("Invalid date '{}'. Expected format: YYYY-MM-DD", date));
        }
    }
    if let Some(time) = time {
        if time != ALL_DAY && !validate_time_format(time) {
            return Err(anyhow!("Invalid time '{}'. Expected HH:MM or all-day", time));
        }
    }
    Ok(())
}

fn add_event(ctx: &mut CommandContext, draft: EventDraft) -> Result<()> {
    check_fields(Some(&draft.title), Some(&draft.date), Some(&draft.time))?;
    let event = ctx.store.add_event(draft)?;
    println!("✅ Created {}", format_event_line(&event));

    let date = crate::commands::parse_date_arg(&event.date)?;
    for (first, second) in ctx.store.conflicts(date) {
        if first.id == event.id || second.id == event.id {
            let other = if first.id == event.id { second } else { first };
            println!("⚠️  Conflicts with '{}' at {}", other.title, other.time);
        }
    }
    Ok(())
}

fn edit_event(ctx: &mut CommandContext, id: EventId, patch: EventPatch) -> Result<()> {
    if patch.is_empty() {
        println!("Nothing to change.");
        return Ok(());
    }
    check_fields(patch.title.as_deref(), patch.date.as_deref(), patch.time.as_deref())?;

    match ctx.store.update_event(&id, &patch) {
        Ok(Some(event)) => {
            info!("Updated event {}", id);
            println!("✅ Updated {}", format_event_line(&event));
            Ok(())
        }
        Ok(None) => Err(anyhow!("Event {} not found", id)),
        Err(e)
            if matches!(
                e.downcast_ref::<CalendarError>(),
                Some(CalendarError::ReadOnlyEvent(_))
            ) =>
        {
            println!("❌ {}", e);
            Ok(())
        }
        Err(e) => Err(e),
    }
}

fn delete_event(ctx: &mut CommandContext, id: EventId) -> Result<()> {
    if !ctx.store.events().iter().any(|e| e.id == id) {
        return Err(anyhow!("Event {} not found", id));
    }
    if ctx.store.delete_event(&id)? {
        println!("🗑️  Deleted event {}", id);
    } else {
        println!("❌ Event {} is built in and cannot be deleted", id);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_fields() {
        assert!(check_fields(Some("Lunch"), Some("2025-03-01"), Some("12:00")).is_ok());
        assert!(check_fields(Some("Lunch"), Some("2025-03-01"), Some(ALL_DAY)).is_ok());
        assert!(check_fields(None, None, None).is_ok());
        assert!(check_fields(Some("  "), None, None).is_err());
        assert!(check_fields(None, Some("2025-3-1"), None).is_err());
        assert!(check_fields(None, None, Some("25:00")).is_err());
    }
}
