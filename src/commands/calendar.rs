use crate::calendar::{CalendarView, Event, ViewMode, canonical_date, format_display_time};
use crate::cli::Commands;
use crate::commands::{CommandContext, CommandExecutor};
use anyhow::{Result, anyhow};
use chrono::{Datelike, NaiveDate};

pub struct CalendarCommand;

impl CommandExecutor for CalendarCommand {
    fn can_handle(&self, command: &Commands) -> bool {
        matches!(
            command,
            Commands::Day { .. }
                | Commands::Week { .. }
                | Commands::Month { .. }
                | Commands::Conflicts { .. }
        )
    }

    fn execute(&self, ctx: &mut CommandContext, command: Commands) -> Result<()> {
        match command {
            Commands::Day { date } => show_day(ctx, ctx.date_or_today(date.as_deref())?),
            Commands::Week { date } => show_week(ctx, ctx.date_or_today(date.as_deref())?),
            Commands::Month { month } => show_month(ctx, month.as_deref()),
            Commands::Conflicts { date } => {
                show_conflicts(ctx, ctx.date_or_today(date.as_deref())?)
            }
            _ => Ok(()),
        }
    }
}

pub fn format_event_line(event: &Event) -> String {
    let when = if event.is_all_day() {
        format_display_time(&event.time)
    } else {
        format!("{} ({} min)", format_display_time(&event.time), event.duration)
    };
    let marker = if event.is_static() { " [built-in]" } else { "" };
    format!("{:<20} {} [{}] id={}{}", when, event.title, event.category, event.id, marker)
}

fn show_day(ctx: &CommandContext, date: NaiveDate) -> Result<()> {
    println!("{}", date.format("%A, %B %-d %Y"));
    let events = ctx.store.events_for_date(date);
    if events.is_empty() {
        println!("  No events");
    }
    for event in &events {
        println!("  {}", format_event_line(event));
        if !event.description.is_empty() {
            println!("      {}", event.description);
        }
    }
    print_conflict_warnings(ctx, date);
    Ok(())
}

fn show_week(ctx: &CommandContext, date: NaiveDate) -> Result<()> {
    let view = CalendarView::new(date, ViewMode::Weekly);
    for day in view.week() {
        let marker = if day == ctx.today { " (today)" } else { "" };
        println!("{} {}{}", day.format("%a"), canonical_date(day), marker);
        for event in ctx.store.events_for_date(day) {
            println!("    {}", format_event_line(&event));
        }
        print_conflict_warnings(ctx, day);
    }
    Ok(())
}

fn parse_month_arg(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", raw), "%Y-%m-%d")
        .map_err(|_| anyhow!("Invalid month '{}'. Expected format: YYYY-MM", raw))
}

fn show_month(ctx: &CommandContext, month: Option<&str>) -> Result<()> {
    let anchor = match month {
        Some(raw) => parse_month_arg(raw)?,
        None => ctx.today,
    };
    let view = CalendarView::new(anchor, ViewMode::Monthly);

    println!("{:^35}", anchor.format("%B %Y").to_string());
    println!(" Sun  Mon  Tue  Wed  Thu  Fri  Sat");
    for week in view.month_grid().chunks(7) {
        let row: String = week
            .iter()
            .map(|cell| match cell {
                Some(day) => {
                    let count = ctx.store.events_for_date(*day).len();
                    let flag = if !ctx.store.conflicts(*day).is_empty() {
                        '!'
                    } else if count > 0 {
                        '*'
                    } else {
                        ' '
                    };
                    format!(" {:>2}{} ", day.day(), flag)
                }
                None => "     ".to_string(),
            })
            .collect();
        println!("{}", row.trim_end());
    }
    println!("\n  * has events   ! has conflicts");
    Ok(())
}

fn show_conflicts(ctx: &CommandContext, date: NaiveDate) -> Result<()> {
    let conflicts = ctx.store.conflicts(date);
    if conflicts.is_empty() {
        println!("No conflicts on {}", canonical_date(date));
        return Ok(());
    }
    println!("{} conflict(s) on {}:", conflicts.len(), canonical_date(date));
    for (first, second) in &conflicts {
        println!("  {}", format_event_line(first));
        println!("  overlaps {}", format_event_line(second));
    }
    Ok(())
}

fn print_conflict_warnings(ctx: &CommandContext, date: NaiveDate) {
    for (first, second) in ctx.store.conflicts(date) {
        println!("  ⚠️  '{}' overlaps '{}'", first.title, second.title);
    }
}
