//! Which part of the calendar is visible and how to move around it.

use super::date_utils::{days_in_month, first_weekday_of_month, week_days};
use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Monthly,
    Weekly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Prev,
    Next,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarView {
    current_date: NaiveDate,
    view_mode: ViewMode,
}

impl CalendarView {
    pub fn new(current_date: NaiveDate, view_mode: ViewMode) -> Self {
        Self {
            current_date,
            view_mode,
        }
    }

    pub fn current_date(&self) -> NaiveDate {
        self.current_date
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    /// Move one week or one month. Month steps clamp the day, so Jan 31 -> Feb 28.
    pub fn navigate(&mut self, direction: Direction) {
        let date = self.current_date;
        let moved = match (self.view_mode, direction) {
            (ViewMode::Weekly, Direction::Prev) => date.checked_sub_signed(Duration::days(7)),
            (ViewMode::Weekly, Direction::Next) => date.checked_add_signed(Duration::days(7)),
            (ViewMode::Monthly, Direction::Prev) => date.checked_sub_months(Months::new(1)),
            (ViewMode::Monthly, Direction::Next) => date.checked_add_months(Months::new(1)),
        };
        if let Some(date) = moved {
            self.current_date = date;
        }
    }

    pub fn go_to_today(&mut self, today: NaiveDate) {
        self.current_date = today;
    }

    pub fn set_date(&mut self, date: NaiveDate) {
        self.current_date = date;
    }

    pub fn change_view(&mut self, mode: ViewMode) {
        self.view_mode = mode;
    }

    /// Days of the visible week
    pub fn week(&self) -> [NaiveDate; 7] {
        week_days(self.current_date)
    }

    /// Cells of the month grid, Sunday first. Leading cells before the 1st are `None`.
    pub fn month_grid(&self) -> Vec<Option<NaiveDate>> {
        let month = self.current_date.month0();
        let year = self.current_date.year();
        let leading = first_weekday_of_month(month, year) as usize;
        let days = days_in_month(month, year);

        let mut cells = vec![None; leading];
        cells.extend((1..=days).map(|day| NaiveDate::from_ymd_opt(year, month + 1, day)));
        cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_monthly_navigation_clamps() {
        let mut view = CalendarView::new(date(2025, 1, 31), ViewMode::Monthly);
        view.navigate(Direction::Next);
        assert_eq!(view.current_date(), date(2025, 2, 28));
        view.navigate(Direction::Prev);
        assert_eq!(view.current_date(), date(2025, 1, 28));
    }

    #[test]
    fn test_weekly_navigation() {
        let mut view = CalendarView::new(date(2025, 3, 5), ViewMode::Weekly);
        view.navigate(Direction::Prev);
        assert_eq!(view.current_date(), date(2025, 2, 26));
        assert_eq!(view.week()[0], date(2025, 2, 23));

        view.change_view(ViewMode::Monthly);
        view.go_to_today(date(2025, 7, 4));
        assert_eq!(view.current_date(), date(2025, 7, 4));
    }

    #[test]
    fn test_month_grid() {
        // March 2025 starts on a Saturday
        let view = CalendarView::new(date(2025, 3, 15), ViewMode::Monthly);
        let grid = view.month_grid();
        assert_eq!(grid.len(), 6 + 31);
        assert!(grid[..6].iter().all(Option::is_none));
        assert_eq!(grid[6], Some(date(2025, 3, 1)));
        assert_eq!(grid.last().copied().flatten(), Some(date(2025, 3, 31)));
    }
}
