//! Calendar grid for logging a worker's days on a project, and the
//! reconciliation that turns a submitted grid into row changes.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::forms::FieldErrors;
use crate::models::WorkEntry;

/// One day as submitted from the grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedDay {
    pub date: NaiveDate,
    #[serde(default = "yes")]
    pub is_full_day: bool,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default = "yes")]
    pub worked: bool,
}

fn yes() -> bool {
    true
}

/// A row to insert or overwrite, keyed by (worker, project, date).
#[derive(Debug, Clone, PartialEq)]
pub struct EntryUpsert {
    pub date: NaiveDate,
    pub is_full_day: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncPlan {
    pub upserts: Vec<EntryUpsert>,
    pub deletes: Vec<NaiveDate>,
}

/// Start and finish of a project, both required before anything can be logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ProjectWindow {
    pub fn new(start: NaiveDate, end: Option<NaiveDate>) -> Result<Self, FieldErrors> {
        let Some(end) = end else {
            return Err(FieldErrors::single(
                "projectId",
                "Selected project needs both start and finish dates set.",
            ));
        };
        if end < start {
            return Err(FieldErrors::single(
                "projectId",
                "Project finish date must be after or on the start date.",
            ));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn days(&self) -> Vec<NaiveDate> {
        project_days(self.start, self.end)
    }
}

/// Every calendar day in `[start, end]`.
pub fn project_days(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    if end < start {
        return Vec::new();
    }
    start.iter_days().take_while(|day| *day <= end).collect()
}

/// Groups days into Monday-first weeks of seven cells. `None` pads the
/// first and last week.
pub fn calendar_weeks(days: &[NaiveDate]) -> Vec<[Option<NaiveDate>; 7]> {
    let Some(first) = days.first() else {
        return Vec::new();
    };

    let mut cells: Vec<Option<NaiveDate>> =
        vec![None; first.weekday().num_days_from_monday() as usize];
    cells.extend(days.iter().copied().map(Some));
    while cells.len() % 7 != 0 {
        cells.push(None);
    }

    cells
        .chunks(7)
        .map(|week| {
            let mut row = [None; 7];
            row.copy_from_slice(week);
            row
        })
        .collect()
}

/// State of one grid cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridCell {
    pub worked: bool,
    pub is_full_day: bool,
    pub note: Option<String>,
}

impl GridCell {
    fn value(&self) -> f64 {
        match (self.worked, self.is_full_day) {
            (false, _) => 0.0,
            (true, true) => 1.0,
            (true, false) => 0.5,
        }
    }
}

/// Worked days in one week. Cells outside the window count nothing.
pub fn week_total(
    week: &[Option<NaiveDate>],
    cells: &BTreeMap<NaiveDate, GridCell>,
    window: &ProjectWindow,
) -> f64 {
    week.iter()
        .flatten()
        .filter(|day| window.contains(**day))
        .filter_map(|day| cells.get(day))
        .map(GridCell::value)
        .sum()
}

pub fn grid_total(cells: &BTreeMap<NaiveDate, GridCell>, window: &ProjectWindow) -> f64 {
    cells
        .iter()
        .filter(|(day, _)| window.contains(**day))
        .map(|(_, cell)| cell.value())
        .sum()
}

/// Grid cells prefilled from stored entries.
pub fn cells_from_entries(entries: &[WorkEntry]) -> BTreeMap<NaiveDate, GridCell> {
    entries
        .iter()
        .map(|entry| {
            (
                entry.date,
                GridCell {
                    worked: true,
                    is_full_day: entry.is_full_day,
                    note: entry.notes.clone(),
                },
            )
        })
        .collect()
}

/// Computes the row changes that make the stored entries of one worker on
/// one project match a submitted grid.
///
/// `existing` are the dates currently stored inside the window. Later
/// submissions of the same date replace earlier ones.
pub fn plan_sync(
    window: &ProjectWindow,
    existing: &[NaiveDate],
    submitted: &[SubmittedDay],
) -> Result<SyncPlan, FieldErrors> {
    let mut errors = FieldErrors::new();
    let mut worked: BTreeMap<NaiveDate, EntryUpsert> = BTreeMap::new();
    let mut unworked: BTreeSet<NaiveDate> = BTreeSet::new();

    for day in submitted {
        if !window.contains(day.date) {
            errors.add(
                "date",
                format!("{} is outside the project period.", day.date.format("%Y-%m-%d")),
            );
            continue;
        }
        if day.worked {
            unworked.remove(&day.date);
            worked.insert(
                day.date,
                EntryUpsert {
                    date: day.date,
                    is_full_day: day.is_full_day,
                    notes: day
                        .note
                        .as_deref()
                        .map(str::trim)
                        .filter(|note| !note.is_empty())
                        .map(str::to_string),
                },
            );
        } else {
            worked.remove(&day.date);
            unworked.insert(day.date);
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }
    if worked.is_empty() {
        return Err(FieldErrors::single(
            "date",
            "At least one entry must be selected.",
        ));
    }

    let mut deletes: Vec<NaiveDate> = existing
        .iter()
        .copied()
        .filter(|date| window.contains(*date) && !worked.contains_key(date))
        .collect();
    deletes.sort();
    deletes.dedup();

    Ok(SyncPlan {
        upserts: worked.into_values().collect(),
        deletes,
    })
}

/// Everything needed to draw the grid for one worker on one project.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkLogGrid {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub weeks: Vec<GridWeek>,
    pub total: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridWeek {
    pub days: Vec<GridDay>,
    pub total: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridDay {
    /// `None` for padding cells
    pub date: Option<NaiveDate>,
    pub label: String,
    #[serde(flatten)]
    pub cell: GridCell,
}

impl WorkLogGrid {
    pub fn build(window: &ProjectWindow, entries: &[WorkEntry]) -> Self {
        let cells = cells_from_entries(entries);
        let weeks = calendar_weeks(&window.days())
            .into_iter()
            .map(|week| GridWeek {
                total: week_total(&week, &cells, window),
                days: week
                    .iter()
                    .map(|day| GridDay {
                        date: *day,
                        label: day.map(|d| d.format("%b %-d").to_string()).unwrap_or_default(),
                        cell: day
                            .and_then(|d| cells.get(&d).cloned())
                            .unwrap_or_default(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            start: window.start,
            end: window.end,
            weeks,
            total: grid_total(&cells, window),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn window() -> ProjectWindow {
        // Wednesday 2024-06-05 to Tuesday 2024-06-18
        ProjectWindow::new(date(2024, 6, 5), Some(date(2024, 6, 18))).unwrap()
    }

    fn day(d: u32, worked: bool, full: bool, note: Option<&str>) -> SubmittedDay {
        SubmittedDay {
            date: date(2024, 6, d),
            is_full_day: full,
            note: note.map(str::to_string),
            worked,
        }
    }

    #[test]
    fn inclusive_day_range() {
        assert_eq!(window().days().len(), 14);
        assert_eq!(project_days(date(2024, 2, 28), date(2024, 3, 1)).len(), 3);
        assert!(project_days(date(2024, 6, 2), date(2024, 6, 1)).is_empty());
    }

    #[test]
    fn weeks_start_on_monday_and_are_padded() {
        let weeks = calendar_weeks(&window().days());

        assert_eq!(weeks.len(), 3);
        assert_eq!(weeks[0][0], None);
        assert_eq!(weeks[0][1], None);
        assert_eq!(weeks[0][2], Some(date(2024, 6, 5)));
        assert_eq!(weeks[1][0].map(|d| d.weekday()), Some(Weekday::Mon));
        assert_eq!(weeks[2][1], Some(date(2024, 6, 18)));
        assert!(weeks[2][2..].iter().all(Option::is_none));
    }

    #[test]
    fn exact_weeks_get_no_trailing_blank_week() {
        let days = project_days(date(2024, 6, 3), date(2024, 6, 16));
        assert_eq!(calendar_weeks(&days).len(), 2);
        assert!(calendar_weeks(&[]).is_empty());
    }

    #[test]
    fn half_days_count_half() {
        let window = window();
        let mut cells = BTreeMap::new();
        cells.insert(
            date(2024, 6, 5),
            GridCell { worked: true, is_full_day: true, note: None },
        );
        cells.insert(
            date(2024, 6, 6),
            GridCell { worked: true, is_full_day: false, note: None },
        );
        cells.insert(
            date(2024, 6, 7),
            GridCell { worked: false, is_full_day: true, note: None },
        );
        // outside the window
        cells.insert(
            date(2024, 6, 20),
            GridCell { worked: true, is_full_day: true, note: None },
        );

        let weeks = calendar_weeks(&window.days());
        assert_eq!(week_total(&weeks[0], &cells, &window), 1.5);
        assert_eq!(week_total(&weeks[1], &cells, &window), 0.0);
        assert_eq!(grid_total(&cells, &window), 1.5);
    }

    #[test]
    fn window_needs_both_dates_in_order() {
        let errors = ProjectWindow::new(date(2024, 6, 5), None).unwrap_err();
        assert_eq!(
            errors.get("projectId"),
            Some(&["Selected project needs both start and finish dates set.".to_string()][..])
        );
        assert!(ProjectWindow::new(date(2024, 6, 5), Some(date(2024, 6, 4))).is_err());
        assert!(ProjectWindow::new(date(2024, 6, 5), Some(date(2024, 6, 5))).is_ok());
    }

    #[test]
    fn sync_upserts_worked_and_deletes_the_rest() {
        let existing = [date(2024, 6, 5), date(2024, 6, 6), date(2024, 6, 10)];
        let plan = plan_sync(
            &window(),
            &existing,
            &[
                day(6, true, false, Some("  ")),
                day(7, true, true, Some("Grunding")),
                day(10, false, false, None),
            ],
        )
        .unwrap();

        assert_eq!(
            plan.upserts,
            vec![
                EntryUpsert { date: date(2024, 6, 6), is_full_day: false, notes: None },
                EntryUpsert {
                    date: date(2024, 6, 7),
                    is_full_day: true,
                    notes: Some("Grunding".into()),
                },
            ]
        );
        assert_eq!(plan.deletes, vec![date(2024, 6, 5), date(2024, 6, 10)]);
    }

    #[test]
    fn existing_outside_window_is_left_alone() {
        let plan = plan_sync(&window(), &[date(2024, 5, 30)], &[day(5, true, true, None)]).unwrap();
        assert!(plan.deletes.is_empty());
    }

    #[test]
    fn last_submission_of_a_date_wins() {
        let plan = plan_sync(
            &window(),
            &[],
            &[day(8, true, true, None), day(8, true, false, Some("eftermiddag"))],
        )
        .unwrap();
        assert_eq!(plan.upserts.len(), 1);
        assert!(!plan.upserts[0].is_full_day);

        let errors = plan_sync(&window(), &[], &[day(8, true, true, None), day(8, false, true, None)])
            .unwrap_err();
        assert!(errors.contains("date"));
    }

    #[test]
    fn nothing_worked_is_rejected() {
        let errors = plan_sync(&window(), &[date(2024, 6, 5)], &[day(5, false, true, None)]).unwrap_err();
        assert_eq!(
            errors.get("date"),
            Some(&["At least one entry must be selected.".to_string()][..])
        );
        assert!(plan_sync(&window(), &[], &[]).is_err());
    }

    #[test]
    fn days_outside_window_are_rejected() {
        let errors = plan_sync(&window(), &[], &[day(5, true, true, None), day(30, true, true, None)])
            .unwrap_err();
        assert_eq!(
            errors.get("date"),
            Some(&["2024-06-30 is outside the project period.".to_string()][..])
        );
    }

    #[test]
    fn grid_view_marks_logged_days() {
        let entry = WorkEntry {
            id: Uuid::new_v4(),
            worker_id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            date: date(2024, 6, 11),
            is_full_day: false,
            notes: Some("Loft".into()),
        };
        let grid = WorkLogGrid::build(&window(), &[entry]);

        assert_eq!(grid.weeks.len(), 3);
        assert_eq!(grid.total, 0.5);
        assert_eq!(grid.weeks[1].total, 0.5);
        let tuesday = &grid.weeks[1].days[1];
        assert_eq!(tuesday.label, "Jun 11");
        assert!(tuesday.cell.worked);
        assert_eq!(grid.weeks[0].days[0].label, "");
    }

    #[test]
    fn submitted_day_defaults() {
        let days: Vec<SubmittedDay> =
            serde_json::from_str(r#"[{"date":"2024-06-05"},{"date":"2024-06-06","isFullDay":false,"note":"x","worked":false}]"#)
                .unwrap();
        assert!(days[0].worked && days[0].is_full_day);
        assert!(!days[1].worked);
    }
}
