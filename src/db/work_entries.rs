use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use super::{contains_pattern, page_offset, total_pages, Database, ITEMS_PER_PAGE};
use crate::error::{AppError, Result};
use crate::forms::parse_date;
use crate::forms::work_log::WorkLogForm;
use crate::models::{Vacation, WorkEntry};
use crate::money::format_currency;
use crate::salary::{month_bounds, next_month_start, summarize_year, worked_days_per_month, year_bounds, MonthSummary};
use crate::work_log::{plan_sync, ProjectWindow, SyncPlan, WorkLogGrid};

/// A work entry with the name of its project.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WorkLogRow {
    pub id: Uuid,
    pub worker_id: Uuid,
    pub project_id: Uuid,
    pub project_name: String,
    pub date: NaiveDate,
    pub is_full_day: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkLogSummary {
    /// Sum of the month's payments in øre
    pub total_paid: i64,
    pub total_paid_formatted: String,
    pub work_entries: i64,
    pub vacations: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyLogs {
    pub month: String,
    pub summary: WorkLogSummary,
    pub logs: Vec<WorkLogRow>,
    pub total_pages: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerHistory {
    pub year: i32,
    pub vacations: Vec<Vacation>,
    pub work_entries: Vec<WorkLogRow>,
    /// Distinct worked dates keyed by 0-based month
    pub worked_days_per_month: BTreeMap<u32, u32>,
    pub salary_summaries: Vec<MonthSummary>,
}

/// How a free-text search narrows a month of logs.
#[derive(Debug, Clone, PartialEq)]
enum LogSearch {
    All,
    Notes(String),
    Date(NaiveDate),
}

impl LogSearch {
    fn new(query: &str) -> Self {
        let query = query.trim();
        if query.is_empty() {
            LogSearch::All
        } else if let Some(date) = parse_date(query) {
            LogSearch::Date(date)
        } else {
            LogSearch::Notes(contains_pattern(query))
        }
    }

    fn pattern(&self) -> Option<&str> {
        match self {
            LogSearch::Notes(pattern) => Some(pattern),
            _ => None,
        }
    }

    fn date(&self) -> Option<NaiveDate> {
        match self {
            LogSearch::Date(date) => Some(*date),
            _ => None,
        }
    }
}

const LOG_COLUMNS: &str = r#"
    e.id, e.worker_id, e.project_id, p.name AS project_name, e.date, e.is_full_day, e.notes
"#;

// $1 worker, [$2, $3) month, $4 notes pattern, $5 exact date
const LOG_FILTER: &str = r#"
    FROM work_entries e
    JOIN projects p ON p.id = e.project_id
    WHERE e.worker_id = $1 AND e.date >= $2 AND e.date < $3
        AND ($4::TEXT IS NULL OR e.notes ILIKE $4)
        AND ($5::DATE IS NULL OR e.date = $5)
"#;

fn month_range(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate)> {
    month_bounds(year, month)
        .and_then(|(first, _)| Some((first, next_month_start(first)?)))
        .ok_or_else(|| AppError::validation("month", "Invalid month."))
}

impl Database {
    // Work log operations

    async fn project_window(&self, project_id: Uuid) -> Result<ProjectWindow> {
        let dates: Option<(NaiveDate, Option<NaiveDate>)> = sqlx::query_as(
            "SELECT start_date, end_date FROM projects WHERE id = $1 AND is_deleted = FALSE",
        )
        .bind(project_id)
        .fetch_optional(self.get_pool())
        .await?;

        let (start, end) = dates.ok_or(AppError::NotFound("Project"))?;
        Ok(ProjectWindow::new(start, end)?)
    }

    /// Make the stored entries of a worker on a project match a submitted grid
    pub async fn save_work_log(&self, form: &WorkLogForm) -> Result<SyncPlan> {
        let window = self.project_window(form.project_id).await?;

        let worker_exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM workers WHERE id = $1 AND is_deleted = FALSE)",
        )
        .bind(form.worker_id)
        .fetch_one(self.get_pool())
        .await?;
        if !worker_exists {
            return Err(AppError::NotFound("Worker"));
        }

        let existing: Vec<NaiveDate> = sqlx::query_scalar(
            r#"
            SELECT date FROM work_entries
            WHERE worker_id = $1 AND project_id = $2 AND date >= $3 AND date <= $4
            "#,
        )
        .bind(form.worker_id)
        .bind(form.project_id)
        .bind(window.start)
        .bind(window.end)
        .fetch_all(self.get_pool())
        .await?;

        let plan = plan_sync(&window, &existing, &form.days)?;

        let mut tx = self.pool.begin().await?;

        if !plan.deletes.is_empty() {
            sqlx::query(
                "DELETE FROM work_entries WHERE worker_id = $1 AND project_id = $2 AND date = ANY($3)",
            )
            .bind(form.worker_id)
            .bind(form.project_id)
            .bind(&plan.deletes)
            .execute(&mut *tx)
            .await?;
        }

        for entry in &plan.upserts {
            sqlx::query(
                r#"
                INSERT INTO work_entries (id, worker_id, project_id, date, is_full_day, notes)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (worker_id, project_id, date)
                DO UPDATE SET is_full_day = EXCLUDED.is_full_day, notes = EXCLUDED.notes
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(form.worker_id)
            .bind(form.project_id)
            .bind(entry.date)
            .bind(entry.is_full_day)
            .bind(&entry.notes)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::info!(
            "work log for worker {} on project {}: {} upserted, {} removed",
            form.worker_id,
            form.project_id,
            plan.upserts.len(),
            plan.deletes.len()
        );
        Ok(plan)
    }

    /// Entries of a worker on a project within `[from, to]`, oldest first
    pub async fn fetch_work_entries(
        &self,
        worker_id: Uuid,
        project_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<WorkEntry>> {
        let entries = sqlx::query_as::<_, WorkEntry>(
            r#"
            SELECT * FROM work_entries
            WHERE worker_id = $1 AND project_id = $2 AND date >= $3 AND date <= $4
            ORDER BY date ASC
            "#,
        )
        .bind(worker_id)
        .bind(project_id)
        .bind(from)
        .bind(to)
        .fetch_all(self.get_pool())
        .await?;

        Ok(entries)
    }

    /// The calendar grid of a worker on a project, filled from stored entries
    pub async fn fetch_work_log_grid(&self, worker_id: Uuid, project_id: Uuid) -> Result<WorkLogGrid> {
        let window = self.project_window(project_id).await?;
        let entries = self
            .fetch_work_entries(worker_id, project_id, window.start, window.end)
            .await?;

        Ok(WorkLogGrid::build(&window, &entries))
    }

    /// A worker's entries in one month, newest first
    pub async fn fetch_worker_logs(&self, worker_id: Uuid, year: i32, month: u32) -> Result<Vec<WorkLogRow>> {
        let (first, next) = month_range(year, month)?;
        let sql = format!("SELECT {LOG_COLUMNS} {LOG_FILTER} ORDER BY e.date DESC");
        let logs = sqlx::query_as::<_, WorkLogRow>(&sql)
            .bind(worker_id)
            .bind(first)
            .bind(next)
            .bind(None::<String>)
            .bind(None::<NaiveDate>)
            .fetch_all(self.get_pool())
            .await?;

        Ok(logs)
    }

    pub async fn fetch_filtered_worker_logs(
        &self,
        worker_id: Uuid,
        year: i32,
        month: u32,
        query: &str,
        page: i64,
    ) -> Result<MonthlyLogs> {
        let (first, next) = month_range(year, month)?;
        let last = next.pred_opt().unwrap_or(first);
        let search = LogSearch::new(query);

        let sql = format!(
            "SELECT {LOG_COLUMNS} {LOG_FILTER} ORDER BY e.date DESC LIMIT $6 OFFSET $7"
        );
        let logs = sqlx::query_as::<_, WorkLogRow>(&sql)
            .bind(worker_id)
            .bind(first)
            .bind(next)
            .bind(search.pattern())
            .bind(search.date())
            .bind(ITEMS_PER_PAGE)
            .bind(page_offset(page))
            .fetch_all(self.get_pool())
            .await?;

        let count_sql = format!("SELECT COUNT(*) {LOG_FILTER}");
        let matching: i64 = sqlx::query_scalar(&count_sql)
            .bind(worker_id)
            .bind(first)
            .bind(next)
            .bind(search.pattern())
            .bind(search.date())
            .fetch_one(self.get_pool())
            .await?;

        let total_paid: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(amount), 0)::BIGINT FROM payments
            WHERE worker_id = $1 AND date >= $2 AND date < $3
            "#,
        )
        .bind(worker_id)
        .bind(first)
        .bind(next)
        .fetch_one(self.get_pool())
        .await?;

        let work_entries: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM work_entries WHERE worker_id = $1 AND date >= $2 AND date < $3",
        )
        .bind(worker_id)
        .bind(first)
        .bind(next)
        .fetch_one(self.get_pool())
        .await?;

        let vacations = self.vacations_overlapping(worker_id, first, last).await?.len() as i64;

        Ok(MonthlyLogs {
            month: first.format("%Y-%m").to_string(),
            summary: WorkLogSummary {
                total_paid,
                total_paid_formatted: format_currency(total_paid),
                work_entries,
                vacations,
            },
            logs,
            total_pages: total_pages(matching),
        })
    }

    /// All entries of a worker in `[first day, first of next month)`
    pub async fn fetch_work_details_by_month(
        &self,
        worker_id: Uuid,
        year: i32,
        month: u32,
    ) -> Result<Vec<WorkLogRow>> {
        let (first, next) = month_range(year, month)?;
        let sql = format!("SELECT {LOG_COLUMNS} {LOG_FILTER} ORDER BY e.date ASC");
        let logs = sqlx::query_as::<_, WorkLogRow>(&sql)
            .bind(worker_id)
            .bind(first)
            .bind(next)
            .bind(None::<String>)
            .bind(None::<NaiveDate>)
            .fetch_all(self.get_pool())
            .await?;

        Ok(logs)
    }

    async fn year_logs(&self, worker_id: Uuid, year: i32) -> Result<Vec<WorkLogRow>> {
        let (start, next) = year_bounds(year).ok_or_else(|| AppError::validation("year", "Invalid year."))?;
        let sql = format!("SELECT {LOG_COLUMNS} {LOG_FILTER} ORDER BY e.date ASC");
        let logs = sqlx::query_as::<_, WorkLogRow>(&sql)
            .bind(worker_id)
            .bind(start)
            .bind(next)
            .bind(None::<String>)
            .bind(None::<NaiveDate>)
            .fetch_all(self.get_pool())
            .await?;

        Ok(logs)
    }

    /// Twelve month wage summaries for a worker
    pub async fn get_salary_summary_by_year(&self, worker_id: Uuid, year: i32) -> Result<Vec<MonthSummary>> {
        let daily_rate = self.worker_daily_rate(worker_id).await?;
        let (start, next) = year_bounds(year).ok_or_else(|| AppError::validation("year", "Invalid year."))?;

        let logs = self.year_logs(worker_id, year).await?;
        let dates: Vec<NaiveDate> = logs.iter().map(|log| log.date).collect();
        let payments = self.payments_between(worker_id, start, next).await?;

        Ok(summarize_year(year, daily_rate, &dates, &payments))
    }

    pub async fn fetch_worker_history(&self, worker_id: Uuid, year: i32) -> Result<WorkerHistory> {
        let salary_summaries = self.get_salary_summary_by_year(worker_id, year).await?;
        let (start, next) = year_bounds(year).ok_or_else(|| AppError::validation("year", "Invalid year."))?;
        let last = next.pred_opt().unwrap_or(start);

        let vacations = self.vacations_overlapping(worker_id, start, last).await?;
        let work_entries = self.year_logs(worker_id, year).await?;
        let dates: Vec<NaiveDate> = work_entries.iter().map(|log| log.date).collect();

        Ok(WorkerHistory {
            year,
            vacations,
            worked_days_per_month: worked_days_per_month(&dates),
            work_entries,
            salary_summaries,
        })
    }
}
