use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;

use super::{form_data, parse_id, today, ActionResult, ActionState, ApiError, AppState, FormBody};
use crate::db::{MonthlyLogs, WorkLogRow, WorkerHistory};
use crate::forms::work_log::WorkLogForm;
use crate::forms::{parse_date, FieldErrors};
use crate::models::WorkEntry;
use crate::salary::MonthSummary;
use crate::work_log::WorkLogGrid;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/work-logs", get(work_entries).post(save_work_log))
        .route("/work-logs/grid", get(work_log_grid))
        .route("/workers/{id}/logs", get(worker_logs))
        .route("/workers/{id}/logs/month", get(month_logs))
        .route("/workers/{id}/work-details", get(work_details))
        .route("/workers/{id}/salary", get(salary_summary))
        .route("/workers/{id}/history", get(worker_history))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GridParams {
    worker_id: String,
    project_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntriesParams {
    worker_id: String,
    project_id: String,
    from: String,
    to: String,
}

/// `?year=&month=`, defaulting to the current month.
#[derive(Debug, Default, Deserialize)]
struct MonthParams {
    year: Option<i32>,
    month: Option<u32>,
    #[serde(default)]
    query: String,
    page: Option<i64>,
}

impl MonthParams {
    fn year_month(&self) -> (i32, u32) {
        let now = today();
        (
            self.year.unwrap_or(now.year()),
            self.month.unwrap_or(now.month()),
        )
    }
}

#[derive(Debug, Deserialize)]
struct YearParams {
    year: Option<i32>,
}

impl YearParams {
    fn year(&self) -> i32 {
        self.year.unwrap_or_else(|| today().year())
    }
}

fn query_date(field: &str, raw: &str) -> Result<NaiveDate, ApiError> {
    parse_date(raw).ok_or_else(|| FieldErrors::single(field, "Invalid date.").into())
}

/// GET /api/work-logs?workerId=&projectId=&from=&to=
async fn work_entries(
    State(state): State<AppState>,
    Query(params): Query<EntriesParams>,
) -> Result<Json<Vec<WorkEntry>>, ApiError> {
    let worker_id = parse_id(&params.worker_id)?;
    let project_id = parse_id(&params.project_id)?;
    let from = query_date("from", &params.from)?;
    let to = query_date("to", &params.to)?;

    Ok(Json(
        state
            .db
            .fetch_work_entries(worker_id, project_id, from, to)
            .await?,
    ))
}

/// GET /api/work-logs/grid?workerId=&projectId=
async fn work_log_grid(
    State(state): State<AppState>,
    Query(params): Query<GridParams>,
) -> Result<Json<WorkLogGrid>, ApiError> {
    let worker_id = parse_id(&params.worker_id)?;
    let project_id = parse_id(&params.project_id)?;
    Ok(Json(state.db.fetch_work_log_grid(worker_id, project_id).await?))
}

/// POST /api/work-logs
///
/// Form fields `workerId`, `projectId` and `entries` (the grid as JSON).
async fn save_work_log(State(state): State<AppState>, body: FormBody) -> ActionResult {
    let form = WorkLogForm::parse(&form_data(body))?;
    state.db.save_work_log(&form).await?;
    Ok(Json(ActionState::success("Work entries successfully saved!")))
}

/// GET /api/workers/{id}/logs?year=&month=&query=&page=
async fn worker_logs(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<MonthParams>,
) -> Result<Json<MonthlyLogs>, ApiError> {
    let id = parse_id(&id)?;
    let (year, month) = params.year_month();
    let page = params.page.unwrap_or(1).max(1);
    Ok(Json(
        state
            .db
            .fetch_filtered_worker_logs(id, year, month, &params.query, page)
            .await?,
    ))
}

/// GET /api/workers/{id}/logs/month?year=&month=
async fn month_logs(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<MonthParams>,
) -> Result<Json<Vec<WorkLogRow>>, ApiError> {
    let id = parse_id(&id)?;
    let (year, month) = params.year_month();
    Ok(Json(state.db.fetch_worker_logs(id, year, month).await?))
}

/// GET /api/workers/{id}/work-details?year=&month=
async fn work_details(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<MonthParams>,
) -> Result<Json<Vec<WorkLogRow>>, ApiError> {
    let id = parse_id(&id)?;
    let (year, month) = params.year_month();
    Ok(Json(state.db.fetch_work_details_by_month(id, year, month).await?))
}

/// GET /api/workers/{id}/salary?year=
async fn salary_summary(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<YearParams>,
) -> Result<Json<Vec<MonthSummary>>, ApiError> {
    let id = parse_id(&id)?;
    Ok(Json(state.db.get_salary_summary_by_year(id, params.year()).await?))
}

/// GET /api/workers/{id}/history?year=
async fn worker_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<YearParams>,
) -> Result<Json<WorkerHistory>, ApiError> {
    let id = parse_id(&id)?;
    Ok(Json(state.db.fetch_worker_history(id, params.year()).await?))
}
