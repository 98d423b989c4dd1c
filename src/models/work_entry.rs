use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

/// Attendance of one worker on one project for one day.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkEntry {
    pub id: Uuid,
    pub worker_id: Uuid,
    pub project_id: Uuid,
    pub date: NaiveDate,
    pub is_full_day: bool,
    pub notes: Option<String>,
}
