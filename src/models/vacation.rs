use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Vacation {
    pub id: Uuid,
    pub worker_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub approved: bool,
    pub reason: Option<String>,
}
