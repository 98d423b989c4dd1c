use serde::Serialize;
use uuid::Uuid;

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Serialize)]
pub struct Service {
    pub id: Uuid,
    pub name: String,
}
